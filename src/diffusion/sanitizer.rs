// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt sanitizer
//!
//! Removes structure that diffusion models tend to paint as literal glyphs:
//! section labels ("Style:", "Lighting:") and meta-instructions aimed at a
//! human or an LLM rather than the image ("keep it family friendly",
//! "blend 70/30"). The result is tidied and given an anti-text suffix.

use regex::Regex;

use crate::utils::{apply_rules, compile_rules, tidy, RewriteRule};

/// Section labels: a capitalised word (or two) followed by a colon
pub const SECTION_LABEL_RULES: &[(&str, &str)] = &[(
    r"\b(?:Style|Lighting|Composition|Mood|Camera|Colou?rs?|Colou?r palette|Palette|Subject|Background|Foreground|Setting|Scene|Details|Atmosphere|Medium|Quality|Perspective|Texture|Environment|Negative prompt)\s*:",
    " ",
)];

/// Meta-instruction phrases, deleted in order
pub const META_INSTRUCTION_RULES: &[(&str, &str)] = &[
    // "please keep it family friendly." / "ensure the image is SFW"
    (
        r"(?i)\b(?:please\s+)?(?:keep|make sure|ensure)\s+(?:it|this|the image|everything)\s+(?:is\s+)?(?:safe for work|sfw|family[- ]friendly|appropriate|pg-13|pg)\b\.?",
        " ",
    ),
    // "(rated PG)" / "(SFW)"
    (r"(?i)\((?:rated\s+)?(?:pg-13|pg|g|sfw)\)", " "),
    // "rated PG-13."
    (r"(?i)\brated\s+(?:pg-13|pg|g|sfw)\b\.?", " "),
    // safety reminders
    (r"(?i)\bno\s+(?:nudity|gore|violence)\b\.?", " "),
    // "blend ratio 70/30", "mix 60% : 40%"
    (
        r"(?i)\b(?:blend|mix)(?:ing)?(?:\s+ratio)?\s*:?\s*\d{1,3}\s*%?\s*[/:]\s*\d{1,3}\s*%?",
        " ",
    ),
    // "70% of the original image"
    (
        r"(?i)\b\d{1,3}\s*%\s+(?:of\s+)?(?:the\s+)?(?:original|reference|base)(?:\s+(?:image|photo))?",
        " ",
    ),
];

/// Appended unless an equivalent instruction is already present
pub const ANTI_TEXT_SUFFIX: &str = "No text, letters, or watermarks in the image.";

const ANTI_TEXT_GUARD: &str =
    r"(?i)\bno\s+(?:visible\s+)?(?:text|lettering|letters|words|captions|watermarks?)\b";

/// Pure, idempotent prompt cleaner
pub struct PromptSanitizer {
    label_rules: Vec<RewriteRule>,
    meta_rules: Vec<RewriteRule>,
    anti_text_guard: Regex,
}

impl Default for PromptSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptSanitizer {
    pub fn new() -> Self {
        Self {
            label_rules: compile_rules(SECTION_LABEL_RULES),
            meta_rules: compile_rules(META_INSTRUCTION_RULES),
            anti_text_guard: Regex::new(ANTI_TEXT_GUARD)
                .unwrap_or_else(|e| panic!("invalid anti-text guard: {}", e)),
        }
    }

    /// Strip labels and meta-instructions without appending the suffix.
    ///
    /// Deleting a phrase can expose a new match ("rated rated PG PG"), so the
    /// rules run until nothing changes. Every rule replaces a match of two or
    /// more characters with one space and `tidy` never lengthens its input,
    /// so each changing pass shortens the text and the loop terminates.
    pub fn strip(&self, text: &str) -> String {
        let mut current = tidy(text);
        loop {
            let next = tidy(&apply_rules(
                &self.meta_rules,
                &apply_rules(&self.label_rules, &current),
            ));
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Full clean: strip, tidy, append the anti-text suffix once
    pub fn clean(&self, text: &str) -> String {
        let base = self.strip(text);
        if self.anti_text_guard.is_match(&base) {
            return base;
        }
        if base.is_empty() {
            return ANTI_TEXT_SUFFIX.to_string();
        }
        if base.ends_with(['.', '!', '?']) {
            format!("{} {}", base, ANTI_TEXT_SUFFIX)
        } else {
            format!("{}. {}", base, ANTI_TEXT_SUFFIX)
        }
    }
}
