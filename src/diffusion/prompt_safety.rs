// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt moderation: ordered blocklist, then ordered warnlist rewrite
//!
//! `check` is pure and total. A blocklist hit stops evaluation immediately and
//! no cleaning is attempted. Otherwise warnlist terms are replaced everywhere
//! and the leftovers are tidied. One softening rule is applied to every
//! allowed prompt.

use regex::Regex;

use crate::diffusion::safety::{SafetyCategory, SafetyResult};
use crate::utils::{apply_rules, compile_rules, tidy, RewriteRule};

/// Ordered blocklist: (pattern, category, reason). First match wins.
const BLOCKLIST: &[(&str, SafetyCategory, &str)] = &[
    (
        r"(?is)\b(?:child|children|kids?|minors?|underage|preteens?|pre-teens?|teens?|teenagers?|teenage|young (?:girl|boy)s?|school(?:girl|boy)s?|loli(?:ta)?|shota)\b.*\b(?:nude|naked|nudity|sexual|sexy|erotic|explicit|porn\w*|nsfw|lingerie|undress\w*|seductive)\b",
        SafetyCategory::MinorSexual,
        "sexual content involving minors",
    ),
    (
        r"(?is)\b(?:nude|naked|nudity|sexual|sexy|erotic|explicit|porn\w*|nsfw|lingerie|undress\w*|seductive)\b.*\b(?:child|children|kids?|minors?|underage|preteens?|pre-teens?|teens?|teenagers?|teenage|young (?:girl|boy)s?|school(?:girl|boy)s?|loli(?:ta)?|shota)\b",
        SafetyCategory::MinorSexual,
        "sexual content involving minors",
    ),
    (
        r"(?i)\b(?:porn\w*|hentai|nsfw|xxx|explicit sex\w*|sex acts?|genitals?)\b",
        SafetyCategory::Sexual,
        "explicit sexual content",
    ),
    (
        r"(?i)\b(?:nude|naked|nudity)\b",
        SafetyCategory::Sexual,
        "nudity",
    ),
    (
        r"(?i)\b(?:gore|gory|dismember\w*|decapitat\w*|behead\w*|mutilat\w*|disembowel\w*)\b",
        SafetyCategory::Violence,
        "graphic violence",
    ),
    (
        r"(?i)\b(?:suicide|self[- ]harm|cutting (?:myself|herself|himself|themselves))\b",
        SafetyCategory::SelfHarm,
        "self-harm",
    ),
    (
        r"(?i)\b(?:swastikas?|nazis?|kkk)\b",
        SafetyCategory::Hate,
        "hate symbols",
    ),
    (
        r"(?i)\b(?:bomb[- ]making|make a bomb|child exploitation|meth lab)\b",
        SafetyCategory::Illegal,
        "illegal activity",
    ),
];

/// Ordered warnlist: (pattern, replacement), applied globally.
const WARNLIST: &[(&str, &str)] = &[
    (r"(?i)\b(?:blood(?:y|ied|stained)?|bleeding)\b", ""),
    (
        r"(?i)\b(?:assault rifles?|rifles?|handguns?|guns?|pistols?|shotguns?|firearms?)\b",
        "",
    ),
    (r"(?i)\b(?:corpses?|dead bod(?:y|ies))\b", "fallen figures"),
    (r"(?i)\b(?:killing|killed|kills?|murder(?:ed|ing|s)?)\b", "confronting"),
    (r"(?i)\b(?:sexy|seductive|sensual)\b", "elegant"),
    (r"(?i)\b(?:cigarettes?|smoking)\b", ""),
    (r"(?i)\b(?:drunk|wasted)\b", "cheerful"),
];

/// Applied to every allowed prompt, safe or warned.
const SOFTENING_RULE: (&str, &str) = (r"(?i)\b(?:hyper|ultra)[- ]?realistic\b", "realistic");

struct BlockRule {
    pattern: Regex,
    category: SafetyCategory,
    reason: &'static str,
}

/// Deterministic rule-table prompt moderator
pub struct PromptModerator {
    blocklist: Vec<BlockRule>,
    warnlist: Vec<RewriteRule>,
    softening: RewriteRule,
}

impl Default for PromptModerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptModerator {
    pub fn new() -> Self {
        let blocklist = BLOCKLIST
            .iter()
            .map(|(pattern, category, reason)| BlockRule {
                pattern: Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("invalid blocklist pattern {:?}: {}", pattern, e)),
                category: *category,
                reason,
            })
            .collect();

        let mut softening = compile_rules(&[SOFTENING_RULE]);

        Self {
            blocklist,
            warnlist: compile_rules(WARNLIST),
            softening: softening.remove(0),
        }
    }

    /// Classify and rewrite `text`
    pub fn check(&self, text: &str) -> SafetyResult {
        if let Some(rule) = self.blocklist.iter().find(|rule| rule.pattern.is_match(text)) {
            return SafetyResult::blocked(rule.category, rule.reason);
        }

        let warned = self.warnlist.iter().any(|rule| rule.is_match(text));
        if warned {
            let replaced = apply_rules(&self.warnlist, text);
            SafetyResult::warn(tidy(&self.softening.apply(&replaced)))
        } else {
            SafetyResult::safe(self.softening.apply(text))
        }
    }
}
