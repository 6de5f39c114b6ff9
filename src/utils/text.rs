// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ordered regex rewrite tables and the shared whitespace/punctuation tidy pass
//!
//! The template engine, the safety moderator and the sanitizer all normalise
//! their output through [`tidy`], so an empty conditional branch or a deleted
//! phrase never leaves double spaces or orphaned punctuation behind.

use regex::Regex;
use std::sync::OnceLock;

/// One `{pattern, replacement}` entry of an ordered rewrite table
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: &'static str,
}

impl RewriteRule {
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement)
            .into_owned()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Compile a static `(pattern, replacement)` table, preserving order.
///
/// Tables are compile-time constants; an invalid pattern is a programming
/// error caught by each table's unit test.
pub fn compile_rules(table: &[(&'static str, &'static str)]) -> Vec<RewriteRule> {
    table
        .iter()
        .map(|(pattern, replacement)| RewriteRule {
            pattern: Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid rewrite pattern {:?}: {}", pattern, e)),
            replacement,
        })
        .collect()
}

/// Apply every rule in order over the text
pub fn apply_rules(rules: &[RewriteRule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

const TIDY_TABLE: &[(&str, &str)] = &[
    // collapse whitespace runs, newlines included
    (r"\s+", " "),
    // no whitespace before punctuation ("word ." -> "word.")
    (r"\s+([,.;:!?])", "$1"),
    // ",," left behind by an empty list item
    (r",{2,}", ","),
    // ",." / ";." where a clause vanished before a period
    (r"[,;:]+\.", "."),
    // leading separators
    (r"^[\s,;:]+", ""),
    // trailing separators (periods are kept)
    (r"[\s,;:]+$", ""),
];

fn tidy_rules() -> &'static [RewriteRule] {
    static RULES: OnceLock<Vec<RewriteRule>> = OnceLock::new();
    RULES.get_or_init(|| compile_rules(TIDY_TABLE))
}

/// Normalise whitespace and punctuation. Idempotent: `tidy(tidy(x)) == tidy(x)`.
pub fn tidy(text: &str) -> String {
    apply_rules(tidy_rules(), text).trim().to_string()
}
