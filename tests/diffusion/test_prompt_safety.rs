// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the rule-table prompt moderator

use fabstir_image_gen::diffusion::prompt_safety::PromptModerator;
use fabstir_image_gen::diffusion::safety::{SafetyCategory, SafetySeverity};

#[test]
fn test_benign_prompt_is_safe_and_unchanged() {
    let result = PromptModerator::new().check("a serene mountain lake at dawn");
    assert!(result.allowed);
    assert_eq!(result.severity, SafetySeverity::Safe);
    assert_eq!(result.cleaned.as_deref(), Some("a serene mountain lake at dawn"));
    assert!(result.reason.is_none());
    assert!(result.category.is_none());
}

#[test]
fn test_blocked_categories() {
    let moderator = PromptModerator::new();
    let cases = [
        ("a gory battlefield", SafetyCategory::Violence),
        ("a nazi rally", SafetyCategory::Hate),
        ("a teen in lingerie", SafetyCategory::MinorSexual),
        ("lingerie shoot with a schoolgirl", SafetyCategory::MinorSexual),
        ("hentai artwork", SafetyCategory::Sexual),
        ("a nude figure study", SafetyCategory::Sexual),
        ("a poster about self-harm", SafetyCategory::SelfHarm),
        ("a meth lab in the desert", SafetyCategory::Illegal),
    ];
    for (prompt, category) in cases {
        let result = moderator.check(prompt);
        assert!(!result.allowed, "{:?} should be blocked", prompt);
        assert_eq!(result.severity, SafetySeverity::Block);
        assert_eq!(result.category, Some(category), "prompt {:?}", prompt);
        assert!(result.reason.is_some());
        assert!(result.cleaned.is_none());
    }
}

#[test]
fn test_block_wins_over_warn() {
    let result = PromptModerator::new().check("a gory scene with bloody rifles");
    assert_eq!(result.severity, SafetySeverity::Block);
    assert_eq!(result.reason.as_deref(), Some("graphic violence"));
    assert!(result.cleaned.is_none());
}

#[test]
fn test_warn_removes_terms_and_tidies() {
    let result = PromptModerator::new().check("a knight holding a bloody sword");
    assert!(result.allowed);
    assert_eq!(result.severity, SafetySeverity::Warn);
    assert_eq!(result.cleaned.as_deref(), Some("a knight holding a sword"));
}

#[test]
fn test_weapon_and_blood_terms_removed() {
    let result = PromptModerator::new().check("a warrior covered in blood holding a rifle");
    assert!(result.allowed);
    assert_eq!(result.severity, SafetySeverity::Warn);
    let cleaned = result.cleaned.unwrap();
    assert!(!cleaned.contains("blood"));
    assert!(!cleaned.contains("rifle"));
    assert_eq!(cleaned, "a warrior covered in holding a");
}

#[test]
fn test_warn_replacements_apply_in_order() {
    let moderator = PromptModerator::new();
    assert_eq!(
        moderator
            .check("soldiers with rifles killing zombies")
            .cleaned
            .as_deref(),
        Some("soldiers with confronting zombies")
    );
    assert_eq!(
        moderator
            .check("a drunk pirate, smoking cigarettes")
            .cleaned
            .as_deref(),
        Some("a cheerful pirate")
    );
}

#[test]
fn test_warned_prompt_is_also_softened() {
    let result = PromptModerator::new().check("a hyperrealistic bloody knight");
    assert_eq!(result.severity, SafetySeverity::Warn);
    assert_eq!(result.cleaned.as_deref(), Some("a realistic knight"));
}

#[test]
fn test_word_boundaries_avoid_false_positives() {
    let moderator = PromptModerator::new();
    for prompt in ["a bloodhound in Essex", "a killer whale breaching", "grapes on a table"] {
        let result = moderator.check(prompt);
        assert_eq!(result.severity, SafetySeverity::Safe, "prompt {:?}", prompt);
        assert_eq!(result.cleaned.as_deref(), Some(prompt));
    }
}

#[test]
fn test_check_is_deterministic() {
    let moderator = PromptModerator::new();
    for prompt in ["a bloody knight", "a gory scene", "a quiet harbor"] {
        assert_eq!(moderator.check(prompt), moderator.check(prompt));
    }
}

#[test]
fn test_verdict_serialization() {
    let json =
        serde_json::to_value(PromptModerator::new().check("a gory battlefield")).unwrap();
    assert_eq!(json["allowed"], false);
    assert_eq!(json["severity"], "block");
    assert_eq!(json["category"], "violence");
    assert!(json.get("cleaned").is_none());
}
