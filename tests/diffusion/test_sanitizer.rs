// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for prompt sanitization

use fabstir_image_gen::diffusion::sanitizer::{PromptSanitizer, ANTI_TEXT_SUFFIX};

#[test]
fn test_section_label_removed_and_suffix_appended() {
    let out = PromptSanitizer::new().clean("Lighting: soft dusk over a harbor");
    assert_eq!(
        out,
        "soft dusk over a harbor. No text, letters, or watermarks in the image."
    );
}

#[test]
fn test_labels_and_meta_instructions_removed() {
    let out = PromptSanitizer::new()
        .clean("Style: watercolor. Please keep it family friendly.");
    assert_eq!(out, format!("watercolor. {}", ANTI_TEXT_SUFFIX));
}

#[test]
fn test_rating_note_removed() {
    let out = PromptSanitizer::new().clean("a fox (rated PG)");
    assert_eq!(out, format!("a fox. {}", ANTI_TEXT_SUFFIX));
}

#[test]
fn test_lowercase_label_is_prose() {
    let out = PromptSanitizer::new().clean("the mood: calm");
    assert_eq!(out, format!("the mood: calm. {}", ANTI_TEXT_SUFFIX));
}

#[test]
fn test_existing_anti_text_instruction_not_duplicated() {
    let out = PromptSanitizer::new().clean("a poster, no watermarks");
    assert_eq!(out, "a poster, no watermarks");
}

#[test]
fn test_empty_prompt_becomes_suffix() {
    let sanitizer = PromptSanitizer::new();
    assert_eq!(sanitizer.clean(""), ANTI_TEXT_SUFFIX);
    assert_eq!(sanitizer.clean("   \n"), ANTI_TEXT_SUFFIX);
}

#[test]
fn test_strip_does_not_append_suffix() {
    let out = PromptSanitizer::new().strip("Mood: calm , ");
    assert_eq!(out, "calm");
}

#[test]
fn test_clean_is_idempotent() {
    let sanitizer = PromptSanitizer::new();
    let nested_rating = format!("a fox {}{}", "rated ".repeat(10), "PG ".repeat(10));
    let nested_sfw = format!("a lake {}{}.", "rated ".repeat(12), "sfw ".repeat(12));
    let nested_labels = "Style: ".repeat(20) + "a quiet harbor";
    for input in [
        nested_rating.as_str(),
        nested_sfw.as_str(),
        nested_labels.as_str(),
        "a fox rated PG",
        "a fox, rated PG. rated G.",
        "Style: watercolor, Mood: calm. Please keep it family friendly.",
        "",
        "   ",
        "a fox (SFW)",
        "blend 70/30 of a cat and a dog",
        "no text",
        "Negative prompt: blurry",
        "a neon street!",
        "Lighting : dusk ; ,",
        "a fox using 40% of the original image, rated PG-13.",
        "Subject: Background: Scene: a lone tree",
        "a lighthouse, no gore. no violence",
    ] {
        let once = sanitizer.clean(input);
        let twice = sanitizer.clean(&once);
        assert_eq!(once, twice, "input {:?}", input);
        assert!(once.matches(ANTI_TEXT_SUFFIX).count() <= 1, "input {:?}", input);
    }
}

#[test]
fn test_nested_rating_notes_removed_in_one_clean() {
    let input = format!("a fox {}{}", "rated ".repeat(10), "PG ".repeat(10));
    let once = PromptSanitizer::new().clean(&input);
    assert_eq!(once, format!("a fox. {}", ANTI_TEXT_SUFFIX));
}
