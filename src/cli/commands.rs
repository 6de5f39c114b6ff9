// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{json, Value};
use tracing::debug;

use crate::diffusion::{PromptModerator, PromptSanitizer};
use crate::templates::{resolve, TemplateContext};

/// Arguments for the template command
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Template text, e.g. "[[subject|title]] [[style|prefix:in the style of ]]"
    #[arg(long)]
    pub template: String,

    /// JSON object, or @path to a JSON file
    #[arg(long, default_value = "{}")]
    pub context: String,

    /// Exit non-zero when resolution reports errors
    #[arg(long)]
    pub strict: bool,
}

/// Free text argument shared by moderate and sanitize
#[derive(Args, Debug)]
pub struct TextArgs {
    /// Prompt text
    pub text: String,
}

/// Inline JSON or `@file`
pub async fn load_context(raw: &str) -> Result<TemplateContext> {
    let json = match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read context file {}", path))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&json).context("Context must be a JSON object of strings, lists, booleans or numbers")
}

pub async fn template(args: TemplateArgs) -> Result<Value> {
    let context = load_context(&args.context).await?;
    debug!("Resolving template with {} variable(s)", context.len());
    let resolution = resolve(&args.template, &context);
    if args.strict && !resolution.is_clean() {
        bail!(
            "template resolved with errors: {}",
            resolution
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
    Ok(serde_json::to_value(resolution)?)
}

pub fn moderate(args: TextArgs) -> Result<Value> {
    Ok(serde_json::to_value(PromptModerator::new().check(&args.text))?)
}

pub fn sanitize(args: TextArgs) -> Result<Value> {
    Ok(json!({ "prompt": PromptSanitizer::new().clean(&args.text) }))
}
