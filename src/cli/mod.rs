// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir image generation prompt tooling
#[derive(Parser, Debug)]
#[command(name = "imagegen-cli")]
#[command(version)]
#[command(about = "Offline prompt tools for the Fabstir image generation service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a prompt template against a JSON context
    Template(commands::TemplateArgs),

    /// Run the prompt safety moderator
    Moderate(commands::TextArgs),

    /// Strip labels and meta-instructions, append the anti-text suffix
    Sanitize(commands::TextArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Commands::Template(args) => commands::template(args).await?,
        Commands::Moderate(args) => commands::moderate(args)?,
        Commands::Sanitize(args) => commands::sanitize(args)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
