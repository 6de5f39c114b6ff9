// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt template engine: `[[name|filter:args]]` placeholders over a variable context

pub mod engine;
pub mod filters;
pub mod value;

pub use engine::{resolve, Resolution, TemplateError};
pub use filters::{Filter, FilterOutcome};
pub use value::{TemplateContext, TemplateValue};
