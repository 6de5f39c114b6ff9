// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Placeholder resolution for prompt templates
//!
//! Syntax: `[[name|filter1|filter2:arg,arg]]`. Filters run left to right over
//! the current value. Resolution never aborts: unknown variables and filters
//! are collected as errors and the affected placeholder renders as "".

use serde::Serialize;
use thiserror::Error;

use super::filters::{Filter, FilterOutcome};
use super::value::TemplateContext;
use crate::utils::tidy;

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// Non-fatal problems found while resolving a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown filter '{filter}' in placeholder '{placeholder}'")]
    UnknownFilter { filter: String, placeholder: String },

    #[error("empty placeholder")]
    EmptyPlaceholder,

    #[error("unbalanced brackets: {opened} '[[' vs {closed} ']]'")]
    UnbalancedBrackets { opened: usize, closed: usize },
}

impl Serialize for TemplateError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Output of one resolution pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub output: String,
    pub errors: Vec<TemplateError>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolve every placeholder in `template` against `context`, then tidy the result
pub fn resolve(template: &str, context: &TemplateContext) -> Resolution {
    let mut errors = Vec::new();

    let opened = template.matches(OPEN).count();
    let closed = template.matches(CLOSE).count();
    if opened != closed {
        errors.push(TemplateError::UnbalancedBrackets { opened, closed });
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find(OPEN) {
        out.push_str(&rest[..open]);
        let after = &rest[open + OPEN.len()..];
        let Some(close) = after.find(CLOSE) else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let body = &after[..close];
        if let Some(inner) = body.find(OPEN) {
            // stray opener: keep it literally and resume at the inner one
            out.push_str(&rest[open..open + OPEN.len() + inner]);
            rest = &after[inner..];
            continue;
        }
        out.push_str(&evaluate(body, context, &mut errors));
        rest = &after[close + CLOSE.len()..];
    }
    out.push_str(rest);

    Resolution {
        output: tidy(&out),
        errors,
    }
}

fn evaluate(body: &str, context: &TemplateContext, errors: &mut Vec<TemplateError>) -> String {
    let mut segments = body.split('|');
    let name = segments.next().unwrap_or_default().trim();
    if name.is_empty() {
        errors.push(TemplateError::EmptyPlaceholder);
        return String::new();
    }

    let mut filters = Vec::new();
    let mut filter_failed = false;
    for segment in segments {
        match Filter::parse(segment) {
            Some(filter) => filters.push(filter),
            None => {
                errors.push(TemplateError::UnknownFilter {
                    filter: segment.split(':').next().unwrap_or(segment).trim().to_string(),
                    placeholder: name.to_string(),
                });
                filter_failed = true;
            }
        }
    }

    let Some(value) = context.get(name) else {
        errors.push(TemplateError::UnknownVariable(name.to_string()));
        return String::new();
    };
    if filter_failed {
        return String::new();
    }

    let mut current = value.clone();
    for filter in &filters {
        match filter.apply(current) {
            FilterOutcome::Continue(next) => current = next,
            FilterOutcome::Suppress => return String::new(),
        }
    }
    current.to_text()
}
