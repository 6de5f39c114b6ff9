// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Values available to the template engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variables available to one resolution pass
pub type TemplateContext = HashMap<String, TemplateValue>;

/// A context value: string, list of strings, bool or number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl TemplateValue {
    /// Render the value as text. Lists join with ", ".
    pub fn to_text(&self) -> String {
        match self {
            TemplateValue::Text(s) => s.clone(),
            TemplateValue::List(items) => items.join(", "),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// Truthiness used by `if` / `ifelse`: non-empty and not the literal "false" or "0"
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Text(s) => !s.is_empty() && s != "false" && s != "0",
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Bool(b) => *b,
            TemplateValue::Number(n) => *n != 0.0,
        }
    }

    /// Map a text transform over the value; lists are transformed element-wise
    pub fn map_text(self, f: impl Fn(&str) -> String) -> TemplateValue {
        match self {
            TemplateValue::List(items) => {
                TemplateValue::List(items.iter().map(|item| f(item)).collect())
            }
            other => TemplateValue::Text(f(&other.to_text())),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::Text(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        TemplateValue::Number(value)
    }
}

impl From<Vec<&str>> for TemplateValue {
    fn from(value: Vec<&str>) -> Self {
        TemplateValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TemplateValue {
    fn from(value: Vec<String>) -> Self {
        TemplateValue::List(value)
    }
}
