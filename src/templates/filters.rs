// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Placeholder filters (`[[name|filter:arg]]`)

use super::value::TemplateValue;

const DEFAULT_JOIN_SEPARATOR: &str = ", ";

/// A parsed filter segment
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Upper,
    Lower,
    Title,
    Join(String),
    If(String),
    IfElse(String, String),
    Omit(String),
    Prefix { text: String, skip_if_empty: bool },
    Suffix { text: String, skip_if_empty: bool },
}

/// Result of running one filter over the current value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Continue(TemplateValue),
    /// Drop the whole placeholder (`omit` matched)
    Suppress,
}

impl Filter {
    /// Parse `name` or `name:args`. Arguments keep their whitespace, so
    /// `prefix:Hello ,true` prefixes "Hello ". Returns `None` for unknown names.
    pub fn parse(segment: &str) -> Option<Filter> {
        let (name, arg) = match segment.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (segment.trim(), None),
        };

        let filter = match name {
            "upper" => Filter::Upper,
            "lower" => Filter::Lower,
            "title" => Filter::Title,
            "join" => Filter::Join(arg.unwrap_or(DEFAULT_JOIN_SEPARATOR).to_string()),
            "if" => Filter::If(arg.unwrap_or_default().to_string()),
            "ifelse" => {
                let arg = arg.unwrap_or_default();
                let (yes, no) = arg.split_once(',').unwrap_or((arg, ""));
                Filter::IfElse(yes.to_string(), no.to_string())
            }
            "omit" => Filter::Omit(arg.unwrap_or_default().to_string()),
            "prefix" => {
                let (text, skip_if_empty) = split_text_flag(arg.unwrap_or_default());
                Filter::Prefix {
                    text,
                    skip_if_empty,
                }
            }
            "suffix" => {
                let (text, skip_if_empty) = split_text_flag(arg.unwrap_or_default());
                Filter::Suffix {
                    text,
                    skip_if_empty,
                }
            }
            _ => return None,
        };
        Some(filter)
    }

    pub fn apply(&self, value: TemplateValue) -> FilterOutcome {
        let next = match self {
            Filter::Upper => value.map_text(|s| s.to_uppercase()),
            Filter::Lower => value.map_text(|s| s.to_lowercase()),
            Filter::Title => value.map_text(title_case),
            Filter::Join(separator) => match value {
                TemplateValue::List(items) => TemplateValue::Text(items.join(separator)),
                other => other,
            },
            Filter::If(text) => {
                if value.is_truthy() {
                    TemplateValue::Text(text.clone())
                } else {
                    TemplateValue::Text(String::new())
                }
            }
            Filter::IfElse(yes, no) => {
                if value.is_truthy() {
                    TemplateValue::Text(yes.clone())
                } else {
                    TemplateValue::Text(no.clone())
                }
            }
            Filter::Omit(omitted) => {
                if value.to_text() == *omitted {
                    return FilterOutcome::Suppress;
                }
                value
            }
            Filter::Prefix {
                text,
                skip_if_empty,
            } => {
                let current = value.to_text();
                if *skip_if_empty && current.is_empty() {
                    value
                } else {
                    TemplateValue::Text(format!("{}{}", text, current))
                }
            }
            Filter::Suffix {
                text,
                skip_if_empty,
            } => {
                let current = value.to_text();
                if *skip_if_empty && current.is_empty() {
                    value
                } else {
                    TemplateValue::Text(format!("{}{}", current, text))
                }
            }
        };
        FilterOutcome::Continue(next)
    }
}

/// `prefix:text,true` -> ("text", true). A trailing flag is only recognised
/// when it is literally `true` or `false`; otherwise the whole argument is text
/// and skipping on empty values defaults to on.
fn split_text_flag(arg: &str) -> (String, bool) {
    if let Some((text, flag)) = arg.rsplit_once(',') {
        match flag.trim() {
            "true" => return (text.to_string(), true),
            "false" => return (text.to_string(), false),
            _ => {}
        }
    }
    (arg.to_string(), true)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = c.is_whitespace();
        }
    }
    out
}
