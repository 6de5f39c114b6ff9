// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod text;

pub use text::{apply_rules, compile_rules, tidy, RewriteRule};
