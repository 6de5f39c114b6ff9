// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::collections::HashSet;

use crate::diffusion::admission::CallerPrivilege;

/// Header carrying the caller's access code
pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// Maps an access code to a caller privilege
#[derive(Debug, Clone, Default)]
pub struct PrivilegeResolver {
    privileged_codes: HashSet<String>,
}

impl PrivilegeResolver {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            privileged_codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resolve(&self, access_code: Option<&str>) -> CallerPrivilege {
        match access_code.map(str::trim) {
            Some(code) if !code.is_empty() && self.privileged_codes.contains(code) => {
                CallerPrivilege::Privileged
            }
            _ => CallerPrivilege::Standard,
        }
    }
}
