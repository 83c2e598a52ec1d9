// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RFC 6901 pointers

use super::Address;
use crate::error::{HopeError, Result};
use serde_json::Value as JsonValue;
use std::fmt;

/// Compiled pointer such as `/a/0/b`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    raw: String,
}

impl JsonPointer {
    /// Compile pointer text. The empty pointer addresses the whole document.
    pub fn compile(raw: &str) -> Result<Self> {
        if !raw.is_empty() && !raw.starts_with('/') {
            return Err(HopeError::invalid_address(raw, "pointer must start with '/'"));
        }
        if !valid_escapes(raw) {
            return Err(HopeError::invalid_address(raw, "'~' must be followed by 0 or 1"));
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }
}

fn valid_escapes(raw: &str) -> bool {
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return false;
        }
    }
    true
}

impl Address for JsonPointer {
    fn as_str(&self) -> &str {
        &self.raw
    }

    fn locate<'d>(&self, document: &'d JsonValue) -> Option<&'d JsonValue> {
        document.pointer(&self.raw)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
