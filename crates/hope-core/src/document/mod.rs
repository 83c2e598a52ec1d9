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

//! Document accessor
//!
//! Rules address locations inside a `serde_json::Value` with one of two
//! syntaxes: a `$`-rooted dot/bracket path or an RFC 6901 slash pointer.
//! Both compile once into an [`Address`] and are resolved against a document
//! root without allocating.

mod path;
mod pointer;

pub use path::{JsonPath, PathSegment};
pub use pointer::JsonPointer;

use serde_json::Value as JsonValue;
use std::fmt;

/// A compiled location inside a JSON document
pub trait Address: fmt::Debug + Send + Sync {
    /// The address text, used as the resolution cache key
    fn as_str(&self) -> &str;

    /// Resolve against a document root; `None` when nothing lives there
    fn locate<'d>(&self, document: &'d JsonValue) -> Option<&'d JsonValue>;
}

/// Kind descriptor of a document node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// JSON string
    String,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// JSON null
    Null,
    /// Nothing at the requested location
    Missing,
}

impl JsonKind {
    /// Kind of a node
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(_) => Self::String,
            JsonValue::Number(_) => Self::Number,
            JsonValue::Bool(_) => Self::Boolean,
            JsonValue::Array(_) => Self::Array,
            JsonValue::Object(_) => Self::Object,
            JsonValue::Null => Self::Null,
        }
    }

    /// Kind of a lookup result
    pub fn of_option(value: Option<&JsonValue>) -> Self {
        value.map_or(Self::Missing, Self::of)
    }

    /// Upper-case descriptor used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Array => "ARRAY",
            Self::Object => "OBJECT",
            Self::Null => "NULL",
            Self::Missing => "MISSING",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
