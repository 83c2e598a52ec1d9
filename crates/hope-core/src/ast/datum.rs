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

//! Type-erased runtime values

use serde_json::Value as JsonValue;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A resolved, type-erased value.
///
/// Equality never coerces across variants: `String("93")` and `Number(93.0)`
/// are different. Numbers compare by a canonical bit pattern: `0.0` equals
/// `-0.0` and every NaN equals every other NaN, so `Eq` stays reflexive and
/// hashing agrees with equality.
#[derive(Debug, Clone)]
pub enum Datum {
    /// Absent or JSON null
    Null,
    /// Boolean
    Boolean(bool),
    /// Any number, widened to double precision
    Number(f64),
    /// String
    String(String),
    /// Ordered list of data
    List(Vec<Datum>),
    /// Opaque JSON object
    Json(JsonValue),
}

impl Datum {
    /// Convert a document node
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => Self::Json(value.clone()),
        }
    }

    /// Whether this is [`Datum::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "array",
            Self::Json(_) => "object",
        }
    }
}

fn canonical_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Boolean(b) => b.hash(state),
            Self::Number(n) => canonical_bits(*n).hash(state),
            Self::String(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Json(value) => value.to_string().hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{}", JsonValue::String(s.clone())),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
