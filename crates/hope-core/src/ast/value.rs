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

//! Value nodes

use super::Datum;
use crate::document::{JsonPath, JsonPointer};
use crate::error::Result;
use crate::registry::FunctionOverload;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Double-precision number with structural equality.
///
/// Two numbers are the same node when their bit patterns match, so the
/// type can be used as a hash key.
#[derive(Debug, Clone, Copy)]
pub struct Number(pub f64);

impl Number {
    /// The wrapped double
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// The single place a typed value comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source<T> {
    /// Literal of the value's own type
    Literal(T),
    /// Document lookup through a path
    Path(JsonPathValue),
    /// Document lookup through a pointer
    Pointer(JsonPointerValue),
    /// Result of a function call
    Function(Box<FunctionValue>),
}

/// Numeric value node
pub type NumericValue = Source<Number>;
/// String value node
pub type StringValue = Source<String>;
/// Boolean value node
pub type BooleanValue = Source<bool>;
/// Array value node
pub type ArrayValue = Source<Vec<Value>>;
/// Opaque value node, used by equality comparisons
pub type ObjectValue = Source<Datum>;

/// Path reference, either compiled or produced by a function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonPathValue {
    /// Compiled path
    Path(JsonPath),
    /// Function that must resolve to a path string
    Function(Box<FunctionValue>),
}

/// Pointer reference, either compiled or produced by a function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonPointerValue {
    /// Compiled pointer
    Pointer(JsonPointer),
    /// Function that must resolve to a pointer string
    Function(Box<FunctionValue>),
}

/// Function call bound to an overload at construction time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionValue {
    name: String,
    parameters: SmallVec<[Value; 4]>,
    overload: FunctionOverload,
}

impl FunctionValue {
    /// Create a bound call. Use [`crate::FunctionRegistry::bind`] to pick the overload.
    pub fn new(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = Value>,
        overload: FunctionOverload,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().collect(),
            overload,
        }
    }

    /// Registered function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unresolved argument expressions
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Overload selected for this call site
    pub fn overload(&self) -> &FunctionOverload {
        &self.overload
    }
}

/// A node that reduces to a scalar, array or opaque value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Number
    Numeric(NumericValue),
    /// String
    String(StringValue),
    /// Boolean
    Boolean(BooleanValue),
    /// Array of values
    Array(ArrayValue),
    /// Opaque value
    Object(ObjectValue),
    /// Bare path reference
    Path(JsonPathValue),
    /// Bare pointer reference
    Pointer(JsonPointerValue),
    /// Bare function call
    Function(Box<FunctionValue>),
}

impl Value {
    /// Numeric literal
    pub fn number(value: f64) -> Self {
        Self::Numeric(Source::Literal(Number(value)))
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(Source::Literal(value.into()))
    }

    /// Boolean literal
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(Source::Literal(value))
    }

    /// Array literal
    pub fn array(values: Vec<Value>) -> Self {
        Self::Array(Source::Literal(values))
    }

    /// Opaque literal
    pub fn object(value: Datum) -> Self {
        Self::Object(Source::Literal(value))
    }

    /// Compile a path reference
    pub fn path(raw: &str) -> Result<Self> {
        Ok(Self::Path(JsonPathValue::Path(JsonPath::compile(raw)?)))
    }

    /// Compile a pointer reference
    pub fn pointer(raw: &str) -> Result<Self> {
        Ok(Self::Pointer(JsonPointerValue::Pointer(JsonPointer::compile(
            raw,
        )?)))
    }

    /// Wrap a bound function call
    pub fn function(call: FunctionValue) -> Self {
        Self::Function(Box::new(call))
    }

    /// Node kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "NumericValue",
            Self::String(_) => "StringValue",
            Self::Boolean(_) => "BooleanValue",
            Self::Array(_) => "ArrayValue",
            Self::Object(_) => "ObjectValue",
            Self::Path(_) => "JsonPathValue",
            Self::Pointer(_) => "JsonPointerValue",
            Self::Function(_) => "FunctionValue",
        }
    }

    /// Reinterpret as a numeric node. Bare references become numeric
    /// references; non-numeric literals are rejected.
    pub fn into_numeric(self) -> Option<Self> {
        self.retype(Self::Numeric, |v| matches!(v, Self::Numeric(_)))
    }

    /// Reinterpret as a boolean node
    pub fn into_boolean(self) -> Option<Self> {
        self.retype(Self::Boolean, |v| matches!(v, Self::Boolean(_)))
    }

    /// Reinterpret as an opaque node. Literals of every kind are kept.
    pub fn into_object(self) -> Self {
        match self {
            Self::Path(path) => Self::Object(Source::Path(path)),
            Self::Pointer(pointer) => Self::Object(Source::Pointer(pointer)),
            Self::Function(call) => Self::Object(Source::Function(call)),
            other => other,
        }
    }

    fn retype<T>(
        self,
        wrap: impl FnOnce(Source<T>) -> Self,
        same_kind: impl Fn(&Self) -> bool,
    ) -> Option<Self> {
        match self {
            Self::Path(path) => Some(wrap(Source::Path(path))),
            Self::Pointer(pointer) => Some(wrap(Source::Pointer(pointer))),
            Self::Function(call) => Some(wrap(Source::Function(call))),
            other if same_kind(&other) => Some(other),
            _ => None,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in text.chars() {
        match c {
            '\'' | '\\' => write!(f, "\\{c}")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("'")
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for JsonPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write_quoted(f, &path.to_string()),
            Self::Function(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for JsonPointerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer(pointer) => write_quoted(f, &pointer.to_string()),
            Self::Function(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.parameters)?;
        f.write_str(")")
    }
}

impl<T> Source<T> {
    fn fmt_with(
        &self,
        f: &mut fmt::Formatter<'_>,
        literal: impl FnOnce(&T, &mut fmt::Formatter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        match self {
            Source::Literal(value) => literal(value, f),
            Source::Path(path) => write!(f, "{path}"),
            Source::Pointer(pointer) => write!(f, "{pointer}"),
            Source::Function(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(source) => source.fmt_with(f, |n, f| write!(f, "{}", n.0)),
            Self::String(source) => source.fmt_with(f, |s, f| write_quoted(f, s)),
            Self::Boolean(source) => source.fmt_with(f, |b, f| write!(f, "{b}")),
            Self::Array(source) => source.fmt_with(f, |values, f| {
                f.write_str("[")?;
                write_list(f, values)?;
                f.write_str("]")
            }),
            Self::Object(source) => source.fmt_with(f, |datum, f| write!(f, "{datum}")),
            Self::Path(path) => write!(f, "{path}"),
            Self::Pointer(pointer) => write!(f, "{pointer}"),
            Self::Function(call) => write!(f, "{call}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::number(1.0), Value::number(1.0));
        assert_ne!(Value::number(1.0), Value::string("1"));
        assert_eq!(Value::path("$.a").unwrap(), Value::path("$.a").unwrap());
        assert_ne!(Value::path("$.a").unwrap(), Value::pointer("/a").unwrap());
    }

    #[test]
    fn test_retyping() {
        let numeric = Value::path("$.count").unwrap().into_numeric().unwrap();
        assert!(matches!(numeric, Value::Numeric(Source::Path(_))));
        assert_eq!(Value::number(2.0).into_numeric(), Some(Value::number(2.0)));
        assert_eq!(Value::string("x").into_numeric(), None);
        assert_eq!(Value::number(2.0).into_boolean(), None);
        assert!(matches!(
            Value::pointer("/flag").unwrap().into_boolean(),
            Some(Value::Boolean(Source::Pointer(_)))
        ));
        assert_eq!(Value::string("x").into_object(), Value::string("x"));
    }

    #[test]
    fn test_display() {
        let array = Value::array(vec![
            Value::number(2.0),
            Value::string("it's"),
            Value::path("$['a b']").unwrap(),
        ]);
        assert_eq!(array.to_string(), r"[2, 'it\'s', '$[\'a b\']']");
        assert_eq!(Value::boolean(true).to_string(), "true");
        assert_eq!(Value::number(-1.5).to_string(), "-1.5");
    }
}
