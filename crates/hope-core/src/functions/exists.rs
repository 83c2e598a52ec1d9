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

//! Existence checks for document locations

use crate::ast::Value;
use crate::context::EvaluationContext;
use crate::converters::{json_path_value, json_pointer_value};
use crate::document::{Address, JsonPath, JsonPointer};
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};
use serde_json::Value as JsonValue;

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Exists::PATH).overload(1, Exists::path),
        FunctionDescriptor::new(Exists::POINTER).overload(1, Exists::pointer),
    ]
}

#[derive(Clone, Copy)]
enum Syntax {
    Path,
    Pointer,
}

/// `path.exists(p)` and `pointer.exists(p)`: whether a non-null node lives at the address.
///
/// The address is never looked up as a value, so a missing location is a plain `false`
/// rather than a missing-value error. An empty address is `false` as well.
pub struct Exists<'a> {
    address: &'a Value,
    syntax: Syntax,
}

impl Exists<'_> {
    /// Path variant name
    pub const PATH: &'static str = "path.exists";
    /// Pointer variant name
    pub const POINTER: &'static str = "pointer.exists";

    /// Factory for `path.exists`
    pub fn path(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [address] = fixed_args::<1>(Self::PATH, arguments)?;
        Ok(Box::new(Exists {
            address,
            syntax: Syntax::Path,
        }))
    }

    /// Factory for `pointer.exists`
    pub fn pointer(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [address] = fixed_args::<1>(Self::POINTER, arguments)?;
        Ok(Box::new(Exists {
            address,
            syntax: Syntax::Pointer,
        }))
    }
}

fn present(node: Option<&JsonValue>) -> bool {
    !matches!(node, None | Some(JsonValue::Null))
}

impl HopeFunction for Exists<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let raw = match self.syntax {
            Syntax::Path => json_path_value(context, self.address, "")?,
            Syntax::Pointer => json_pointer_value(context, self.address, "")?,
        };
        if raw.is_empty() {
            return Ok(Value::boolean(false));
        }
        let compiled: Result<Box<dyn Address>> = match self.syntax {
            Syntax::Path => JsonPath::compile(&raw).map(|path| Box::new(path) as Box<dyn Address>),
            Syntax::Pointer => {
                JsonPointer::compile(&raw).map(|pointer| Box::new(pointer) as Box<dyn Address>)
            }
        };
        let found = match compiled {
            Ok(address) => present(context.lookup(&*address)),
            Err(err) => context.illegal_evaluation(&err.to_string(), false)?,
        };
        Ok(Value::boolean(found))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Value;
    use crate::error::HopeError;
    use crate::functions::testing::{call, call_lenient, path};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_path_exists() {
        let doc = json!({"a": {"b": 1}, "n": null, "list": [0]});
        let t = Value::boolean(true);
        let f = Value::boolean(false);
        assert_eq!(call("path.exists", vec![path("$.a.b")], &doc).unwrap(), t);
        assert_eq!(call("path.exists", vec![path("$.list[0]")], &doc).unwrap(), t);
        assert_eq!(call("path.exists", vec![path("$.a.c")], &doc).unwrap(), f);
        assert_eq!(call("path.exists", vec![path("$.n")], &doc).unwrap(), f);
        assert_eq!(
            call("path.exists", vec![Value::string("$.a")], &doc).unwrap(),
            t
        );
    }

    #[test]
    fn test_pointer_exists() {
        let doc = json!({"first name": "x", "a/b": 1});
        assert_eq!(
            call("pointer.exists", vec![Value::pointer("/first name").unwrap()], &doc).unwrap(),
            Value::boolean(true)
        );
        assert_eq!(
            call("pointer.exists", vec![Value::pointer("/a~1b").unwrap()], &doc).unwrap(),
            Value::boolean(true)
        );
        assert_eq!(
            call("pointer.exists", vec![Value::pointer("/last").unwrap()], &doc).unwrap(),
            Value::boolean(false)
        );
    }

    #[test]
    fn test_empty_address() {
        let doc = json!({"a": 1});
        for name in ["path.exists", "pointer.exists"] {
            assert_eq!(
                call(name, vec![Value::string("")], &doc).unwrap(),
                Value::boolean(false),
                "{name}"
            );
        }
    }

    #[test]
    fn test_malformed_address() {
        let doc = json!({});
        assert!(matches!(
            call("pointer.exists", vec![Value::string("no-slash")], &doc),
            Err(HopeError::IllegalEvaluation { .. })
        ));
        assert_eq!(
            call_lenient("pointer.exists", vec![Value::string("no-slash")], &doc).unwrap(),
            Value::boolean(false)
        );
    }
}
