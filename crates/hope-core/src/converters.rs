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

//! Value resolution and type coercion
//!
//! Every accessor follows the same chain for a [`Value`] node:
//!
//! 1. a literal of the requested type is returned as is;
//! 2. a path or pointer is looked up through the context cache. An absent or
//!    null node goes to the missing-value hook, a node of the wrong kind to
//!    the type-mismatch hook;
//! 3. a function call is instantiated and invoked, and its result is resolved
//!    again with the same default;
//! 4. anything else goes to the illegal-evaluation hook.
//!
//! Whenever a hook recovers, the accessor returns the default it was given.

use crate::ast::{Datum, FunctionValue, JsonPathValue, JsonPointerValue, Source, Value};
use crate::context::EvaluationContext;
use crate::document::{Address, JsonKind, JsonPath, JsonPointer};
use crate::error::Result;
use serde_json::Value as JsonValue;
use std::borrow::Cow;

/// Resolve a node to a string
pub fn string_value(
    context: &mut EvaluationContext<'_>,
    node: &Value,
    default: &str,
) -> Result<String> {
    Ok(resolve_scalar::<String>(context, node)?.unwrap_or_else(|| default.to_string()))
}

/// Resolve a node to a double
pub fn numeric_value(context: &mut EvaluationContext<'_>, node: &Value, default: f64) -> Result<f64> {
    Ok(resolve_scalar::<f64>(context, node)?.unwrap_or(default))
}

/// Resolve a node to a boolean
pub fn boolean_value(context: &mut EvaluationContext<'_>, node: &Value, default: bool) -> Result<bool> {
    Ok(resolve_scalar::<bool>(context, node)?.unwrap_or(default))
}

/// Resolve a node to a type-erased value, as used by equality comparisons
pub fn object_value(context: &mut EvaluationContext<'_>, node: &Value, default: Datum) -> Result<Datum> {
    Ok(resolve_object(context, node)?.unwrap_or(default))
}

/// Expand a node into typed value leaves, one per array element
pub fn explode_array<'n>(
    context: &mut EvaluationContext<'_>,
    node: &'n Value,
    default: Vec<Value>,
) -> Result<Cow<'n, [Value]>> {
    Ok(resolve_array(context, node)?.unwrap_or(Cow::Owned(default)))
}

/// Expand a node into raw type-erased elements
pub fn flatten_array(
    context: &mut EvaluationContext<'_>,
    node: &Value,
    default: Vec<Datum>,
) -> Result<Vec<Datum>> {
    match resolve_array(context, node)? {
        Some(items) => items
            .iter()
            .map(|item| object_value(context, item, Datum::Null))
            .collect(),
        None => Ok(default),
    }
}

/// The path text a node stands for, without looking it up
pub fn json_path_value(context: &mut EvaluationContext<'_>, node: &Value, default: &str) -> Result<String> {
    match reference(node) {
        Some(Reference::Address(AddressRef::Path(JsonPathValue::Path(path)))) => {
            Ok(path.as_str().to_string())
        }
        Some(Reference::Address(AddressRef::Path(JsonPathValue::Function(call)))) => {
            let result = invoke(context, call)?;
            string_value(context, &result, default)
        }
        _ => string_value(context, node, default),
    }
}

/// The pointer text a node stands for, without looking it up
pub fn json_pointer_value(context: &mut EvaluationContext<'_>, node: &Value, default: &str) -> Result<String> {
    match reference(node) {
        Some(Reference::Address(AddressRef::Pointer(JsonPointerValue::Pointer(pointer)))) => {
            Ok(pointer.as_str().to_string())
        }
        Some(Reference::Address(AddressRef::Pointer(JsonPointerValue::Function(call)))) => {
            let result = invoke(context, call)?;
            string_value(context, &result, default)
        }
        _ => string_value(context, node, default),
    }
}

/// Instantiate the bound overload over the call's arguments and apply it
pub fn invoke(context: &mut EvaluationContext<'_>, call: &FunctionValue) -> Result<Value> {
    let function = call.overload().instantiate(call.parameters())?;
    function.apply(context)
}

/// Convert a document node into a literal value node
pub fn json_to_value(node: &JsonValue) -> Value {
    match node {
        JsonValue::String(s) => Value::string(s.clone()),
        JsonValue::Number(n) => Value::number(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::Bool(b) => Value::boolean(*b),
        JsonValue::Array(items) => Value::array(items.iter().map(json_to_value).collect()),
        JsonValue::Object(_) => Value::object(Datum::Json(node.clone())),
        JsonValue::Null => Value::object(Datum::Null),
    }
}

trait Scalar: Sized {
    const KIND: JsonKind;

    fn literal(node: &Value) -> Option<Self>;

    fn from_json(node: &JsonValue) -> Option<Self>;
}

impl Scalar for String {
    const KIND: JsonKind = JsonKind::String;

    fn literal(node: &Value) -> Option<Self> {
        match node {
            Value::String(Source::Literal(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn from_json(node: &JsonValue) -> Option<Self> {
        node.as_str().map(str::to_string)
    }
}

impl Scalar for f64 {
    const KIND: JsonKind = JsonKind::Number;

    fn literal(node: &Value) -> Option<Self> {
        match node {
            Value::Numeric(Source::Literal(n)) => Some(n.get()),
            _ => None,
        }
    }

    fn from_json(node: &JsonValue) -> Option<Self> {
        node.as_f64()
    }
}

impl Scalar for bool {
    const KIND: JsonKind = JsonKind::Boolean;

    fn literal(node: &Value) -> Option<Self> {
        match node {
            Value::Boolean(Source::Literal(b)) => Some(*b),
            _ => None,
        }
    }

    fn from_json(node: &JsonValue) -> Option<Self> {
        node.as_bool()
    }
}

enum AddressRef<'n> {
    Path(&'n JsonPathValue),
    Pointer(&'n JsonPointerValue),
}

enum Reference<'n> {
    Address(AddressRef<'n>),
    Function(&'n FunctionValue),
}

struct Located<'a, 'n> {
    address: Cow<'n, str>,
    node: Option<&'a JsonValue>,
}

fn source_reference<T>(source: &Source<T>) -> Option<Reference<'_>> {
    match source {
        Source::Literal(_) => None,
        Source::Path(path) => Some(Reference::Address(AddressRef::Path(path))),
        Source::Pointer(pointer) => Some(Reference::Address(AddressRef::Pointer(pointer))),
        Source::Function(call) => Some(Reference::Function(call)),
    }
}

fn reference(node: &Value) -> Option<Reference<'_>> {
    match node {
        Value::Numeric(source) => source_reference(source),
        Value::String(source) => source_reference(source),
        Value::Boolean(source) => source_reference(source),
        Value::Array(source) => source_reference(source),
        Value::Object(source) => source_reference(source),
        Value::Path(path) => Some(Reference::Address(AddressRef::Path(path))),
        Value::Pointer(pointer) => Some(Reference::Address(AddressRef::Pointer(pointer))),
        Value::Function(call) => Some(Reference::Function(call)),
    }
}

fn dynamic_address<A: Address>(
    context: &mut EvaluationContext<'_>,
    call: &FunctionValue,
    compile: fn(&str) -> Result<A>,
) -> Result<Option<(String, A)>> {
    let result = invoke(context, call)?;
    let Some(raw) = resolve_scalar::<String>(context, &result)? else {
        return Ok(None);
    };
    match compile(&raw) {
        Ok(address) => Ok(Some((raw, address))),
        Err(err) => context.illegal_evaluation(&err.to_string(), None),
    }
}

// `Ok(None)` means the address could not be produced and the strategy recovered.
fn locate<'a, 'n>(
    context: &mut EvaluationContext<'a>,
    address: AddressRef<'n>,
) -> Result<Option<Located<'a, 'n>>> {
    let located = match address {
        AddressRef::Path(JsonPathValue::Path(path)) => Located {
            node: context.lookup(path),
            address: Cow::Borrowed(path.as_str()),
        },
        AddressRef::Pointer(JsonPointerValue::Pointer(pointer)) => Located {
            node: context.lookup(pointer),
            address: Cow::Borrowed(pointer.as_str()),
        },
        AddressRef::Path(JsonPathValue::Function(call)) => {
            match dynamic_address(context, call, JsonPath::compile)? {
                Some((raw, path)) => Located {
                    node: context.lookup(&path),
                    address: Cow::Owned(raw),
                },
                None => return Ok(None),
            }
        }
        AddressRef::Pointer(JsonPointerValue::Function(call)) => {
            match dynamic_address(context, call, JsonPointer::compile)? {
                Some((raw, pointer)) => Located {
                    node: context.lookup(&pointer),
                    address: Cow::Owned(raw),
                },
                None => return Ok(None),
            }
        }
    };
    Ok(Some(located))
}

fn resolve_scalar<T: Scalar>(context: &mut EvaluationContext<'_>, node: &Value) -> Result<Option<T>> {
    if let Some(value) = T::literal(node) {
        return Ok(Some(value));
    }
    match reference(node) {
        Some(Reference::Function(call)) => {
            let result = invoke(context, call)?;
            resolve_scalar(context, &result)
        }
        Some(Reference::Address(address)) => {
            let Some(Located { address, node }) = locate(context, address)? else {
                return Ok(None);
            };
            match node {
                None | Some(JsonValue::Null) => context.missing_value(&address, None),
                Some(found) => match T::from_json(found) {
                    Some(value) => Ok(Some(value)),
                    None => context.type_mismatch(&address, T::KIND, JsonKind::of(found), None),
                },
            }
        }
        None => context.illegal_evaluation(
            &format!("{} cannot be resolved as {}", node.kind_name(), T::KIND),
            None,
        ),
    }
}

fn resolve_object(context: &mut EvaluationContext<'_>, node: &Value) -> Result<Option<Datum>> {
    match node {
        Value::Numeric(Source::Literal(n)) => return Ok(Some(Datum::Number(n.get()))),
        Value::String(Source::Literal(s)) => return Ok(Some(Datum::String(s.clone()))),
        Value::Boolean(Source::Literal(b)) => return Ok(Some(Datum::Boolean(*b))),
        Value::Object(Source::Literal(datum)) => return Ok(Some(datum.clone())),
        Value::Array(Source::Literal(items)) => {
            return items
                .iter()
                .map(|item| object_value(context, item, Datum::Null))
                .collect::<Result<Vec<_>>>()
                .map(|items| Some(Datum::List(items)));
        }
        _ => {}
    }
    match reference(node) {
        Some(Reference::Function(call)) => {
            let result = invoke(context, call)?;
            resolve_object(context, &result)
        }
        Some(Reference::Address(address)) => {
            let Some(Located { address, node }) = locate(context, address)? else {
                return Ok(None);
            };
            match node {
                None | Some(JsonValue::Null) => context.missing_value(&address, None),
                Some(found) => Ok(Some(Datum::from_json(found))),
            }
        }
        None => context.illegal_evaluation(
            &format!("{} cannot be resolved as a value", node.kind_name()),
            None,
        ),
    }
}

fn resolve_array<'n>(
    context: &mut EvaluationContext<'_>,
    node: &'n Value,
) -> Result<Option<Cow<'n, [Value]>>> {
    if let Value::Array(Source::Literal(items)) = node {
        return Ok(Some(Cow::Borrowed(items.as_slice())));
    }
    match reference(node) {
        Some(Reference::Function(call)) => {
            let result = invoke(context, call)?;
            Ok(resolve_array(context, &result)?.map(|items| Cow::Owned(items.into_owned())))
        }
        Some(Reference::Address(address)) => {
            let Some(Located { address, node }) = locate(context, address)? else {
                return Ok(None);
            };
            match node {
                None | Some(JsonValue::Null) => context.missing_value(&address, None),
                Some(JsonValue::Array(items)) => {
                    Ok(Some(Cow::Owned(items.iter().map(json_to_value).collect())))
                }
                Some(found) => {
                    context.type_mismatch(&address, JsonKind::Array, JsonKind::of(found), None)
                }
            }
        }
        None => context.illegal_evaluation(
            &format!("{} cannot be resolved as {}", node.kind_name(), JsonKind::Array),
            None,
        ),
    }
}
