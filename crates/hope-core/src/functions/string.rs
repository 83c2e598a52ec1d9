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

//! String functions. Lengths and offsets count characters.

use crate::ast::Value;
use crate::context::EvaluationContext;
use crate::converters::{numeric_value, string_value};
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};
use regex::Regex;

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Length::NAME).overload(1, Length::create),
        FunctionDescriptor::new(Transform::LOWER).overload(1, Transform::lower),
        FunctionDescriptor::new(Transform::UPPER).overload(1, Transform::upper),
        FunctionDescriptor::new(Substring::NAME)
            .overload(2, Substring::create_open)
            .overload(3, Substring::create),
        FunctionDescriptor::new(Matches::NAME).overload(2, Matches::create),
    ]
}

/// `str.len(s)`
pub struct Length<'a> {
    value: &'a Value,
}

impl Length<'_> {
    /// Registered name
    pub const NAME: &'static str = "str.len";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value] = fixed_args::<1>(Self::NAME, arguments)?;
        Ok(Box::new(Length { value }))
    }
}

impl HopeFunction for Length<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let value = string_value(context, self.value, "")?;
        Ok(Value::number(value.chars().count() as f64))
    }
}

/// `str.lower(s)` and `str.upper(s)`
pub struct Transform<'a> {
    value: &'a Value,
    op: fn(&str) -> String,
}

impl Transform<'_> {
    /// Lower-case name
    pub const LOWER: &'static str = "str.lower";
    /// Upper-case name
    pub const UPPER: &'static str = "str.upper";

    /// Factory for `str.lower`
    pub fn lower(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value] = fixed_args::<1>(Self::LOWER, arguments)?;
        Ok(Box::new(Transform {
            value,
            op: str::to_lowercase,
        }))
    }

    /// Factory for `str.upper`
    pub fn upper(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value] = fixed_args::<1>(Self::UPPER, arguments)?;
        Ok(Box::new(Transform {
            value,
            op: str::to_uppercase,
        }))
    }
}

impl HopeFunction for Transform<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let value = string_value(context, self.value, "")?;
        Ok(Value::string((self.op)(&value)))
    }
}

/// `str.substr(s, start)` and `str.substr(s, start, end)`.
///
/// Returns characters `[start, end)`; `end` defaults to the string length.
/// Fractional bounds are truncated toward zero.
/// Bounds outside the string are an illegal evaluation.
pub struct Substring<'a> {
    value: &'a Value,
    start: &'a Value,
    end: Option<&'a Value>,
}

impl Substring<'_> {
    /// Registered name
    pub const NAME: &'static str = "str.substr";

    /// Factory for the three-argument form
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value, start, end] = fixed_args::<3>(Self::NAME, arguments)?;
        Ok(Box::new(Substring {
            value,
            start,
            end: Some(end),
        }))
    }

    /// Factory for the open-ended two-argument form
    pub fn create_open(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value, start] = fixed_args::<2>(Self::NAME, arguments)?;
        Ok(Box::new(Substring {
            value,
            start,
            end: None,
        }))
    }
}

impl HopeFunction for Substring<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let value = string_value(context, self.value, "")?;
        let length = value.chars().count() as f64;
        let start = numeric_value(context, self.start, 0.0)?.trunc();
        let end = match self.end {
            Some(end) => numeric_value(context, end, length)?.trunc(),
            None => length,
        };
        if start < 0.0 || end > length || start > end {
            return context
                .illegal_evaluation(
                    &format!("Invalid substring bounds [{start}, {end}) for length {length}"),
                    String::new(),
                )
                .map(Value::string);
        }
        let substring: String = value
            .chars()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect();
        Ok(Value::string(substring))
    }
}

/// `str.match(regex, s)`: whether the whole of `s` matches `regex`
pub struct Matches<'a> {
    pattern: &'a Value,
    value: &'a Value,
}

impl Matches<'_> {
    /// Registered name
    pub const NAME: &'static str = "str.match";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [pattern, value] = fixed_args::<2>(Self::NAME, arguments)?;
        Ok(Box::new(Matches { pattern, value }))
    }
}

impl HopeFunction for Matches<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let pattern = string_value(context, self.pattern, "")?;
        if pattern.is_empty() {
            return context
                .illegal_evaluation("Regex cannot be empty", false)
                .map(Value::boolean);
        }
        let value = string_value(context, self.value, "")?;
        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => Ok(Value::boolean(regex.is_match(&value))),
            Err(err) => context
                .illegal_evaluation(&format!("Invalid regex '{pattern}': {err}"), false)
                .map(Value::boolean),
        }
    }
}
