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

//! Array size, membership and overlap functions
//!
//! Membership and overlap compare flattened, type-erased elements through hash
//! sets, so arrays may freely mix strings, numbers, booleans and objects.

use crate::ast::{Datum, Value};
use crate::context::EvaluationContext;
use crate::converters::{explode_array, flatten_array, object_value};
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};
use rustc_hash::FxHashSet;

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Size::LEN).overload(1, Size::len),
        FunctionDescriptor::new(Size::IS_EMPTY).overload(1, Size::is_empty),
        FunctionDescriptor::new(Membership::IN).overload(2, Membership::contained),
        FunctionDescriptor::new(Membership::NOT_IN).overload(2, Membership::not_contained),
        FunctionDescriptor::new(Overlap::CONTAINS_ANY).overload(2, Overlap::any),
        FunctionDescriptor::new(Overlap::CONTAINS_ALL).overload(2, Overlap::all),
    ]
}

fn element_set(
    context: &mut EvaluationContext<'_>,
    array: &Value,
) -> Result<FxHashSet<Datum>> {
    Ok(flatten_array(context, array, Vec::new())?.into_iter().collect())
}

#[derive(Clone, Copy)]
enum SizeCheck {
    Length,
    Empty,
}

/// `arr.len(a)` and `arr.is_empty(a)`
pub struct Size<'a> {
    array: &'a Value,
    check: SizeCheck,
}

impl Size<'_> {
    /// Length name
    pub const LEN: &'static str = "arr.len";
    /// Emptiness name
    pub const IS_EMPTY: &'static str = "arr.is_empty";

    /// Factory for `arr.len`
    pub fn len(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [array] = fixed_args::<1>(Self::LEN, arguments)?;
        Ok(Box::new(Size {
            array,
            check: SizeCheck::Length,
        }))
    }

    /// Factory for `arr.is_empty`
    pub fn is_empty(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [array] = fixed_args::<1>(Self::IS_EMPTY, arguments)?;
        Ok(Box::new(Size {
            array,
            check: SizeCheck::Empty,
        }))
    }
}

impl HopeFunction for Size<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let items = explode_array(context, self.array, Vec::new())?;
        Ok(match self.check {
            SizeCheck::Length => Value::number(items.len() as f64),
            SizeCheck::Empty => Value::boolean(items.is_empty()),
        })
    }
}

/// `arr.in(v, a)` and `arr.not_in(v, a)`.
///
/// A null or missing needle is never in an array, so `arr.not_in` of it is true.
pub struct Membership<'a> {
    needle: &'a Value,
    haystack: &'a Value,
    negate: bool,
}

impl Membership<'_> {
    /// Membership name
    pub const IN: &'static str = "arr.in";
    /// Non-membership name
    pub const NOT_IN: &'static str = "arr.not_in";

    /// Factory for `arr.in`
    pub fn contained(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [needle, haystack] = fixed_args::<2>(Self::IN, arguments)?;
        Ok(Box::new(Membership {
            needle,
            haystack,
            negate: false,
        }))
    }

    /// Factory for `arr.not_in`
    pub fn not_contained(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [needle, haystack] = fixed_args::<2>(Self::NOT_IN, arguments)?;
        Ok(Box::new(Membership {
            needle,
            haystack,
            negate: true,
        }))
    }
}

impl HopeFunction for Membership<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let needle = object_value(context, self.needle, Datum::Null)?;
        let elements = element_set(context, self.haystack)?;
        let found = !needle.is_null() && elements.contains(&needle);
        Ok(Value::boolean(found != self.negate))
    }
}

/// `arr.contains_any(a, b)` and `arr.contains_all(a, b)`: whether `a` holds
/// any (or every) element of `b`
pub struct Overlap<'a> {
    lhs: &'a Value,
    rhs: &'a Value,
    all: bool,
}

impl Overlap<'_> {
    /// Any-element name
    pub const CONTAINS_ANY: &'static str = "arr.contains_any";
    /// Every-element name
    pub const CONTAINS_ALL: &'static str = "arr.contains_all";

    /// Factory for `arr.contains_any`
    pub fn any(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [lhs, rhs] = fixed_args::<2>(Self::CONTAINS_ANY, arguments)?;
        Ok(Box::new(Overlap {
            lhs,
            rhs,
            all: false,
        }))
    }

    /// Factory for `arr.contains_all`
    pub fn all(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [lhs, rhs] = fixed_args::<2>(Self::CONTAINS_ALL, arguments)?;
        Ok(Box::new(Overlap {
            lhs,
            rhs,
            all: true,
        }))
    }
}

impl HopeFunction for Overlap<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let lhs = element_set(context, self.lhs)?;
        let rhs = flatten_array(context, self.rhs, Vec::new())?;
        let result = if self.all {
            rhs.iter().all(|item| lhs.contains(item))
        } else {
            rhs.iter().any(|item| lhs.contains(item))
        };
        Ok(Value::boolean(result))
    }
}
