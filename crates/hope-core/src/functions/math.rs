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

//! Arithmetic functions

use crate::ast::Value;
use crate::context::EvaluationContext;
use crate::converters::numeric_value;
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Add::NAME).variadic(Add::create),
        FunctionDescriptor::new(Product::NAME).variadic(Product::create),
        FunctionDescriptor::new(Subtract::NAME).overload(2, Subtract::create),
        FunctionDescriptor::new(Divide::NAME).overload(2, Divide::create),
        FunctionDescriptor::new(Unary::NEGATE).overload(1, Unary::negate),
        FunctionDescriptor::new(Unary::ABS).overload(1, Unary::abs),
        FunctionDescriptor::new(Unary::FLOOR).overload(1, Unary::floor),
        FunctionDescriptor::new(Unary::CEIL).overload(1, Unary::ceil),
    ]
}

/// `math.add(a, b, ...)`: sum of all arguments
pub struct Add<'a> {
    operands: &'a [Value],
}

impl Add<'_> {
    /// Registered name
    pub const NAME: &'static str = "math.add";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Ok(Box::new(Add {
            operands: arguments,
        }))
    }
}

impl HopeFunction for Add<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let mut sum = 0.0;
        for operand in self.operands {
            sum += numeric_value(context, operand, 0.0)?;
        }
        Ok(Value::number(sum))
    }
}

/// `math.prod(a, b, ...)`: product of all arguments
pub struct Product<'a> {
    operands: &'a [Value],
}

impl Product<'_> {
    /// Registered name
    pub const NAME: &'static str = "math.prod";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Ok(Box::new(Product {
            operands: arguments,
        }))
    }
}

impl HopeFunction for Product<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let mut product = 1.0;
        for operand in self.operands {
            product *= numeric_value(context, operand, 0.0)?;
        }
        Ok(Value::number(product))
    }
}

/// `math.sub(a, b)`
pub struct Subtract<'a> {
    lhs: &'a Value,
    rhs: &'a Value,
}

impl Subtract<'_> {
    /// Registered name
    pub const NAME: &'static str = "math.sub";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [lhs, rhs] = fixed_args::<2>(Self::NAME, arguments)?;
        Ok(Box::new(Subtract { lhs, rhs }))
    }
}

impl HopeFunction for Subtract<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let lhs = numeric_value(context, self.lhs, 0.0)?;
        let rhs = numeric_value(context, self.rhs, 0.0)?;
        Ok(Value::number(lhs - rhs))
    }
}

/// `math.div(a, b)`. A zero denominator is an illegal evaluation.
pub struct Divide<'a> {
    numerator: &'a Value,
    denominator: &'a Value,
}

impl Divide<'_> {
    /// Registered name
    pub const NAME: &'static str = "math.div";

    /// Factory
    pub fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [numerator, denominator] = fixed_args::<2>(Self::NAME, arguments)?;
        Ok(Box::new(Divide {
            numerator,
            denominator,
        }))
    }
}

impl HopeFunction for Divide<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let numerator = numeric_value(context, self.numerator, 0.0)?;
        let denominator = numeric_value(context, self.denominator, 0.0)?;
        if denominator == 0.0 {
            return context
                .illegal_evaluation("Denominator is zero", 0.0)
                .map(Value::number);
        }
        Ok(Value::number(numerator / denominator))
    }
}

/// Single-argument numeric functions
pub struct Unary<'a> {
    operand: &'a Value,
    op: fn(f64) -> f64,
}

impl Unary<'_> {
    /// `math.negate(a)`
    pub const NEGATE: &'static str = "math.negate";
    /// `math.abs(a)`
    pub const ABS: &'static str = "math.abs";
    /// `math.floor(a)`
    pub const FLOOR: &'static str = "math.floor";
    /// `math.ceil(a)`
    pub const CEIL: &'static str = "math.ceil";

    fn build<'a>(
        name: &str,
        arguments: &'a [Value],
        op: fn(f64) -> f64,
    ) -> Result<Box<dyn HopeFunction + 'a>> {
        let [operand] = fixed_args::<1>(name, arguments)?;
        Ok(Box::new(Unary { operand, op }))
    }

    /// Factory for `math.negate`
    pub fn negate(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Self::build(Self::NEGATE, arguments, |n| -n)
    }

    /// Factory for `math.abs`
    pub fn abs(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Self::build(Self::ABS, arguments, f64::abs)
    }

    /// Factory for `math.floor`
    pub fn floor(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Self::build(Self::FLOOR, arguments, f64::floor)
    }

    /// Factory for `math.ceil`
    pub fn ceil(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Self::build(Self::CEIL, arguments, f64::ceil)
    }
}

impl HopeFunction for Unary<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let operand = numeric_value(context, self.operand, 0.0)?;
        Ok(Value::number((self.op)(operand)))
    }
}
