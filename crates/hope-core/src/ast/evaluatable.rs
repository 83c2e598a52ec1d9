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

//! Boolean-producing nodes

use super::Value;
use crate::error::{HopeError, Result};
use std::fmt;

/// Binary operators that take two value operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Strict logical and (`&`)
    And,
    /// Strict logical or (`|`)
    Or,
    /// Equality (`==`)
    Equals,
    /// Inequality (`!=`)
    NotEquals,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEquals,
    /// Less than (`<`)
    Lesser,
    /// Less than or equal (`<=`)
    LesserEquals,
}

impl BinaryOperator {
    /// Operator symbol in rule text
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Lesser => "<",
            Self::LesserEquals => "<=",
        }
    }

    /// Whether operands are resolved as numbers
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Greater | Self::GreaterEquals | Self::Lesser | Self::LesserEquals
        )
    }

    /// Whether operands are resolved as booleans
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Exactly two operands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operands {
    /// Left-hand side
    pub lhs: Value,
    /// Right-hand side
    pub rhs: Value,
}

impl Operands {
    /// Pair two operands
    pub fn new(lhs: Value, rhs: Value) -> Self {
        Self { lhs, rhs }
    }

    /// Build from a list, which must hold exactly two values
    pub fn from_vec(node: &'static str, operands: Vec<Value>) -> Result<Self> {
        let actual = operands.len();
        let [lhs, rhs]: [Value; 2] =
            operands
                .try_into()
                .map_err(|_: Vec<Value>| HopeError::InvalidArity {
                    node,
                    expected: "exactly 2".to_string(),
                    actual,
                })?;
        Ok(Self { lhs, rhs })
    }
}

/// Non-empty ordered list of child rules
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combiner {
    expressions: Vec<Evaluatable>,
}

impl Combiner {
    /// Build a combiner; an empty list is rejected
    pub fn new(node: &'static str, expressions: Vec<Evaluatable>) -> Result<Self> {
        if expressions.is_empty() {
            return Err(HopeError::InvalidArity {
                node,
                expected: "at least 1".to_string(),
                actual: 0,
            });
        }
        Ok(Self { expressions })
    }

    /// Children in evaluation order
    pub fn expressions(&self) -> &[Evaluatable] {
        &self.expressions
    }
}

/// A node that reduces to a boolean
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Evaluatable {
    /// Short-circuiting conjunction (`&&`)
    AndCombiner(Combiner),
    /// Short-circuiting disjunction (`||`)
    OrCombiner(Combiner),
    /// Negation of a boolean operand (`^`)
    Not(Value),
    /// Conjunction evaluating both operands (`&`)
    And(Operands),
    /// Disjunction evaluating both operands (`|`)
    Or(Operands),
    /// Value equality
    Equals(Operands),
    /// Value inequality
    NotEquals(Operands),
    /// Numeric `>`
    Greater(Operands),
    /// Numeric `>=`
    GreaterEquals(Operands),
    /// Numeric `<`
    Lesser(Operands),
    /// Numeric `<=`
    LesserEquals(Operands),
}

impl Evaluatable {
    /// `&&` over the given children
    pub fn and_combiner(expressions: Vec<Evaluatable>) -> Result<Self> {
        Combiner::new("AndCombiner", expressions).map(Self::AndCombiner)
    }

    /// `||` over the given children
    pub fn or_combiner(expressions: Vec<Evaluatable>) -> Result<Self> {
        Combiner::new("OrCombiner", expressions).map(Self::OrCombiner)
    }

    /// Negation
    pub fn not(operand: Value) -> Self {
        Self::Not(operand)
    }

    /// Binary node for an operator
    pub fn binary(operator: BinaryOperator, lhs: Value, rhs: Value) -> Self {
        let operands = Operands::new(lhs, rhs);
        match operator {
            BinaryOperator::And => Self::And(operands),
            BinaryOperator::Or => Self::Or(operands),
            BinaryOperator::Equals => Self::Equals(operands),
            BinaryOperator::NotEquals => Self::NotEquals(operands),
            BinaryOperator::Greater => Self::Greater(operands),
            BinaryOperator::GreaterEquals => Self::GreaterEquals(operands),
            BinaryOperator::Lesser => Self::Lesser(operands),
            BinaryOperator::LesserEquals => Self::LesserEquals(operands),
        }
    }

    /// Binary node from an operand list of exactly two values
    pub fn binary_from_vec(operator: BinaryOperator, operands: Vec<Value>) -> Result<Self> {
        let Operands { lhs, rhs } = Operands::from_vec(operator.symbol(), operands)?;
        Ok(Self::binary(operator, lhs, rhs))
    }

    /// Operator and operands of a binary node
    pub fn as_binary(&self) -> Option<(BinaryOperator, &Operands)> {
        let pair = match self {
            Self::And(o) => (BinaryOperator::And, o),
            Self::Or(o) => (BinaryOperator::Or, o),
            Self::Equals(o) => (BinaryOperator::Equals, o),
            Self::NotEquals(o) => (BinaryOperator::NotEquals, o),
            Self::Greater(o) => (BinaryOperator::Greater, o),
            Self::GreaterEquals(o) => (BinaryOperator::GreaterEquals, o),
            Self::Lesser(o) => (BinaryOperator::Lesser, o),
            Self::LesserEquals(o) => (BinaryOperator::LesserEquals, o),
            Self::AndCombiner(_) | Self::OrCombiner(_) | Self::Not(_) => return None,
        };
        Some(pair)
    }

    fn is_combiner(&self) -> bool {
        matches!(self, Self::AndCombiner(_) | Self::OrCombiner(_))
    }
}

fn write_combined(f: &mut fmt::Formatter<'_>, combiner: &Combiner, joiner: &str) -> fmt::Result {
    for (i, child) in combiner.expressions().iter().enumerate() {
        if i > 0 {
            f.write_str(joiner)?;
        }
        if child.is_combiner() {
            write!(f, "({child})")?;
        } else {
            write!(f, "{child}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Evaluatable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AndCombiner(c) => write_combined(f, c, " && "),
            Self::OrCombiner(c) => write_combined(f, c, " || "),
            Self::Not(operand) => write!(f, "^{operand}"),
            other => match other.as_binary() {
                Some((op, Operands { lhs, rhs })) => write!(f, "{lhs} {op} {rhs}"),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    fn gt(a: f64, b: f64) -> Evaluatable {
        Evaluatable::binary(BinaryOperator::Greater, Value::number(a), Value::number(b))
    }

    #[test]
    fn test_empty_combiner_rejected() {
        assert!(matches!(
            Evaluatable::and_combiner(vec![]),
            Err(HopeError::InvalidArity { actual: 0, .. })
        ));
        assert!(Evaluatable::or_combiner(vec![gt(1.0, 2.0)]).is_ok());
    }

    #[test]
    fn test_binary_arity() {
        let err = Evaluatable::binary_from_vec(BinaryOperator::Equals, vec![Value::number(1.0)])
            .unwrap_err();
        assert_eq!(err.to_string(), "== expects exactly 2 operands, got 1");
        let ok = Evaluatable::binary_from_vec(
            BinaryOperator::Lesser,
            vec![Value::number(1.0), Value::number(2.0)],
        )
        .unwrap();
        assert_eq!(ok.as_binary().map(|(op, _)| op), Some(BinaryOperator::Lesser));
    }

    #[test]
    fn test_structural_hashing() {
        let a = Evaluatable::and_combiner(vec![gt(3.0, 2.0), gt(2.0, 5.0)]).unwrap();
        let b = Evaluatable::and_combiner(vec![gt(3.0, 2.0), gt(2.0, 5.0)]).unwrap();
        let c = Evaluatable::or_combiner(vec![gt(3.0, 2.0), gt(2.0, 5.0)]).unwrap();
        let set: FxHashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        let inner = Evaluatable::or_combiner(vec![gt(1.0, 2.0), Evaluatable::not(Value::boolean(false))])
            .unwrap();
        let rule = Evaluatable::and_combiner(vec![gt(3.0, 2.0), inner]).unwrap();
        assert_eq!(rule.to_string(), "3 > 2 && (1 > 2 || ^false)");
    }
}
