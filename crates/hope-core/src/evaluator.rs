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

//! Boolean evaluation of rules
//!
//! A synchronous recursive walk over [`Evaluatable`] nodes. Combiners
//! (`&&`, `||`) short-circuit; the binary logical operators (`&`, `|`)
//! always resolve both operands before combining them.

use crate::ast::{Datum, Evaluatable, Operands};
use crate::context::EvaluationContext;
use crate::converters::{boolean_value, numeric_value, object_value};
use crate::error::Result;
use crate::strategy::{ErrorHandlingStrategy, StrictErrorHandlingStrategy};
use serde_json::Value as JsonValue;
use std::borrow::Borrow;
use std::sync::Arc;

/// Evaluate one rule within an existing context
pub fn evaluate_rule(rule: &Evaluatable, context: &mut EvaluationContext<'_>) -> Result<bool> {
    match rule {
        Evaluatable::AndCombiner(combiner) => {
            for child in combiner.expressions() {
                if !evaluate_rule(child, context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Evaluatable::OrCombiner(combiner) => {
            for child in combiner.expressions() {
                if evaluate_rule(child, context)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Evaluatable::Not(operand) => Ok(!boolean_value(context, operand, false)?),
        Evaluatable::And(operands) => {
            let (lhs, rhs) = booleans(operands, context)?;
            Ok(lhs && rhs)
        }
        Evaluatable::Or(operands) => {
            let (lhs, rhs) = booleans(operands, context)?;
            Ok(lhs || rhs)
        }
        Evaluatable::Equals(operands) => {
            let (lhs, rhs) = objects(operands, context)?;
            Ok(lhs == rhs)
        }
        Evaluatable::NotEquals(operands) => {
            let (lhs, rhs) = objects(operands, context)?;
            Ok(lhs != rhs)
        }
        Evaluatable::Greater(operands) => {
            let (lhs, rhs) = numbers(operands, context)?;
            Ok(lhs > rhs)
        }
        Evaluatable::GreaterEquals(operands) => {
            let (lhs, rhs) = numbers(operands, context)?;
            Ok(lhs >= rhs)
        }
        Evaluatable::Lesser(operands) => {
            let (lhs, rhs) = numbers(operands, context)?;
            Ok(lhs < rhs)
        }
        Evaluatable::LesserEquals(operands) => {
            let (lhs, rhs) = numbers(operands, context)?;
            Ok(lhs <= rhs)
        }
    }
}

fn booleans(operands: &Operands, context: &mut EvaluationContext<'_>) -> Result<(bool, bool)> {
    let lhs = boolean_value(context, &operands.lhs, false)?;
    let rhs = boolean_value(context, &operands.rhs, false)?;
    Ok((lhs, rhs))
}

fn numbers(operands: &Operands, context: &mut EvaluationContext<'_>) -> Result<(f64, f64)> {
    let lhs = numeric_value(context, &operands.lhs, 0.0)?;
    let rhs = numeric_value(context, &operands.rhs, 0.0)?;
    Ok((lhs, rhs))
}

fn objects(operands: &Operands, context: &mut EvaluationContext<'_>) -> Result<(Datum, Datum)> {
    let lhs = object_value(context, &operands.lhs, Datum::Null)?;
    let rhs = object_value(context, &operands.rhs, Datum::Null)?;
    Ok((lhs, rhs))
}

/// Evaluates rules against documents with a fixed error handling strategy.
///
/// Cheap to clone and safe to share between threads. Every call creates its
/// own [`EvaluationContext`]; batch calls share one context across all rules.
#[derive(Debug, Clone)]
pub struct Evaluator {
    strategy: Arc<dyn ErrorHandlingStrategy>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Arc::new(StrictErrorHandlingStrategy))
    }
}

impl Evaluator {
    /// Evaluator using the given strategy
    pub fn new(strategy: Arc<dyn ErrorHandlingStrategy>) -> Self {
        Self { strategy }
    }

    /// Active strategy
    pub fn strategy(&self) -> &Arc<dyn ErrorHandlingStrategy> {
        &self.strategy
    }

    /// Fresh context over a document, for callers driving [`evaluate_rule`] directly
    pub fn context<'a>(&'a self, document: &'a JsonValue) -> EvaluationContext<'a> {
        EvaluationContext::new(document, self.strategy.as_ref())
    }

    /// Evaluate one rule
    pub fn evaluate(&self, rule: &Evaluatable, document: &JsonValue) -> Result<bool> {
        let mut context = self.context(document);
        evaluate_rule(rule, &mut context)
    }

    /// Evaluate every rule, in order, sharing one context
    pub fn evaluate_all<R: Borrow<Evaluatable>>(
        &self,
        rules: &[R],
        document: &JsonValue,
    ) -> Result<Vec<bool>> {
        let mut context = self.context(document);
        let results = rules
            .iter()
            .map(|rule| evaluate_rule(rule.borrow(), &mut context))
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "Evaluated {} rules ({:?})",
            rules.len(),
            context.cache_stats()
        );
        Ok(results)
    }

    /// Index of the first rule that evaluates to true, sharing one context.
    /// Rules after the first match are not evaluated.
    pub fn evaluate_first<R: Borrow<Evaluatable>>(
        &self,
        rules: &[R],
        document: &JsonValue,
    ) -> Result<Option<usize>> {
        let mut context = self.context(document);
        for (index, rule) in rules.iter().enumerate() {
            if evaluate_rule(rule.borrow(), &mut context)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, Value};
    use crate::error::HopeError;
    use crate::registry::FunctionRegistry;
    use crate::strategy::InjectDefaultErrorHandlingStrategy;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn num(n: f64) -> Value {
        Value::number(n)
    }

    fn cmp(op: BinaryOperator, lhs: Value, rhs: Value) -> Evaluatable {
        Evaluatable::binary(op, lhs, rhs)
    }

    fn path(raw: &str) -> Value {
        Value::path(raw).unwrap()
    }

    fn inject() -> Evaluator {
        Evaluator::new(Arc::new(InjectDefaultErrorHandlingStrategy))
    }

    #[test]
    fn test_literal_comparisons() {
        let evaluator = Evaluator::default();
        let doc = json!({});
        let cases = [
            (cmp(BinaryOperator::Equals, num(23.0), num(23.0)), true),
            (cmp(BinaryOperator::NotEquals, num(23.0), num(29.0)), true),
            (cmp(BinaryOperator::Greater, num(3.0), num(2.0)), true),
            (cmp(BinaryOperator::GreaterEquals, num(2.0), num(2.0)), true),
            (cmp(BinaryOperator::Lesser, num(2.0), num(5.0)), true),
            (cmp(BinaryOperator::LesserEquals, num(6.0), num(5.0)), false),
            (cmp(BinaryOperator::Equals, Value::string("93"), num(93.0)), false),
            (cmp(BinaryOperator::And, Value::boolean(true), Value::boolean(false)), false),
            (cmp(BinaryOperator::Or, Value::boolean(true), Value::boolean(false)), true),
            (Evaluatable::not(Value::boolean(false)), true),
        ];
        for (rule, expected) in cases {
            assert_eq!(evaluator.evaluate(&rule, &doc).unwrap(), expected, "{rule}");
        }
    }

    #[test]
    fn test_integer_and_decimal_are_the_same_number() {
        let rule = cmp(BinaryOperator::Equals, path("$.n"), num(1.0));
        assert!(Evaluator::default().evaluate(&rule, &json!({"n": 1})).unwrap());
        assert!(Evaluator::default().evaluate(&rule, &json!({"n": 1.0})).unwrap());
    }

    #[test]
    fn test_combiner_short_circuits_but_binary_does_not() {
        let registry = FunctionRegistry::with_standard_library().unwrap();
        let failing = || {
            Value::function(
                registry
                    .bind("math.div", vec![num(1.0), num(0.0)])
                    .unwrap(),
            )
        };
        let doc = json!({});
        let evaluator = Evaluator::default();
        let explodes = cmp(BinaryOperator::Greater, failing(), num(0.0));

        let and = Evaluatable::and_combiner(vec![
            cmp(BinaryOperator::Equals, num(1.0), num(2.0)),
            explodes.clone(),
        ])
        .unwrap();
        assert!(!evaluator.evaluate(&and, &doc).unwrap());

        let or = Evaluatable::or_combiner(vec![
            cmp(BinaryOperator::Equals, num(1.0), num(1.0)),
            explodes,
        ])
        .unwrap();
        assert!(evaluator.evaluate(&or, &doc).unwrap());

        let failing_flag = || {
            Value::function(
                registry
                    .bind("str.match", vec![Value::string(""), Value::string("x")])
                    .unwrap(),
            )
        };
        let strict_and = cmp(BinaryOperator::And, Value::boolean(false), failing_flag());
        assert!(matches!(
            evaluator.evaluate(&strict_and, &doc),
            Err(HopeError::IllegalEvaluation { .. })
        ));
        let strict_or = cmp(BinaryOperator::Or, Value::boolean(true), failing_flag());
        assert!(evaluator.evaluate(&strict_or, &doc).is_err());
    }

    #[test]
    fn test_missing_values_by_strategy() {
        let doc = json!({"a": 1});
        let rule = cmp(BinaryOperator::Greater, path("$.x"), num(0.0));
        assert_eq!(
            Evaluator::default().evaluate(&rule, &doc),
            Err(HopeError::missing_value("$.x"))
        );
        assert!(!inject().evaluate(&rule, &doc).unwrap());

        let eq = cmp(BinaryOperator::Equals, path("$.x"), Value::boolean(true));
        assert!(Evaluator::default().evaluate(&eq, &doc).is_err());
        assert!(!inject().evaluate(&eq, &doc).unwrap());
    }

    #[test]
    fn test_batch_shares_one_cache() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        let rules: Vec<Evaluatable> = (0..10)
            .map(|i| {
                Evaluatable::and_combiner(vec![
                    cmp(BinaryOperator::Greater, path("$.a"), num(f64::from(i) - 100.0)),
                    cmp(BinaryOperator::Lesser, path("$.b"), num(100.0)),
                    cmp(BinaryOperator::NotEquals, path("$.c"), num(f64::from(i))),
                ])
                .unwrap()
            })
            .collect();
        let evaluator = Evaluator::default();
        let mut context = evaluator.context(&doc);
        for rule in &rules {
            evaluate_rule(rule, &mut context).unwrap();
        }
        assert_eq!(context.cache_stats().misses, 3);
        assert_eq!(context.cache_stats().hits, 27);

        let results = evaluator.evaluate_all(&rules, &doc).unwrap();
        assert_eq!(results.len(), 10);
        assert!(!results[3]);
        assert!(results[4]);
    }

    #[test]
    fn test_evaluate_first() {
        let doc = json!({"x": "A", "y": "B"});
        let rules = vec![
            cmp(BinaryOperator::Equals, path("$.x"), Value::string("E")),
            cmp(BinaryOperator::Equals, path("$.x"), Value::string("A")),
            cmp(BinaryOperator::Equals, path("$.y"), Value::string("U")),
        ];
        assert_eq!(inject().evaluate_first(&rules, &doc).unwrap(), Some(1));
        assert_eq!(inject().evaluate_first(&rules[2..], &doc).unwrap(), None);
        let empty: Vec<Evaluatable> = Vec::new();
        assert_eq!(inject().evaluate_first(&empty, &doc).unwrap(), None);
    }

    #[test]
    fn test_rules_are_shareable_across_threads() {
        let rule = Arc::new(cmp(BinaryOperator::Greater, path("$.n"), num(10.0)));
        let evaluator = Evaluator::default();
        std::thread::scope(|scope| {
            for n in 0..8 {
                let rule = Arc::clone(&rule);
                let evaluator = evaluator.clone();
                scope.spawn(move || {
                    let doc = json!({"n": n * 3});
                    assert_eq!(evaluator.evaluate(&rule, &doc).unwrap(), n * 3 > 10);
                });
            }
        });
    }
}
