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

//! Recursive-descent parser for hope rules
//!
//! ```text
//! rule      := or_comb EOF
//! or_comb   := and_comb ('||' and_comb)*
//! and_comb  := term ('&&' term)*
//! term      := '(' or_comb ')' | '^' value | value op value
//! op        := '==' | '!=' | '>' | '>=' | '<' | '<=' | '&' | '|'
//! value     := number | 'true' | 'false' | string | array | call
//! array     := '[' (value (',' value)*)? ']'
//! call      := dotted_name '(' (value (',' value)*)? ')'
//! ```
//!
//! Operands are retyped for their operator while parsing: comparisons take
//! numeric operands, `&`, `|` and `^` take boolean ones, equality takes
//! anything. Function calls are bound through the registry as they are read,
//! so unknown functions and arity mismatches fail the parse.

use crate::error::ParseError;
use crate::lexer::TokenStream;
use crate::tokenizer::{Token, tokenize};
use hope_core::ast::{BinaryOperator, Evaluatable, Value};
use hope_core::error::Result;
use hope_core::registry::FunctionRegistry;

/// Parse a rule, binding its function calls through `registry`
pub fn parse_rule(input: &str, registry: &FunctionRegistry) -> Result<Evaluatable> {
    let tokens = tokenize(input)?;
    Parser::new(TokenStream::new(tokens, input.len()), registry).parse()
}

/// Parser over a token stream
pub struct Parser<'r> {
    tokens: TokenStream,
    registry: &'r FunctionRegistry,
}

impl<'r> Parser<'r> {
    /// Create a parser over a token stream
    pub fn new(tokens: TokenStream, registry: &'r FunctionRegistry) -> Self {
        Self { tokens, registry }
    }

    /// Parse a complete rule; trailing tokens are an error
    pub fn parse(mut self) -> Result<Evaluatable> {
        let rule = self.parse_or()?;
        match self.tokens.next() {
            None => Ok(rule),
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.value.to_string(),
                position: token.start,
            }
            .into()),
        }
    }

    fn parse_or(&mut self) -> Result<Evaluatable> {
        let mut terms = vec![self.parse_and()?];
        while self.tokens.consume(&Token::OrOr) {
            terms.push(self.parse_and()?);
        }
        collapse(terms, Evaluatable::or_combiner)
    }

    fn parse_and(&mut self) -> Result<Evaluatable> {
        let mut terms = vec![self.parse_term()?];
        while self.tokens.consume(&Token::AndAnd) {
            terms.push(self.parse_term()?);
        }
        collapse(terms, Evaluatable::and_combiner)
    }

    fn parse_term(&mut self) -> Result<Evaluatable> {
        if self.tokens.consume(&Token::LeftParen) {
            let inner = self.parse_or()?;
            self.tokens.expect(&Token::RightParen)?;
            return Ok(inner);
        }
        if self.tokens.consume(&Token::Not) {
            let position = self.tokens.offset();
            let value = self.parse_value()?;
            let operand = retype(value, "^", position, Value::into_boolean)?;
            return Ok(Evaluatable::not(operand));
        }
        self.parse_binary()
    }

    fn parse_binary(&mut self) -> Result<Evaluatable> {
        let lhs_position = self.tokens.offset();
        let lhs = self.parse_value()?;
        let operator = self.parse_operator()?;
        let rhs_position = self.tokens.offset();
        let rhs = self.parse_value()?;

        let symbol = operator.symbol();
        let (lhs, rhs) = if operator.is_comparison() {
            (
                retype(lhs, symbol, lhs_position, Value::into_numeric)?,
                retype(rhs, symbol, rhs_position, Value::into_numeric)?,
            )
        } else if operator.is_logical() {
            (
                retype(lhs, symbol, lhs_position, Value::into_boolean)?,
                retype(rhs, symbol, rhs_position, Value::into_boolean)?,
            )
        } else {
            (lhs.into_object(), rhs.into_object())
        };
        Ok(Evaluatable::binary(operator, lhs, rhs))
    }

    fn parse_operator(&mut self) -> Result<BinaryOperator> {
        let Some(token) = self.tokens.next() else {
            return Err(self.tokens.end_of_input("an operator").into());
        };
        let operator = match token.value {
            Token::Equal => BinaryOperator::Equals,
            Token::NotEqual => BinaryOperator::NotEquals,
            Token::GreaterThan => BinaryOperator::Greater,
            Token::GreaterThanOrEqual => BinaryOperator::GreaterEquals,
            Token::LessThan => BinaryOperator::Lesser,
            Token::LessThanOrEqual => BinaryOperator::LesserEquals,
            Token::And => BinaryOperator::And,
            Token::Or => BinaryOperator::Or,
            other => {
                return Err(ParseError::ExpectedToken {
                    expected: "an operator".to_string(),
                    found: other.to_string(),
                    position: token.start,
                }
                .into());
            }
        };
        Ok(operator)
    }

    fn parse_value(&mut self) -> Result<Value> {
        let Some(token) = self.tokens.next() else {
            return Err(self.tokens.end_of_input("a value").into());
        };
        match token.value {
            Token::Number(n) => Ok(Value::number(n)),
            Token::True => Ok(Value::boolean(true)),
            Token::False => Ok(Value::boolean(false)),
            Token::String(text) => string_literal(text),
            Token::LeftBracket => Ok(Value::array(self.parse_list(&Token::RightBracket)?)),
            Token::Identifier(name) => self.parse_call(&name),
            other => Err(ParseError::UnexpectedToken {
                token: other.to_string(),
                position: token.start,
            }
            .into()),
        }
    }

    fn parse_list(&mut self, close: &Token) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        if self.tokens.consume(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            if !self.tokens.consume(&Token::Comma) {
                self.tokens.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Value> {
        self.tokens.expect(&Token::LeftParen)?;
        let arguments = self.parse_list(&Token::RightParen)?;
        let call = self.registry.bind(name, arguments)?;
        Ok(Value::function(call))
    }
}

fn collapse(
    terms: Vec<Evaluatable>,
    combine: fn(Vec<Evaluatable>) -> Result<Evaluatable>,
) -> Result<Evaluatable> {
    match <[Evaluatable; 1]>::try_from(terms) {
        Ok([single]) => Ok(single),
        Err(terms) => combine(terms),
    }
}

// `$` starts a path, `/` a pointer; anything else is plain text.
fn string_literal(text: String) -> Result<Value> {
    if text.starts_with('$') {
        Value::path(&text)
    } else if text.starts_with('/') {
        Value::pointer(&text)
    } else {
        Ok(Value::string(text))
    }
}

fn retype(
    value: Value,
    operator: &'static str,
    position: usize,
    convert: fn(Value) -> Option<Value>,
) -> Result<Value> {
    let operand = value.kind_name();
    convert(value).ok_or_else(|| {
        ParseError::InvalidOperand {
            operator,
            operand,
            position,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hope_core::HopeError;
    use hope_core::ast::Source;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn registry() -> FunctionRegistry {
        FunctionRegistry::with_standard_library().unwrap()
    }

    fn parse(input: &str) -> Result<Evaluatable> {
        parse_rule(input, &registry())
    }

    fn gt(lhs: f64, rhs: f64) -> Evaluatable {
        Evaluatable::binary(BinaryOperator::Greater, Value::number(lhs), Value::number(rhs))
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(parse("3 > 2").unwrap(), gt(3.0, 2.0));
        assert_eq!(
            parse("23 == 23").unwrap(),
            Evaluatable::binary(
                BinaryOperator::Equals,
                Value::number(23.0),
                Value::number(23.0)
            )
        );
    }

    #[test]
    fn test_combiner_precedence() {
        let rule = parse("3 > 2 && 2 > 5 || 1 > 0").unwrap();
        let expected = Evaluatable::or_combiner(vec![
            Evaluatable::and_combiner(vec![gt(3.0, 2.0), gt(2.0, 5.0)]).unwrap(),
            gt(1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(rule, expected);
    }

    #[test]
    fn test_grouping() {
        let rule = parse("(((3 > 2) || (2 > 5)) && ((2 > 2) ||  (2 > 1)))").unwrap();
        let expected = Evaluatable::and_combiner(vec![
            Evaluatable::or_combiner(vec![gt(3.0, 2.0), gt(2.0, 5.0)]).unwrap(),
            Evaluatable::or_combiner(vec![gt(2.0, 2.0), gt(2.0, 1.0)]).unwrap(),
        ])
        .unwrap();
        assert_eq!(rule, expected);
    }

    #[test]
    fn test_operand_retyping() {
        let rule = parse("'$.count' > 94").unwrap();
        let Some((_, operands)) = rule.as_binary() else {
            panic!("expected a binary node");
        };
        assert!(matches!(operands.lhs, Value::Numeric(Source::Path(_))));

        let rule = parse("'/val' == true").unwrap();
        let Some((_, operands)) = rule.as_binary() else {
            panic!("expected a binary node");
        };
        assert!(matches!(operands.lhs, Value::Object(Source::Pointer(_))));
        assert_eq!(operands.rhs, Value::boolean(true));

        let rule = parse("^'$.boolValue'").unwrap();
        assert!(matches!(rule, Evaluatable::Not(Value::Boolean(Source::Path(_)))));
    }

    #[test]
    fn test_string_literal_kinds() {
        assert_eq!(string_literal("abc".into()).unwrap(), Value::string("abc"));
        assert_eq!(
            string_literal("$.abc".into()).unwrap(),
            Value::path("$.abc").unwrap()
        );
        assert_eq!(
            string_literal("/first name".into()).unwrap(),
            Value::pointer("/first name").unwrap()
        );
    }

    #[test]
    fn test_function_binding() {
        let rule = parse("math.add(math.add('$.a', '$.b', 7), '$.c', 4) == 25").unwrap();
        let Some((_, operands)) = rule.as_binary() else {
            panic!("expected a binary node");
        };
        let Value::Object(Source::Function(call)) = &operands.lhs else {
            panic!("expected a function operand, got {}", operands.lhs);
        };
        assert_eq!(call.name(), "math.add");
        assert_eq!(call.parameters().len(), 3);
        assert!(matches!(call.parameters()[0], Value::Function(_)));
    }

    #[rstest]
    #[case("'abc' > 3", ">")]
    #[case("3 & true", "&")]
    #[case("^'abc'", "^")]
    #[case("[1, 2] < 3", "<")]
    fn test_invalid_operands(#[case] rule: &str, #[case] operator: &str) {
        match parse(rule) {
            Err(HopeError::Parse { message, .. }) => {
                assert!(message.contains(&format!("'{operator}'")), "{message}")
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("3 >")]
    #[case("3 > 2 4")]
    #[case("(3 > 2")]
    #[case("3 2")]
    #[case("math.add(1, 2 == 3")]
    #[case("[1, 2")]
    fn test_syntax_errors(#[case] rule: &str) {
        assert!(matches!(parse(rule), Err(HopeError::Parse { .. })));
    }

    #[test]
    fn test_error_positions() {
        assert_eq!(
            parse("3 > 2 4"),
            Err(HopeError::Parse {
                position: 6,
                message: "Unexpected token '4'".to_string()
            })
        );
        assert_eq!(
            parse("3 >"),
            Err(HopeError::Parse {
                position: 3,
                message: "Unexpected end of input, expected a value".to_string()
            })
        );
    }

    #[test]
    fn test_binding_errors_fail_fast() {
        assert_eq!(
            parse("ss.blah() == 'blah'"),
            Err(HopeError::UnknownFunction {
                name: "ss.blah".to_string()
            })
        );
        assert_eq!(
            parse("math.sub(1) == 1"),
            Err(HopeError::NoMatchingOverload {
                name: "math.sub".to_string(),
                arity: 1
            })
        );
        assert!(matches!(
            parse("'$.a[' == 1"),
            Err(HopeError::InvalidAddress { .. })
        ));
    }
}
