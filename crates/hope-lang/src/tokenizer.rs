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

//! Tokenizer for hope rules

use crate::error::{ParseError, ParseResult};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize},
    multi::many0,
    sequence::{preceded, terminated},
};
use nom_locate::LocatedSpan;
use std::fmt;
use unicode_xid::UnicodeXID;

/// Rule text annotated with byte offsets
pub type Span<'a> = LocatedSpan<&'a str>;

/// A token and the byte range `[start, end)` it covers in the rule text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The token
    pub value: T,
    /// Offset of the first byte
    pub start: usize,
    /// Offset just past the last byte
    pub end: usize,
}

fn position(span: &Span<'_>) -> usize {
    span.location_offset()
}

fn spanned<T>(start: &Span<'_>, end: &Span<'_>, value: T) -> Spanned<T> {
    Spanned {
        value,
        start: position(start),
        end: position(end),
    }
}

/// Token types in hope rules
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    True,
    False,

    /// Dotted function name
    Identifier(String),

    // Comparison
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    // Logical
    AndAnd,
    OrOr,
    And,
    Or,
    Not,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
}

impl Token {
    /// Get keyword from string
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s {
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::String(s) => write!(f, "'{s}'"),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Identifier(name) => f.write_str(name),
            Token::Equal => f.write_str("=="),
            Token::NotEqual => f.write_str("!="),
            Token::GreaterThan => f.write_str(">"),
            Token::GreaterThanOrEqual => f.write_str(">="),
            Token::LessThan => f.write_str("<"),
            Token::LessThanOrEqual => f.write_str("<="),
            Token::AndAnd => f.write_str("&&"),
            Token::OrOr => f.write_str("||"),
            Token::And => f.write_str("&"),
            Token::Or => f.write_str("|"),
            Token::Not => f.write_str("^"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
        }
    }
}

/// Tokenize a hope rule
pub fn tokenize(input: &str) -> ParseResult<Vec<Spanned<Token>>> {
    let span = Span::new(input);
    let (_, tokens) = tokenize_all(span).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => unexpected_character(input, e),
        nom::Err::Incomplete(_) => ParseError::UnexpectedEndOfInput {
            expected: "a token".to_string(),
            position: input.len(),
        },
    })?;
    Ok(tokens)
}

// Plain nom errors only come out of `all_consuming`, pointing at the first
// character no token rule accepted.
fn unexpected_character(input: &str, error: ParseError) -> ParseError {
    match error {
        ParseError::NomError { position, .. } => match input[position..].chars().next() {
            Some(character) => ParseError::UnexpectedCharacter {
                character,
                position,
            },
            None => ParseError::UnexpectedEndOfInput {
                expected: "a token".to_string(),
                position,
            },
        },
        other => other,
    }
}

fn tokenize_all(input: Span) -> IResult<Span, Vec<Spanned<Token>>, ParseError> {
    all_consuming(terminated(many0(preceded(multispace0, token)), multispace0)).parse(input)
}

fn token(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    alt((
        token_number,
        token_string,
        token_identifier_or_keyword,
        token_multi_char_op,
        token_single_char,
    ))
    .parse(input)
}

fn token_number(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    let start = input;
    let (input, number_str) = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;

    let number_text = number_str.fragment();
    match number_text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok((input, spanned(&start, &input, Token::Number(n)))),
        _ => Err(nom::Err::Failure(ParseError::InvalidLiteral {
            literal_type: "number".to_string(),
            value: number_text.to_string(),
            position: position(&start),
        })),
    }
}

fn token_string(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    let start = input;
    let (mut remaining, quote) = one_of("'\"").parse(input)?;
    let unclosed = || {
        nom::Err::Failure(ParseError::UnclosedString {
            position: position(&start),
        })
    };
    let mut text = String::new();

    loop {
        let (next, ch) = anychar::<_, ParseError>(remaining).map_err(|_| unclosed())?;
        if ch == quote {
            return Ok((next, spanned(&start, &next, Token::String(text))));
        }
        if ch != '\\' {
            text.push(ch);
            remaining = next;
            continue;
        }
        let (after, escaped) = anychar::<_, ParseError>(next).map_err(|_| unclosed())?;
        text.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' | '\'' | '"' | '/' => escaped,
            other => {
                return Err(nom::Err::Failure(ParseError::InvalidEscape {
                    sequence: format!("\\{other}"),
                    position: position(&remaining),
                }));
            }
        });
        remaining = after;
    }
}

fn is_identifier_start(c: char) -> bool {
    UnicodeXID::is_xid_start(c) || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}

fn identifier_part(input: Span) -> IResult<Span, Span, ParseError> {
    recognize((
        take_while1(is_identifier_start),
        take_while(is_identifier_continue),
    ))
    .parse(input)
}

fn token_identifier_or_keyword(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    let start = input;

    let (input, ident) =
        recognize((identifier_part, many0((char('.'), identifier_part)))).parse(input)?;

    let ident_str = ident.fragment();
    let token = Token::from_keyword(ident_str)
        .unwrap_or_else(|| Token::Identifier(ident_str.to_string()));

    Ok((input, spanned(&start, &input, token)))
}

fn token_multi_char_op(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    let start = input;

    let (input, token) = alt((
        map(tag("=="), |_| Token::Equal),
        map(tag("!="), |_| Token::NotEqual),
        map(tag(">="), |_| Token::GreaterThanOrEqual),
        map(tag("<="), |_| Token::LessThanOrEqual),
        map(tag("&&"), |_| Token::AndAnd),
        map(tag("||"), |_| Token::OrOr),
    ))
    .parse(input)?;

    Ok((input, spanned(&start, &input, token)))
}

fn token_single_char(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    let start = input;

    let (input, token) = alt((
        map(char('>'), |_| Token::GreaterThan),
        map(char('<'), |_| Token::LessThan),
        map(char('&'), |_| Token::And),
        map(char('|'), |_| Token::Or),
        map(char('^'), |_| Token::Not),
        map(char('('), |_| Token::LeftParen),
        map(char(')'), |_| Token::RightParen),
        map(char('['), |_| Token::LeftBracket),
        map(char(']'), |_| Token::RightBracket),
        map(char(','), |_| Token::Comma),
    ))
    .parse(input)?;

    Ok((input, spanned(&start, &input, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 1.5 -23 2e3"),
            vec![
                Token::Number(1.0),
                Token::Number(1.5),
                Token::Number(-23.0),
                Token::Number(2000.0)
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds("'abc'"), vec![Token::String("abc".into())]);
        assert_eq!(kinds("\"abc\""), vec![Token::String("abc".into())]);
        assert_eq!(kinds("\"'abc'\""), vec![Token::String("'abc'".into())]);
        assert_eq!(kinds("'\"abc\"'"), vec![Token::String("\"abc\"".into())]);
        assert_eq!(kinds(r"'it\'s'"), vec![Token::String("it's".into())]);
        assert_eq!(kinds("''"), vec![Token::String(String::new())]);
        assert_eq!(
            kinds("'/first name'"),
            vec![Token::String("/first name".into())]
        );
    }

    #[test]
    fn test_identifiers_and_operators() {
        assert_eq!(
            kinds("math.add(1, [2]) >= 3 && ^true || x | y & z != w"),
            vec![
                Token::Identifier("math.add".into()),
                Token::LeftParen,
                Token::Number(1.0),
                Token::Comma,
                Token::LeftBracket,
                Token::Number(2.0),
                Token::RightBracket,
                Token::RightParen,
                Token::GreaterThanOrEqual,
                Token::Number(3.0),
                Token::AndAnd,
                Token::Not,
                Token::True,
                Token::OrOr,
                Token::Identifier("x".into()),
                Token::Or,
                Token::Identifier("y".into()),
                Token::And,
                Token::Identifier("z".into()),
                Token::NotEqual,
                Token::Identifier("w".into()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("  'ab' == 3 ").unwrap();
        assert_eq!((tokens[0].start, tokens[0].end), (2, 6));
        assert_eq!((tokens[1].start, tokens[1].end), (7, 9));
        assert_eq!((tokens[2].start, tokens[2].end), (10, 11));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            tokenize("3 # 4"),
            Err(ParseError::UnexpectedCharacter {
                character: '#',
                position: 2
            })
        );
        assert_eq!(
            tokenize("'abc"),
            Err(ParseError::UnclosedString { position: 0 })
        );
        assert_eq!(
            tokenize(r"'a\qb'"),
            Err(ParseError::InvalidEscape {
                sequence: r"\q".to_string(),
                position: 2
            })
        );
        assert!(tokenize("").unwrap().is_empty());
    }
}
