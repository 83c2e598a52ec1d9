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

//! Parser error types

use crate::tokenizer::Span;
use hope_core::HopeError;
use nom::error::{ErrorKind, ParseError as NomParseError};
use thiserror::Error;

/// Result type for tokenizer and parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Syntax error with location information.
///
/// Messages carry no position; [`ParseError::position`] reports it and the
/// conversion into [`HopeError::Parse`] keeps both.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Character that starts no token
    #[error("Unexpected character '{character}'")]
    UnexpectedCharacter {
        /// The offending character
        character: char,
        /// Position of the character
        position: usize,
    },

    /// Token that does not fit the grammar here
    #[error("Unexpected token '{token}'")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: String,
        /// Position where the token was found
        position: usize,
    },

    /// Expected token
    #[error("Expected {expected}, found '{found}'")]
    ExpectedToken {
        /// The expected token description
        expected: String,
        /// What was found instead
        found: String,
        /// Position where the token was expected
        position: usize,
    },

    /// Input ended in the middle of a rule
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput {
        /// What the parser was looking for
        expected: String,
        /// Input length
        position: usize,
    },

    /// Invalid literal value
    #[error("Invalid {literal_type} literal: {value}")]
    InvalidLiteral {
        /// Type of literal that failed to parse
        literal_type: String,
        /// The invalid value that was encountered
        value: String,
        /// Position where the invalid literal was found
        position: usize,
    },

    /// Invalid escape sequence
    #[error("Invalid escape sequence: {sequence}")]
    InvalidEscape {
        /// The invalid escape sequence
        sequence: String,
        /// Position where the escape sequence was found
        position: usize,
    },

    /// Unclosed string literal
    #[error("Unclosed string literal")]
    UnclosedString {
        /// Position where the unclosed string started
        position: usize,
    },

    /// Operand whose kind the operator cannot take
    #[error("Operator '{operator}' cannot take a {operand} operand")]
    InvalidOperand {
        /// Operator symbol
        operator: &'static str,
        /// Kind of the rejected operand
        operand: &'static str,
        /// Position of the operand
        position: usize,
    },

    /// Generic nom error
    #[error("Parse error: {kind:?}")]
    NomError {
        /// Position where the parse error occurred
        position: usize,
        /// The nom error kind
        kind: ErrorKind,
    },
}

impl ParseError {
    /// Byte offset of the error in the rule text
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::ExpectedToken { position, .. }
            | Self::UnexpectedEndOfInput { position, .. }
            | Self::InvalidLiteral { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::UnclosedString { position }
            | Self::InvalidOperand { position, .. }
            | Self::NomError { position, .. } => *position,
        }
    }
}

impl From<ParseError> for HopeError {
    fn from(error: ParseError) -> Self {
        HopeError::parse_error(error.position(), error.to_string())
    }
}

/// Implement nom's ParseError trait
impl<'a> NomParseError<Span<'a>> for ParseError {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        ParseError::NomError {
            position: input.location_offset(),
            kind,
        }
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conversion_keeps_position() {
        let error = ParseError::UnclosedString { position: 7 };
        assert_eq!(error.position(), 7);
        assert_eq!(
            HopeError::from(error),
            HopeError::Parse {
                position: 7,
                message: "Unclosed string literal".to_string()
            }
        );
    }

    #[test]
    fn test_operand_message() {
        let error = ParseError::InvalidOperand {
            operator: ">",
            operand: "StringValue",
            position: 0,
        };
        assert_eq!(
            error.to_string(),
            "Operator '>' cannot take a StringValue operand"
        );
    }
}
