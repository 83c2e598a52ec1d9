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

//! Token stream consumed by the parser

use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{Spanned, Token};

/// Token stream with lookahead capability
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Spanned<Token>>,
    position: usize,
    input_len: usize,
}

impl TokenStream {
    /// Create a new token stream over the tokens of an input of `input_len` bytes
    pub fn new(tokens: Vec<Spanned<Token>>, input_len: usize) -> Self {
        Self {
            tokens,
            position: 0,
            input_len,
        }
    }

    /// Peek at the current token without consuming
    pub fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.position)
    }

    /// Whether the current token equals `token`
    pub fn at(&self, token: &Token) -> bool {
        self.peek().is_some_and(|t| &t.value == token)
    }

    /// Consume and return the current token
    pub fn next(&mut self) -> Option<Spanned<Token>> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Check if we're at the end of the stream
    pub fn is_eof(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Byte offset of the current token, or the input length at the end
    pub fn offset(&self) -> usize {
        self.peek().map_or(self.input_len, |t| t.start)
    }

    /// Consume the current token if it equals `token`
    pub fn consume(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume a token that must equal `expected`
    pub fn expect(&mut self, expected: &Token) -> ParseResult<Spanned<Token>> {
        match self.next() {
            Some(token) if &token.value == expected => Ok(token),
            Some(token) => Err(ParseError::ExpectedToken {
                expected: format!("'{expected}'"),
                found: token.value.to_string(),
                position: token.start,
            }),
            None => Err(self.end_of_input(format!("'{expected}'"))),
        }
    }

    /// Error for running out of tokens
    pub fn end_of_input(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedEndOfInput {
            expected: expected.into(),
            position: self.input_len,
        }
    }
}
