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

//! Error types for rule compilation and evaluation
//!
//! Three families share one enum:
//! - compilation/binding errors (unknown functions, overload problems, bad literals),
//! - evaluation-time data errors (only ever raised by the strict strategy),
//! - configuration errors reported while registering functions.

use crate::document::JsonKind;
use thiserror::Error;

/// Result type alias for rule operations
pub type Result<T> = std::result::Result<T, HopeError>;

/// Comprehensive error type for the rule engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HopeError {
    /// An address resolved to nothing (or to JSON `null`)
    #[error("Missing value at path: {path}")]
    MissingValue {
        /// Address string that was looked up
        path: String,
    },

    /// An address resolved to a node of the wrong kind
    #[error("Type mismatch at path {path}. Expected: {expected} Actual: {actual}")]
    TypeMismatch {
        /// Address string that was looked up
        path: String,
        /// Kind the caller asked for
        expected: JsonKind,
        /// Kind found in the document
        actual: JsonKind,
    },

    /// Internal invariant violated, or a function precondition failed
    #[error("Error during evaluation: {message}")]
    IllegalEvaluation {
        /// Human-readable diagnostic
        message: String,
    },

    /// Call site names a function nobody registered
    #[error("Unknown function '{name}'")]
    UnknownFunction {
        /// Function name at the call site
        name: String,
    },

    /// No overload accepts the number of arguments supplied
    #[error("No matching function named {name} that accepts {arity} params")]
    NoMatchingOverload {
        /// Function name at the call site
        name: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// More than one overload accepts the same argument count
    #[error("Function {name} has more than one overload accepting {arity} params")]
    AmbiguousOverload {
        /// Function name
        name: String,
        /// Offending arity
        arity: usize,
    },

    /// A function with this name is already registered
    #[error("Function '{name}' is already registered")]
    DuplicateFunction {
        /// Function name
        name: String,
    },

    /// A function declaration cannot be registered
    #[error("Invalid declaration for function '{name}': {message}")]
    InvalidDeclaration {
        /// Function name
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// An AST node was built with the wrong number of children
    #[error("{node} expects {expected} operands, got {actual}")]
    InvalidArity {
        /// Node kind being constructed
        node: &'static str,
        /// Expected operand count description
        expected: String,
        /// Operands supplied
        actual: usize,
    },

    /// A path or pointer literal could not be compiled
    #[error("Invalid address '{address}': {message}")]
    InvalidAddress {
        /// The raw address text
        address: String,
        /// Why it was rejected
        message: String,
    },

    /// Expression text could not be parsed
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Byte offset in the expression text
        position: usize,
        /// Human-readable message
        message: String,
    },

    /// Engine configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable message
        message: String,
    },
}

impl HopeError {
    /// Create a missing value error
    pub fn missing_value(path: impl Into<String>) -> Self {
        Self::MissingValue { path: path.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(path: impl Into<String>, expected: JsonKind, actual: JsonKind) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected,
            actual,
        }
    }

    /// Create an illegal evaluation error
    pub fn illegal_evaluation(message: impl Into<String>) -> Self {
        Self::IllegalEvaluation {
            message: message.into(),
        }
    }

    /// Create an invalid declaration error
    pub fn invalid_declaration(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Errors that are routed through the error handling strategy
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::MissingValue { .. } | Self::TypeMismatch { .. } | Self::IllegalEvaluation { .. }
        )
    }

    /// Errors raised while compiling, binding or registering, never deferred to evaluation
    pub fn is_configuration_error(&self) -> bool {
        !self.is_data_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_messages() {
        assert_eq!(
            HopeError::missing_value("$.a").to_string(),
            "Missing value at path: $.a"
        );
        assert_eq!(
            HopeError::type_mismatch("/a", JsonKind::Number, JsonKind::String).to_string(),
            "Type mismatch at path /a. Expected: NUMBER Actual: STRING"
        );
        assert_eq!(
            HopeError::UnknownFunction {
                name: "math.nope".to_string()
            }
            .to_string(),
            "Unknown function 'math.nope'"
        );
    }

    #[test]
    fn test_classification() {
        assert!(HopeError::illegal_evaluation("boom").is_data_error());
        assert!(
            HopeError::DuplicateFunction {
                name: "x".to_string()
            }
            .is_configuration_error()
        );
        assert!(HopeError::parse_error(3, "bad").is_configuration_error());
    }
}
