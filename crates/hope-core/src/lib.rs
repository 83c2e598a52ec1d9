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

//! Core of the hope rule language
//!
//! This crate holds everything except the text grammar: the typed AST, the
//! converters that resolve AST leaves against a JSON document, the evaluator,
//! the function registry with arity-based overload resolution, the pluggable
//! error handling strategies and the standard function library.
//! # Usage
//! ```rust
//! use hope_core::{BinaryOperator, Evaluatable, Evaluator, Value};
//! use serde_json::json;
//!
//! let rule = Evaluatable::binary(
//!     BinaryOperator::Greater,
//!     Value::path("$.count").unwrap().into_numeric().unwrap(),
//!     Value::number(40.0),
//! );
//! let evaluator = Evaluator::default();
//! assert!(evaluator.evaluate(&rule, &json!({"count": 93})).unwrap());
//! ```

// Core modules
pub mod ast;
pub mod context;
pub mod converters;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod registry;
pub mod strategy;

// Main exports
pub use ast::{BinaryOperator, Datum, Evaluatable, FunctionValue, Value};
pub use context::{CacheStats, EvaluationContext};
pub use document::{Address, JsonKind, JsonPath, JsonPointer};
pub use error::{HopeError, Result};
pub use evaluator::{Evaluator, evaluate_rule};
pub use functions::{STANDARD_LIBRARY, standard_library};
pub use registry::{
    FunctionDescriptor, FunctionLibrary, FunctionRegistry, FunctionSignature, HopeFunction,
};
pub use strategy::{
    ErrorHandlingStrategy, ErrorStrategyKind, InjectDefaultErrorHandlingStrategy,
    StrictErrorHandlingStrategy,
};
