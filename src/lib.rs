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

//! hope: a boolean rule language evaluated against JSON documents
//!
//! Rules compare values pulled out of a document by JSON path (`'$.a.b'`) or
//! JSON pointer (`'/a/b'`), combine them with logical operators and call
//! functions from an extensible registry.
//!
//! ```rust
//! use hope::prelude::*;
//! use serde_json::json;
//!
//! let engine = HopeLangEngine::builder().build()?;
//! let document = json!({"name": "hope", "tags": ["a", "b"], "count": 93});
//!
//! assert!(engine.evaluate_expression(
//!     "str.upper('$.name') == 'HOPE' && arr.in('b', '$.tags') == true && '/count' >= 90",
//!     &document,
//! )?);
//! # Ok::<(), hope::HopeError>(())
//! ```

// Re-export workspace crates
pub use hope_core;
pub use hope_lang;

// Re-export main types
pub use hope_core::{
    Evaluatable, Evaluator, FunctionDescriptor, FunctionLibrary, FunctionRegistry, HopeError,
    HopeFunction, Result, Value,
};
pub use hope_lang::{EngineConfig, HopeLangEngine, HopeLangEngineBuilder, parse_rule};

/// Common imports for embedding the engine and writing custom functions
pub mod prelude {
    pub use hope_core::context::EvaluationContext;
    pub use hope_core::converters::{
        boolean_value, explode_array, flatten_array, numeric_value, object_value, string_value,
    };
    pub use hope_core::registry::fixed_args;
    pub use hope_core::{
        Datum, ErrorHandlingStrategy, ErrorStrategyKind, Evaluatable, FunctionDescriptor,
        FunctionLibrary, FunctionRegistry, HopeError, HopeFunction,
        InjectDefaultErrorHandlingStrategy, Result, StrictErrorHandlingStrategy, Value,
    };
    pub use hope_lang::{EngineConfig, HopeLangEngine};
}
