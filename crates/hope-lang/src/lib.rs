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

//! hope rule language front-end
//!
//! This crate provides a nom-based tokenizer and a recursive-descent parser
//! that turn rule text into `hope_core` evaluation trees, binding function
//! calls through a registry, plus the [`HopeLangEngine`] facade that owns the
//! registry, the error strategy and a compiled rule cache.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tokenizer;

pub use config::EngineConfig;
pub use engine::{HopeLangEngine, HopeLangEngineBuilder};
pub use error::{ParseError, ParseResult};
pub use parser::parse_rule;
pub use tokenizer::{Span, Spanned};
