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

//! Error handling strategies
//!
//! Value resolution calls one of three hooks when it cannot produce a value.
//! A hook either raises a typed error or returns `Ok(())`, in which case the
//! caller substitutes the default it supplied for that resolution.

use crate::document::JsonKind;
use crate::error::{HopeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Policy applied at the three evaluation failure points
pub trait ErrorHandlingStrategy: Send + Sync + fmt::Debug {
    /// Nothing (or JSON null) lives at `path`
    fn handle_missing_value(&self, path: &str) -> Result<()>;

    /// The node at `path` is not of the expected kind
    fn handle_type_mismatch(&self, path: &str, expected: JsonKind, actual: JsonKind)
    -> Result<()>;

    /// An invariant was violated or a function precondition failed
    fn handle_illegal_eval(&self, message: &str) -> Result<()>;
}

/// Raises on every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictErrorHandlingStrategy;

impl ErrorHandlingStrategy for StrictErrorHandlingStrategy {
    fn handle_missing_value(&self, path: &str) -> Result<()> {
        Err(HopeError::missing_value(path))
    }

    fn handle_type_mismatch(
        &self,
        path: &str,
        expected: JsonKind,
        actual: JsonKind,
    ) -> Result<()> {
        Err(HopeError::type_mismatch(path, expected, actual))
    }

    fn handle_illegal_eval(&self, message: &str) -> Result<()> {
        Err(HopeError::illegal_evaluation(message))
    }
}

/// Substitutes the caller-supplied default on every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectDefaultErrorHandlingStrategy;

impl ErrorHandlingStrategy for InjectDefaultErrorHandlingStrategy {
    fn handle_missing_value(&self, path: &str) -> Result<()> {
        log::debug!("Missing value at {path}, injecting default");
        Ok(())
    }

    fn handle_type_mismatch(
        &self,
        path: &str,
        expected: JsonKind,
        actual: JsonKind,
    ) -> Result<()> {
        log::debug!("Expected {expected} at {path} but found {actual}, injecting default");
        Ok(())
    }

    fn handle_illegal_eval(&self, message: &str) -> Result<()> {
        log::debug!("Illegal evaluation ({message}), injecting default");
        Ok(())
    }
}

/// Built-in strategies, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStrategyKind {
    /// [`StrictErrorHandlingStrategy`]
    #[default]
    Strict,
    /// [`InjectDefaultErrorHandlingStrategy`]
    InjectDefault,
}

impl ErrorStrategyKind {
    /// Instantiate the strategy
    pub fn create(self) -> Arc<dyn ErrorHandlingStrategy> {
        match self {
            Self::Strict => Arc::new(StrictErrorHandlingStrategy),
            Self::InjectDefault => Arc::new(InjectDefaultErrorHandlingStrategy),
        }
    }
}

impl FromStr for ErrorStrategyKind {
    type Err = HopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(Self::Strict),
            "inject_default" | "inject" => Ok(Self::InjectDefault),
            other => Err(HopeError::Config {
                message: format!("unknown error strategy '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ErrorStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::InjectDefault => f.write_str("inject_default"),
        }
    }
}
