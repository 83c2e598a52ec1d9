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

//! Overload signatures

use std::fmt;

/// Declared type of one constructor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// One unresolved sub-expression
    Value,
    /// Any number of unresolved sub-expressions
    ValueArray,
    /// A raw native type; never accepted by the registry
    Native(&'static str),
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::ValueArray => f.write_str("value..."),
            Self::Native(name) => f.write_str(name),
        }
    }
}

/// Shape of one callable overload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    parameters: Vec<ParameterType>,
}

impl FunctionSignature {
    /// Signature from explicit parameter types
    pub fn new(parameters: Vec<ParameterType>) -> Self {
        Self { parameters }
    }

    /// `arity` value parameters
    pub fn fixed(arity: usize) -> Self {
        Self::new(vec![ParameterType::Value; arity])
    }

    /// A single variadic value-array parameter
    pub fn variadic() -> Self {
        Self::new(vec![ParameterType::ValueArray])
    }

    /// Declared parameters
    pub fn parameters(&self) -> &[ParameterType] {
        &self.parameters
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether this is the variadic shape
    pub fn is_variadic(&self) -> bool {
        self.parameters == [ParameterType::ValueArray]
    }

    /// Whether a call with `count` arguments binds to this signature
    pub fn accepts(&self, count: usize) -> bool {
        self.is_variadic() || self.arity() == count
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}
