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

//! Function implementation boundary

use super::signature::FunctionSignature;
use crate::ast::Value;
use crate::context::EvaluationContext;
use crate::error::{HopeError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A function instance bound to its argument expressions.
///
/// Implementations resolve their own arguments through
/// [`crate::converters`]; they never receive pre-resolved primitives.
pub trait HopeFunction {
    /// Produce one value against the current context
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value>;
}

/// Builds a function instance from unresolved argument expressions
pub type FunctionFactory =
    Arc<dyn for<'a> Fn(&'a [Value]) -> Result<Box<dyn HopeFunction + 'a>> + Send + Sync>;

/// One callable shape of a registered function
#[derive(Clone)]
pub struct FunctionOverload {
    signature: FunctionSignature,
    factory: FunctionFactory,
}

impl FunctionOverload {
    /// Pair a signature with its factory
    pub fn new(signature: FunctionSignature, factory: FunctionFactory) -> Self {
        Self { signature, factory }
    }

    /// Declared shape
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Construct a function instance over the given arguments
    pub fn instantiate<'a>(&self, arguments: &'a [Value]) -> Result<Box<dyn HopeFunction + 'a>> {
        (self.factory)(arguments)
    }
}

impl fmt::Debug for FunctionOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionOverload")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// Overloads are identified by shape; a name never carries two overloads of the same shape.
impl PartialEq for FunctionOverload {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
    }
}

impl Eq for FunctionOverload {}

impl Hash for FunctionOverload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature.hash(state);
    }
}

/// A function declaration: a name plus its overloads
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    name: String,
    overloads: Vec<FunctionOverload>,
}

impl FunctionDescriptor {
    /// Start a declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Add a fixed-arity overload
    pub fn overload<F>(self, arity: usize, factory: F) -> Self
    where
        F: for<'a> Fn(&'a [Value]) -> Result<Box<dyn HopeFunction + 'a>> + Send + Sync + 'static,
    {
        self.overload_with(FunctionSignature::fixed(arity), factory)
    }

    /// Add the variadic overload
    pub fn variadic<F>(self, factory: F) -> Self
    where
        F: for<'a> Fn(&'a [Value]) -> Result<Box<dyn HopeFunction + 'a>> + Send + Sync + 'static,
    {
        self.overload_with(FunctionSignature::variadic(), factory)
    }

    /// Add an overload with an explicit signature
    pub fn overload_with<F>(mut self, signature: FunctionSignature, factory: F) -> Self
    where
        F: for<'a> Fn(&'a [Value]) -> Result<Box<dyn HopeFunction + 'a>> + Send + Sync + 'static,
    {
        self.overloads
            .push(FunctionOverload::new(signature, Arc::new(factory)));
        self
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared overloads
    pub fn overloads(&self) -> &[FunctionOverload] {
        &self.overloads
    }

    pub(crate) fn into_parts(self) -> (String, Vec<FunctionOverload>) {
        (self.name, self.overloads)
    }
}

/// Named collection of function declarations, loaded by discovery
#[derive(Debug, Clone)]
pub struct FunctionLibrary {
    name: String,
    functions: Vec<FunctionDescriptor>,
}

impl FunctionLibrary {
    /// Empty library
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// Add a declaration
    pub fn with(mut self, function: FunctionDescriptor) -> Self {
        self.functions.push(function);
        self
    }

    /// Library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in registration order
    pub fn functions(&self) -> &[FunctionDescriptor] {
        &self.functions
    }
}

/// View a bound argument list as exactly `N` expressions
pub fn fixed_args<'a, const N: usize>(name: &str, arguments: &'a [Value]) -> Result<&'a [Value; N]> {
    arguments
        .try_into()
        .map_err(|_| HopeError::NoMatchingOverload {
            name: name.to_string(),
            arity: arguments.len(),
        })
}
