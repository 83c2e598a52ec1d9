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

//! Function registry and overload resolution
//!
//! Functions are registered by name with one or more overloads. A name holds
//! either one variadic overload or any number of fixed-arity overloads with
//! distinct arities. Call sites are bound once, while the rule is built:
//! the variadic overload wins whatever the argument count, otherwise the
//! overload whose arity equals the argument count is selected.
//!
//! Discovery loads the standard library plus caller-supplied libraries at most
//! once per registry, behind a one-time latch.

mod function;
mod signature;

pub use function::{
    FunctionDescriptor, FunctionFactory, FunctionLibrary, FunctionOverload, HopeFunction,
    fixed_args,
};
pub use signature::{FunctionSignature, ParameterType};

use crate::ast::{FunctionValue, Value};
use crate::error::{HopeError, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

/// A registered function and its overloads
#[derive(Debug)]
pub struct RegisteredFunction {
    name: String,
    overloads: Vec<FunctionOverload>,
}

impl RegisteredFunction {
    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All overloads
    pub fn overloads(&self) -> &[FunctionOverload] {
        &self.overloads
    }

    /// Select the overload for a call with `arity` arguments
    pub fn resolve(&self, arity: usize) -> Result<&FunctionOverload> {
        if let Some(variadic) = self.overloads.iter().find(|o| o.signature().is_variadic()) {
            return Ok(variadic);
        }
        let mut matching = self
            .overloads
            .iter()
            .filter(|o| o.signature().arity() == arity);
        match (matching.next(), matching.next()) {
            (Some(overload), None) => Ok(overload),
            (None, _) => Err(HopeError::NoMatchingOverload {
                name: self.name.clone(),
                arity,
            }),
            (Some(_), Some(_)) => Err(HopeError::AmbiguousOverload {
                name: self.name.clone(),
                arity,
            }),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    /// Registered names
    pub functions: usize,
    /// Overloads across all names
    pub overloads: usize,
    /// Names with a variadic overload
    pub variadic: usize,
    /// Libraries loaded by discovery
    pub libraries: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registry: {} functions ({} overloads, {} variadic) from {} libraries",
            self.functions, self.overloads, self.variadic, self.libraries
        )
    }
}

/// Thread-safe registry of callable functions
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: RwLock<FxHashMap<String, Arc<RegisteredFunction>>>,
    discovered: OnceCell<Vec<String>>,
}

impl FunctionRegistry {
    /// Empty registry; call [`Self::discover`] to load libraries
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard library loaded
    pub fn with_standard_library() -> Result<Self> {
        let registry = Self::new();
        registry.discover(&[])?;
        Ok(registry)
    }

    /// Register one function
    pub fn register(&self, function: FunctionDescriptor) -> Result<()> {
        self.register_all(vec![function])
    }

    /// Register a batch of functions. Nothing is registered unless every
    /// declaration in the batch is valid.
    pub fn register_all(&self, functions: Vec<FunctionDescriptor>) -> Result<()> {
        let mut map = self.functions.write();
        let mut batch = FxHashSet::default();
        for function in &functions {
            validate(function)?;
            if map.contains_key(function.name()) || !batch.insert(function.name()) {
                return Err(HopeError::DuplicateFunction {
                    name: function.name().to_string(),
                });
            }
        }
        for function in functions {
            let (name, overloads) = function.into_parts();
            log::debug!(
                "Registering function '{}' with {} overload(s)",
                name,
                overloads.len()
            );
            map.insert(
                name.clone(),
                Arc::new(RegisteredFunction { name, overloads }),
            );
        }
        Ok(())
    }

    /// Load the standard library and the given libraries.
    ///
    /// Runs at most once; later calls (including concurrent ones) return
    /// without registering anything. A failed discovery can be retried.
    pub fn discover(&self, libraries: &[FunctionLibrary]) -> Result<()> {
        self.discovered.get_or_try_init(|| {
            let standard = crate::functions::standard_library();
            let all: Vec<&FunctionLibrary> =
                std::iter::once(&standard).chain(libraries).collect();
            let declarations = all
                .iter()
                .flat_map(|library| library.functions().iter().cloned())
                .collect();
            self.register_all(declarations)?;
            let names: Vec<String> = all.iter().map(|l| l.name().to_string()).collect();
            log::debug!("Function discovery loaded libraries: {}", names.join(", "));
            Ok::<_, HopeError>(names)
        })?;
        Ok(())
    }

    /// Libraries loaded by discovery, empty before discovery ran
    pub fn discovered_libraries(&self) -> &[String] {
        self.discovered.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a function by name
    pub fn find(&self, name: &str) -> Option<Arc<RegisteredFunction>> {
        self.functions.read().get(name).cloned()
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Select the overload for a call site
    pub fn resolve_overload(&self, name: &str, arity: usize) -> Result<FunctionOverload> {
        let function = self.find(name).ok_or_else(|| HopeError::UnknownFunction {
            name: name.to_string(),
        })?;
        function.resolve(arity).cloned()
    }

    /// Bind a call site to its overload
    pub fn bind(&self, name: &str, parameters: Vec<Value>) -> Result<FunctionValue> {
        let overload = self.resolve_overload(name, parameters.len())?;
        Ok(FunctionValue::new(name, parameters, overload))
    }

    /// Current statistics
    pub fn stats(&self) -> RegistryStats {
        let map = self.functions.read();
        RegistryStats {
            functions: map.len(),
            overloads: map.values().map(|f| f.overloads.len()).sum(),
            variadic: map
                .values()
                .filter(|f| f.overloads.iter().any(|o| o.signature().is_variadic()))
                .count(),
            libraries: self.discovered_libraries().len(),
        }
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn validate(function: &FunctionDescriptor) -> Result<()> {
    let name = function.name();
    let invalid = |message: &str| Err(HopeError::invalid_declaration(name, message));
    if !valid_name(name) {
        return invalid("name must be a dotted identifier");
    }
    let overloads = function.overloads();
    if overloads.is_empty() {
        return invalid("at least one overload is required");
    }
    for overload in overloads {
        let parameters = overload.signature().parameters();
        if let Some(native) = parameters.iter().find_map(|p| match p {
            ParameterType::Native(native) => Some(native),
            _ => None,
        }) {
            return Err(HopeError::invalid_declaration(
                name,
                format!("parameter of native type '{native}'; only value parameters are allowed"),
            ));
        }
        if parameters.contains(&ParameterType::ValueArray) && !overload.signature().is_variadic() {
            return invalid("a value-array parameter must be the only parameter");
        }
    }
    let variadic = overloads
        .iter()
        .filter(|o| o.signature().is_variadic())
        .count();
    if variadic > 1 {
        return invalid("more than one variadic overload");
    }
    if variadic == 1 && overloads.len() > 1 {
        return invalid("a variadic overload cannot be combined with other overloads");
    }
    let mut arities = FxHashSet::default();
    for overload in overloads {
        let arity = overload.signature().arity();
        if !arities.insert(arity) {
            return Err(HopeError::AmbiguousOverload {
                name: name.to_string(),
                arity,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use pretty_assertions::assert_eq;

    struct Constant(f64);

    impl HopeFunction for Constant {
        fn apply(&self, _context: &mut EvaluationContext<'_>) -> Result<Value> {
            Ok(Value::number(self.0))
        }
    }

    fn one(_: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Ok(Box::new(Constant(1.0)))
    }

    fn two(_: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        Ok(Box::new(Constant(2.0)))
    }

    #[test]
    fn test_resolves_by_arity() {
        let registry = FunctionRegistry::new();
        registry
            .register(FunctionDescriptor::new("t.pick").overload(1, one).overload(2, two))
            .unwrap();

        let call = registry.bind("t.pick", vec![Value::number(0.0)]).unwrap();
        assert_eq!(call.overload().signature().arity(), 1);
        let call = registry
            .bind("t.pick", vec![Value::number(0.0), Value::number(0.0)])
            .unwrap();
        assert_eq!(call.overload().signature().arity(), 2);

        assert_eq!(
            registry.bind("t.pick", vec![]).unwrap_err(),
            HopeError::NoMatchingOverload {
                name: "t.pick".to_string(),
                arity: 0
            }
        );
        assert_eq!(
            registry.bind("t.nope", vec![]).unwrap_err(),
            HopeError::UnknownFunction {
                name: "t.nope".to_string()
            }
        );
    }

    #[test]
    fn test_variadic_wins_regardless_of_arity() {
        let registry = FunctionRegistry::new();
        registry
            .register(FunctionDescriptor::new("t.sum").variadic(one))
            .unwrap();
        for n in 0..5 {
            let args = vec![Value::number(1.0); n];
            let call = registry.bind("t.sum", args).unwrap();
            assert!(call.overload().signature().is_variadic());
        }
    }

    #[test]
    fn test_registration_errors() {
        let registry = FunctionRegistry::new();
        registry
            .register(FunctionDescriptor::new("t.once").overload(0, one))
            .unwrap();
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.once").overload(1, one)),
            Err(HopeError::DuplicateFunction { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.mixed").variadic(one).overload(2, two)),
            Err(HopeError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.twice").variadic(one).variadic(two)),
            Err(HopeError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.same").overload(2, one).overload(2, two)),
            Err(HopeError::AmbiguousOverload { arity: 2, .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.native").overload_with(
                FunctionSignature::new(vec![ParameterType::Value, ParameterType::Native("i32")]),
                one
            )),
            Err(HopeError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("t.empty")),
            Err(HopeError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.register(FunctionDescriptor::new("1bad").overload(0, one)),
            Err(HopeError::InvalidDeclaration { .. })
        ));
        assert_eq!(registry.function_names(), vec!["t.once".to_string()]);
    }

    #[test]
    fn test_batch_is_atomic() {
        let registry = FunctionRegistry::new();
        let result = registry.register_all(vec![
            FunctionDescriptor::new("t.a").overload(0, one),
            FunctionDescriptor::new("t.a").overload(1, one),
        ]);
        assert!(result.is_err());
        assert!(!registry.contains("t.a"));
    }

    #[test]
    fn test_discovery_runs_once() {
        let registry = FunctionRegistry::new();
        let extra = FunctionLibrary::new("custom").with(FunctionDescriptor::new("ss.blah").overload(0, one));
        registry.discover(std::slice::from_ref(&extra)).unwrap();
        registry.discover(&[extra]).unwrap();
        assert!(registry.contains("ss.blah"));
        assert!(registry.contains("math.add"));
        assert_eq!(
            registry.discovered_libraries(),
            &["hope.stdlib".to_string(), "custom".to_string()]
        );
        assert_eq!(registry.stats().libraries, 2);
    }

    #[test]
    fn test_concurrent_discovery() {
        let registry = FunctionRegistry::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| registry.discover(&[]).unwrap());
            }
        });
        assert_eq!(registry.discovered_libraries().len(), 1);
        assert!(registry.stats().functions > 20);
    }
}
