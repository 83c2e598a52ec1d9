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

//! Top level engine: parse once, evaluate many times

use crate::config::EngineConfig;
use crate::parser::parse_rule;
use dashmap::DashMap;
use hope_core::{
    ErrorHandlingStrategy, Evaluatable, Evaluator, FunctionDescriptor, FunctionLibrary,
    FunctionRegistry, Result,
};
use serde_json::Value as JsonValue;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Parses and evaluates hope rules.
///
/// Creation runs function discovery and is comparatively expensive; build one
/// engine and share it. All methods take `&self` and the engine is `Send + Sync`.
///
/// # Examples
///
/// ```rust
/// use hope_lang::HopeLangEngine;
/// use serde_json::json;
///
/// let engine = HopeLangEngine::builder().build().unwrap();
/// let document = json!({"count": 93, "flags": {"vip": true}});
///
/// assert!(engine
///     .evaluate_expression("'$.count' > 40 && '/flags/vip' == true", &document)
///     .unwrap());
/// ```
///
/// Parsed rules can be kept and evaluated against many documents:
///
/// ```rust
/// use hope_lang::HopeLangEngine;
/// use serde_json::json;
///
/// let engine = HopeLangEngine::builder().build().unwrap();
/// let rule = engine.parse("math.add('$.a', '$.b') == 5").unwrap();
///
/// assert!(engine.evaluate(&rule, &json!({"a": 2, "b": 3})).unwrap());
/// assert!(!engine.evaluate(&rule, &json!({"a": 2, "b": 2})).unwrap());
/// ```
pub struct HopeLangEngine {
    registry: Arc<FunctionRegistry>,
    evaluator: Evaluator,
    config: EngineConfig,
    rule_cache: DashMap<String, Arc<Evaluatable>>,
}

impl HopeLangEngine {
    /// Create a builder for the engine
    pub fn builder() -> HopeLangEngineBuilder {
        HopeLangEngineBuilder::default()
    }

    /// Parse a rule. The result can be evaluated any number of times, from
    /// any number of threads.
    ///
    /// With `cache_compiled_rules` enabled, identical rule text returns the
    /// same shared tree.
    ///
    /// # Errors
    ///
    /// Returns [`hope_core::HopeError::Parse`] for syntax errors, or the
    /// registry's binding error (unknown function, no matching overload).
    pub fn parse(&self, expression: &str) -> Result<Arc<Evaluatable>> {
        if !self.config.cache_compiled_rules {
            return parse_rule(expression, &self.registry).map(Arc::new);
        }
        if let Some(rule) = self.rule_cache.get(expression) {
            log::debug!("Rule cache hit for '{expression}'");
            return Ok(Arc::clone(rule.value()));
        }

        let rule = Arc::new(parse_rule(expression, &self.registry)?);
        log::debug!("Compiled rule '{expression}' as {rule}");
        if self.rule_cache.len() >= self.config.max_cached_rules {
            log::debug!(
                "Rule cache full ({} entries), clearing",
                self.rule_cache.len()
            );
            self.rule_cache.clear();
        }
        self.rule_cache
            .insert(expression.to_string(), Arc::clone(&rule));
        Ok(rule)
    }

    /// Evaluate a parsed rule against a document
    pub fn evaluate(&self, rule: &Evaluatable, document: &JsonValue) -> Result<bool> {
        self.evaluator.evaluate(rule, document)
    }

    /// Parse (or fetch from the cache) and evaluate a rule in one step
    pub fn evaluate_expression(&self, expression: &str, document: &JsonValue) -> Result<bool> {
        let rule = self.parse(expression)?;
        self.evaluate(&rule, document)
    }

    /// Evaluate every rule against one document, in order.
    ///
    /// All rules share one evaluation context, so each document location is
    /// resolved once for the whole batch.
    pub fn evaluate_all<R: Borrow<Evaluatable>>(
        &self,
        rules: &[R],
        document: &JsonValue,
    ) -> Result<Vec<bool>> {
        self.evaluator.evaluate_all(rules, document)
    }

    /// Index of the first rule that matches the document, if any
    pub fn evaluate_first<R: Borrow<Evaluatable>>(
        &self,
        rules: &[R],
        document: &JsonValue,
    ) -> Result<Option<usize>> {
        self.evaluator.evaluate_first(rules, document)
    }

    /// Function registry used to bind calls
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Active error handling strategy
    pub fn strategy(&self) -> &Arc<dyn ErrorHandlingStrategy> {
        self.evaluator.strategy()
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of rules currently in the compiled rule cache
    pub fn cached_rules(&self) -> usize {
        self.rule_cache.len()
    }

    /// Drop every cached rule
    pub fn clear_rule_cache(&self) {
        self.rule_cache.clear();
    }
}

impl fmt::Debug for HopeLangEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HopeLangEngine")
            .field("registry", &self.registry.stats())
            .field("strategy", self.evaluator.strategy())
            .field("config", &self.config)
            .field("cached_rules", &self.rule_cache.len())
            .finish()
    }
}

/// Builder for [`HopeLangEngine`]
#[derive(Default)]
pub struct HopeLangEngineBuilder {
    config: EngineConfig,
    strategy: Option<Arc<dyn ErrorHandlingStrategy>>,
    libraries: Vec<FunctionLibrary>,
    functions: Vec<FunctionDescriptor>,
}

impl HopeLangEngineBuilder {
    /// Use a configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the error handling strategy. Takes precedence over the
    /// configured strategy kind and accepts custom implementations.
    pub fn error_handling_strategy(mut self, strategy: Arc<dyn ErrorHandlingStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Add a library loaded by discovery alongside the standard library
    pub fn add_library(mut self, library: FunctionLibrary) -> Self {
        self.libraries.push(library);
        self
    }

    /// Register a single function after discovery
    pub fn register_function(mut self, function: FunctionDescriptor) -> Self {
        self.functions.push(function);
        self
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Configuration errors from the registry: duplicate names, invalid
    /// declarations or ambiguous overloads.
    pub fn build(self) -> Result<HopeLangEngine> {
        let registry = FunctionRegistry::new();
        registry.discover(&self.libraries)?;
        registry.register_all(self.functions)?;

        let strategy = self
            .strategy
            .unwrap_or_else(|| self.config.error_strategy.create());
        log::debug!(
            "Built engine with {:?} strategy; {}",
            strategy,
            registry.stats()
        );

        Ok(HopeLangEngine {
            registry: Arc::new(registry),
            evaluator: Evaluator::new(strategy),
            config: self.config,
            rule_cache: DashMap::new(),
        })
    }
}
