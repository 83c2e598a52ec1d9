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

//! Evaluation context
//!
//! A context lives for exactly one `evaluate` call (or one batch of rules
//! against one document) and is never shared across threads. It owns the
//! resolution cache: the first lookup of an address string walks the
//! document, later lookups of the same string are answered from the cache.
//! Absent locations are cached too.

use crate::document::{Address, JsonKind};
use crate::error::Result;
use crate::strategy::ErrorHandlingStrategy;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

/// Resolution cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that walked the document
    pub misses: usize,
}

/// Per-call mutable evaluation state
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    document: &'a JsonValue,
    strategy: &'a dyn ErrorHandlingStrategy,
    cache: FxHashMap<String, Option<&'a JsonValue>>,
    stats: CacheStats,
}

impl<'a> EvaluationContext<'a> {
    /// Fresh context over a document
    pub fn new(document: &'a JsonValue, strategy: &'a dyn ErrorHandlingStrategy) -> Self {
        Self {
            document,
            strategy,
            cache: FxHashMap::default(),
            stats: CacheStats::default(),
        }
    }

    /// Document root
    pub fn document(&self) -> &'a JsonValue {
        self.document
    }

    /// Active strategy
    pub fn strategy(&self) -> &'a dyn ErrorHandlingStrategy {
        self.strategy
    }

    /// Resolve an address through the cache
    pub fn lookup(&mut self, address: &dyn Address) -> Option<&'a JsonValue> {
        if let Some(cached) = self.cache.get(address.as_str()) {
            self.stats.hits += 1;
            return *cached;
        }
        let node = address.locate(self.document);
        log::trace!(
            "Resolved {} to {}",
            address.as_str(),
            JsonKind::of_option(node)
        );
        self.stats.misses += 1;
        self.cache.insert(address.as_str().to_string(), node);
        node
    }

    /// Cache counters so far
    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// Apply the missing-value hook, yielding `default` if it recovers
    pub fn missing_value<T>(&self, path: &str, default: T) -> Result<T> {
        self.strategy.handle_missing_value(path).map(|()| default)
    }

    /// Apply the type-mismatch hook, yielding `default` if it recovers
    pub fn type_mismatch<T>(
        &self,
        path: &str,
        expected: JsonKind,
        actual: JsonKind,
        default: T,
    ) -> Result<T> {
        self.strategy
            .handle_type_mismatch(path, expected, actual)
            .map(|()| default)
    }

    /// Apply the illegal-evaluation hook, yielding `default` if it recovers
    pub fn illegal_evaluation<T>(&self, message: &str, default: T) -> Result<T> {
        self.strategy.handle_illegal_eval(message).map(|()| default)
    }
}
