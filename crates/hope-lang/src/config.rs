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

//! Engine configuration

use hope_core::{ErrorStrategyKind, HopeError, Result};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy applied to missing values, type mismatches and illegal evaluations
    pub error_strategy: ErrorStrategyKind,
    /// Memoise parsed rules by their text
    pub cache_compiled_rules: bool,
    /// Compiled rule cache capacity; the cache is cleared when it fills up
    pub max_cached_rules: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            error_strategy: ErrorStrategyKind::Strict,
            cache_compiled_rules: true,
            max_cached_rules: 1024,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HopeError::Config {
            message: e.to_string(),
        })
    }

    /// Set the error strategy
    pub fn with_error_strategy(mut self, kind: ErrorStrategyKind) -> Self {
        self.error_strategy = kind;
        self
    }

    /// Enable or disable the compiled rule cache
    pub fn with_rule_cache(mut self, enabled: bool) -> Self {
        self.cache_compiled_rules = enabled;
        self
    }

    /// Set the compiled rule cache capacity
    pub fn with_max_cached_rules(mut self, max: usize) -> Self {
        self.max_cached_rules = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.error_strategy, ErrorStrategyKind::Strict);
        assert!(config.cache_compiled_rules);
        assert_eq!(config.max_cached_rules, 1024);
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{"error_strategy": "inject_default", "max_cached_rules": 8}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            EngineConfig::default()
                .with_error_strategy(ErrorStrategyKind::InjectDefault)
                .with_max_cached_rules(8)
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"error_strategy": "lenient"}"#),
            Err(HopeError::Config { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(HopeError::Config { .. })
        ));
    }

    #[test]
    fn test_round_trip_through_serde() {
        let config = EngineConfig::default().with_rule_cache(false);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
