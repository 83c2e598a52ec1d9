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

//! Embedding the engine: custom functions, configuration and shared use

use hope::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::thread;

/// `geo.between(value, low, high)`, inclusive on both ends
struct Between<'a> {
    value: &'a Value,
    low: &'a Value,
    high: &'a Value,
}

impl Between<'_> {
    fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value, low, high] = fixed_args::<3>("geo.between", arguments)?;
        Ok(Box::new(Between { value, low, high }))
    }
}

impl HopeFunction for Between<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let value = numeric_value(context, self.value, 0.0)?;
        let low = numeric_value(context, self.low, 0.0)?;
        let high = numeric_value(context, self.high, 0.0)?;
        Ok(Value::boolean((low..=high).contains(&value)))
    }
}

/// `doc.field(name)` yields the path `$.<name>`
struct Field<'a> {
    name: &'a Value,
}

impl Field<'_> {
    fn create(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [name] = fixed_args::<1>("doc.field", arguments)?;
        Ok(Box::new(Field { name }))
    }
}

impl HopeFunction for Field<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let name = string_value(context, self.name, "")?;
        Value::path(&format!("$.{name}"))
    }
}

fn geo_library() -> FunctionLibrary {
    FunctionLibrary::new("geo")
        .with(FunctionDescriptor::new("geo.between").overload(3, Between::create))
}

fn engine() -> HopeLangEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    HopeLangEngine::builder()
        .add_library(geo_library())
        .register_function(FunctionDescriptor::new("doc.field").overload(1, Field::create))
        .build()
        .expect("engine with custom functions")
}

#[test]
fn custom_functions_take_part_in_rules() {
    let engine = engine();
    let document = json!({"lat": 12.5, "lon": 77.6, "count": 93});

    let rule = "geo.between('$.lat', 10, 15) == true && geo.between('/lon', 70, 80) == true";
    assert!(engine.evaluate_expression(rule, &document).unwrap());
    assert!(
        !engine
            .evaluate_expression("geo.between('$.lat', 13, 15) == true", &document)
            .unwrap()
    );
}

#[test]
fn custom_functions_can_produce_document_paths() {
    let engine = engine();
    let document = json!({"count": 93, "name": "hope"});

    assert!(engine.evaluate_expression("doc.field('count') > 90", &document).unwrap());
    assert!(
        engine
            .evaluate_expression("str.upper(doc.field('name')) == 'HOPE'", &document)
            .unwrap()
    );
}

#[test]
fn custom_functions_respect_arity() {
    let engine = engine();
    let result = engine.parse("geo.between(1, 2) == true");
    assert!(
        matches!(result, Err(HopeError::NoMatchingOverload { .. })),
        "unexpected result {result:?}"
    );
}

#[test]
fn standard_library_is_always_discovered() {
    let engine = engine();
    let expected = [
        "math.add",
        "str.substr",
        "arr.contains_all",
        "utils.hash_m128",
        "geo.between",
        "doc.field",
    ];
    for name in expected {
        assert!(engine.registry().contains(name), "{name} is not registered");
    }
}

#[test]
fn unknown_functions_are_rejected_at_parse_time() {
    let engine = engine();
    let result = engine.parse("geo.nowhere('$.lat') == true");
    assert!(
        matches!(result, Err(HopeError::UnknownFunction { .. })),
        "unexpected result {result:?}"
    );
}

#[test]
fn syntax_errors_carry_positions() {
    let engine = engine();
    match engine.parse("'$.count' > > 3") {
        Err(HopeError::Parse { position, .. }) => assert_eq!(position, 12),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn configuration_loads_from_json() {
    let config = EngineConfig::from_json_str(
        r#"{"error_strategy": "inject_default", "max_cached_rules": 4}"#,
    )
    .unwrap();
    assert_eq!(config.error_strategy, ErrorStrategyKind::InjectDefault);
    assert_eq!(config.max_cached_rules, 4);
    assert!(config.cache_compiled_rules);

    let engine = HopeLangEngine::builder().config(config).build().unwrap();
    assert!(!engine.evaluate_expression("'$.missing' > 3", &json!({})).unwrap());

    assert!(matches!(
        EngineConfig::from_json_str(r#"{"error_strategy": "sometimes"}"#),
        Err(HopeError::Config { .. })
    ));
}

#[test]
fn engine_is_shared_across_threads() {
    let engine = Arc::new(engine());
    let rule = engine
        .parse("math.add('$.a', '$.b') == '$.sum' && geo.between('$.a', 0, 100) == true")
        .unwrap();

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let rule = Arc::clone(&rule);
            thread::spawn(move || {
                let a = f64::from(i) * 10.0;
                let document = json!({"a": a, "b": 1.0, "sum": a + 1.0});
                engine.evaluate(&rule, &document)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("worker thread").unwrap());
    }
}
