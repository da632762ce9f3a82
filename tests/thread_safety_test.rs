//! Tests for sharing registries and chains across threads.

use pinpoint::{
    ConstraintKind, ConverterTable, DefaultPreprocessingChain, ErrorCode, FieldRules,
    ModifierRegistry, PreprocessingChain, PreprocessingConfig, PreprocessingContext, RuleSet,
    TrimModifier,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

const REQUIRED: ErrorCode = ErrorCode::new(1000, 422);

fn shared_chain() -> Arc<PreprocessingChain<Value>> {
    Arc::new(DefaultPreprocessingChain::new(
        ModifierRegistry::with_defaults(),
        RuleSet::new()
            .field("name", FieldRules::new().not_null())
            .field("age", FieldRules::new().min(0.0)),
        ConverterTable::new().with_code(ConstraintKind::NOT_NULL, REQUIRED),
    ))
}

#[test]
fn test_concurrent_runs_on_shared_chain() {
    let chain = shared_chain();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                let mut value = if i % 2 == 0 {
                    json!({"name": format!("User{}", i), "age": 20 + i})
                } else {
                    json!({"name": null, "age": -i})
                };

                let mut context = PreprocessingContext::new(&*chain, PreprocessingConfig::new());
                let result = context.process(&mut value).unwrap();
                (i, result.into_result().map_err(|errors| errors.len()))
            })
        })
        .collect();

    for handle in handles {
        let (i, outcome) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(outcome, Ok(true));
        } else {
            assert_eq!(outcome, Err(2));
        }
    }
}

#[test]
fn test_concurrent_registry_access() {
    let registry = ModifierRegistry::new();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                // Only one registration wins; every thread sees the result.
                let _ = registry.register(TrimModifier);
                assert!(registry.contains(TrimModifier::TAG));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.tags(), vec![TrimModifier::TAG]);
}

#[test]
fn test_process_all_matches_sequential_runs() {
    let chain = shared_chain();
    let mut values: Vec<Value> = (0..50)
        .map(|i| {
            if i % 3 == 0 {
                json!({"age": i})
            } else {
                json!({"name": format!("User{}", i), "age": i})
            }
        })
        .collect();

    let results = chain.process_all(&mut values, PreprocessingConfig::new);

    assert_eq!(results.len(), 50);
    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        if i % 3 == 0 {
            let errors = result.into_result().unwrap_err();
            assert_eq!(errors.at_location("/name").len(), 1);
            assert_eq!(errors.with_code(REQUIRED).len(), 1);
        } else {
            assert!(result.is_success());
        }
    }
}

#[test]
fn test_chain_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PreprocessingChain<Value>>();
    assert_send_sync::<ModifierRegistry>();
    assert_send_sync::<pinpoint::ApiErrors>();
}
