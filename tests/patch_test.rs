//! Integration tests for patch validation and root envelopes.

use pinpoint::{
    ConfigError, ConstraintKind, ConverterTable, DefaultPreprocessingChain, FieldDescriptor,
    FieldMut, FieldRules, JsonRoot, Modifiable, ModifierRegistry, Patch, Payload,
    PreprocessingChain, PreprocessingConfig, PreprocessingContext, RuleSet, ShapeId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    name: Option<String>,
    email: Option<String>,
    age: Option<u32>,
}

impl Modifiable for Profile {
    fn shape(&self) -> ShapeId {
        ShapeId::new("Profile")
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    fn field_mut(&mut self, _name: &str) -> Option<FieldMut<'_>> {
        None
    }
}

impl Payload for Profile {}

fn rules() -> RuleSet {
    RuleSet::new()
        .field("name", FieldRules::new().not_null())
        .field("email", FieldRules::new().not_null())
        .field("age", FieldRules::new().range(0.0, 150.0))
}

fn chain<T>() -> PreprocessingChain<T>
where
    T: Modifiable + Payload + Serialize + 'static,
{
    DefaultPreprocessingChain::new(ModifierRegistry::new(), rules(), ConverterTable::new())
}

fn locations(errors: &pinpoint::ApiErrors) -> Vec<&str> {
    errors.errors().iter().filter_map(|e| e.location()).collect()
}

#[test]
fn test_patch_reports_only_set_properties() {
    let chain = chain::<Patch<Profile>>();
    let mut patch: Patch<Profile> =
        Patch::from_json(json!({"name": null, "age": 200})).unwrap();

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    let errors = context.process(&mut patch).unwrap().into_result().unwrap_err();

    assert_eq!(locations(&errors), vec!["/name", "/age"]);
}

#[test]
fn test_patch_with_nothing_set_is_valid() {
    let chain = chain::<Patch<Profile>>();
    let mut patch: Patch<Profile> = Patch::from_json(json!({})).unwrap();

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    assert!(context.process(&mut patch).unwrap().is_success());
}

#[test]
fn test_without_patch_mode_all_properties_are_checked() {
    let chain = chain::<Patch<Profile>>();
    let mut patch: Patch<Profile> = Patch::from_json(json!({"name": "Ada"})).unwrap();

    let mut context = PreprocessingContext::new(&chain, PreprocessingConfig::new());
    let errors = context.process(&mut patch).unwrap().into_result().unwrap_err();
    assert_eq!(locations(&errors), vec!["/email"]);
}

#[test]
fn test_patch_mode_requires_patch_object() {
    let chain = chain::<Profile>();
    let mut profile = Profile {
        name: None,
        email: None,
        age: None,
    };

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    let err = context.process(&mut profile).unwrap_err();
    assert_eq!(err.as_config(), Some(&ConfigError::NotAPatchObject));
}

#[test]
fn test_manually_marked_properties() {
    let chain = chain::<Patch<Profile>>();
    let profile = Profile {
        name: None,
        email: None,
        age: None,
    };
    let mut patch = Patch::new(profile).with_set("email");

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    let errors = context.process(&mut patch).unwrap().into_result().unwrap_err();
    assert_eq!(locations(&errors), vec!["/email"]);
}

#[test]
fn test_object_level_violations_survive_patch_mode() {
    let rules = RuleSet::new()
        .field("name", FieldRules::new().not_null())
        .check(
            ConstraintKind::new("consistent"),
            "profile is inconsistent",
            |value, ctx| {
                if value.get("age").is_some_and(|age| !age.is_null()) {
                    ctx.add_default_error();
                }
                Ok(())
            },
        );
    let chain: PreprocessingChain<Patch<Profile>> =
        DefaultPreprocessingChain::new(ModifierRegistry::new(), rules, ConverterTable::new());
    let mut patch: Patch<Profile> = Patch::from_json(json!({"age": 3})).unwrap();

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    let errors = context.process(&mut patch).unwrap().into_result().unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].location(), Some(""));
    assert_eq!(errors.errors()[0].message(), "profile is inconsistent");
}

#[test]
fn test_json_root_key_is_stripped() {
    let rules = RuleSet::new().field(
        "profile",
        FieldRules::new().nested(
            RuleSet::new()
                .field("email", FieldRules::new().not_null())
                .field("age", FieldRules::new().max(150.0)),
        ),
    );
    let chain: PreprocessingChain<JsonRoot<Profile>> =
        DefaultPreprocessingChain::new(ModifierRegistry::new(), rules, ConverterTable::new());

    let mut root = JsonRoot::new(
        "profile",
        Profile {
            name: Some("Ada".to_string()),
            email: None,
            age: Some(151),
        },
    );

    let mut context = PreprocessingContext::new(&chain, PreprocessingConfig::new());
    let errors = context.process(&mut root).unwrap().into_result().unwrap_err();
    assert_eq!(locations(&errors), vec!["/email", "/age"]);
}

#[test]
fn test_json_root_around_patch() {
    let rules = RuleSet::new().field(
        "profile",
        FieldRules::new().nested(
            RuleSet::new()
                .field("name", FieldRules::new().not_null())
                .field("email", FieldRules::new().not_null()),
        ),
    );
    let chain: PreprocessingChain<JsonRoot<Patch<Profile>>> =
        DefaultPreprocessingChain::new(ModifierRegistry::new(), rules, ConverterTable::new());

    let patch: Patch<Profile> = Patch::from_json(json!({"email": null})).unwrap();
    let mut root = JsonRoot::new("profile", patch);

    let config = PreprocessingConfig::new().validate_patch();
    let mut context = PreprocessingContext::new(&chain, config);
    let errors = context.process(&mut root).unwrap().into_result().unwrap_err();
    assert_eq!(locations(&errors), vec!["/email"]);
}

#[test]
fn test_json_root_serializes_as_envelope() {
    let root = JsonRoot::new(
        "profile",
        Profile {
            name: Some("Ada".to_string()),
            email: None,
            age: None,
        },
    );
    assert_eq!(
        serde_json::to_value(&root).unwrap(),
        json!({"profile": {"name": "Ada", "email": null, "age": null}})
    );
}
