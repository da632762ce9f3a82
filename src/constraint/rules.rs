//! A small rule-based constraint engine over the JSON form of a value.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use stillwater::prelude::*;
use stillwater::Validation;

use super::{
    ConstraintContext, ConstraintEngine, ConstraintKind, ConstraintViolation, PropertyNode,
    ValidationGroup,
};
use crate::error::{ConfigError, PreprocessingError};

/// A non-empty list of violations that accumulates through [`Semigroup`].
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(NonEmptyVec<ConstraintViolation>);

impl Violations {
    /// Creates a list holding one violation.
    pub fn single(violation: ConstraintViolation) -> Self {
        Self(NonEmptyVec::singleton(violation))
    }

    /// Returns None for an empty list.
    pub fn from_vec(violations: Vec<ConstraintViolation>) -> Option<Self> {
        NonEmptyVec::from_vec(violations).map(Self)
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the list is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates the violations in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.0.iter()
    }

    /// Consumes the list into a plain vector.
    pub fn into_vec(self) -> Vec<ConstraintViolation> {
        self.0.into_vec()
    }
}

impl Semigroup for Violations {
    fn combine(self, other: Self) -> Self {
        Violations(self.0.combine(other.0))
    }
}

type Outcome = Validation<(), Violations>;

/// Folds outcomes, keeping every violation.
fn accumulate(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
    outcomes
        .into_iter()
        .fold(Validation::Success(()), |acc, next| match (acc, next) {
            (Validation::Success(()), next) => next,
            (failure @ Validation::Failure(_), Validation::Success(())) => failure,
            (Validation::Failure(a), Validation::Failure(b)) => Validation::Failure(a.combine(b)),
        })
}

/// A constraint applied to one field value.
#[derive(Clone)]
enum Rule {
    NotNull,
    NotBlank,
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Pattern {
        regex: Regex,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl Rule {
    fn kind(&self) -> ConstraintKind {
        match self {
            Rule::NotNull => ConstraintKind::NOT_NULL,
            Rule::NotBlank => ConstraintKind::NOT_BLANK,
            Rule::Length { .. } => ConstraintKind::LENGTH,
            Rule::Pattern { .. } => ConstraintKind::PATTERN,
            Rule::Range { .. } => ConstraintKind::RANGE,
        }
    }
}

#[derive(Clone)]
struct RuleEntry {
    rule: Rule,
    message: Option<String>,
    groups: Vec<ValidationGroup>,
}

/// The rules of one field.
///
/// [`message`](Self::message) and [`groups`](Self::groups) apply to the rule
/// added last.
///
/// # Example
///
/// ```rust
/// use pinpoint::{FieldRules, ValidationGroup};
///
/// let rules = FieldRules::new()
///     .not_blank()
///     .message("a name is required")
///     .max_len(50)
///     .pattern(r"^[A-Za-z ]+$")
///     .unwrap()
///     .groups([ValidationGroup::new("create")]);
/// ```
#[derive(Clone, Default)]
pub struct FieldRules {
    entries: Vec<RuleEntry>,
    nested: Option<Box<RuleSet>>,
    each: Option<Box<FieldRules>>,
}

impl FieldRules {
    /// Creates rules with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.entries.push(RuleEntry {
            rule,
            message: None,
            groups: Vec::new(),
        });
        self
    }

    /// The value must not be null or missing.
    pub fn not_null(self) -> Self {
        self.rule(Rule::NotNull)
    }

    /// The value must not be null, missing, or a whitespace-only string.
    pub fn not_blank(self) -> Self {
        self.rule(Rule::NotBlank)
    }

    /// Strings must have at least `min` characters; lists at least `min` items.
    pub fn min_len(self, min: usize) -> Self {
        self.rule(Rule::Length {
            min: Some(min),
            max: None,
        })
    }

    /// Strings must have at most `max` characters; lists at most `max` items.
    pub fn max_len(self, max: usize) -> Self {
        self.rule(Rule::Length {
            min: None,
            max: Some(max),
        })
    }

    /// Strings must have between `min` and `max` characters; lists between `min` and `max` items.
    pub fn length(self, min: usize, max: usize) -> Self {
        self.rule(Rule::Length {
            min: Some(min),
            max: Some(max),
        })
    }

    /// Strings must match the regex.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error.
    pub fn pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(self.rule(Rule::Pattern { regex }))
    }

    /// Numbers must be at least `min`.
    pub fn min(self, min: f64) -> Self {
        self.rule(Rule::Range {
            min: Some(min),
            max: None,
        })
    }

    /// Numbers must be at most `max`.
    pub fn max(self, max: f64) -> Self {
        self.rule(Rule::Range {
            min: None,
            max: Some(max),
        })
    }

    /// Numbers must lie within `min..=max`.
    pub fn range(self, min: f64, max: f64) -> Self {
        self.rule(Rule::Range {
            min: Some(min),
            max: Some(max),
        })
    }

    /// Replaces the default message of the last rule.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.message = Some(message.into());
        }
        self
    }

    /// Puts the last rule in the given groups instead of the default group.
    pub fn groups<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = ValidationGroup>,
    {
        if let Some(entry) = self.entries.last_mut() {
            entry.groups.extend(groups);
        }
        self
    }

    /// Validates an object value with a nested rule set.
    pub fn nested(mut self, rules: RuleSet) -> Self {
        self.nested = Some(Box::new(rules));
        self
    }

    /// Validates each item of a list value.
    pub fn each(mut self, rules: FieldRules) -> Self {
        self.each = Some(Box::new(rules));
        self
    }

    fn evaluate(
        &self,
        value: &Value,
        path: &[PropertyNode],
        groups: &[ValidationGroup],
    ) -> Result<Outcome, PreprocessingError> {
        let mut outcomes: Vec<Outcome> = self
            .entries
            .iter()
            .filter(|entry| in_groups(&entry.groups, groups))
            .map(|entry| match check_rule(entry, value, path) {
                Some(violation) => Validation::Failure(Violations::single(violation)),
                None => Validation::Success(()),
            })
            .collect();

        if let (Some(nested), Value::Object(_)) = (&self.nested, value) {
            outcomes.push(nested.evaluate(value, path, groups)?);
        }

        if let (Some(each), Value::Array(items)) = (&self.each, value) {
            for (index, item) in items.iter().enumerate() {
                let mut item_path = path.to_vec();
                item_path.push(PropertyNode::Index(index));
                outcomes.push(each.evaluate(item, &item_path, groups)?);
            }
        }

        Ok(accumulate(outcomes))
    }
}

type CheckFn = dyn Fn(&Value, &mut ConstraintContext) -> Result<(), ConfigError> + Send + Sync;

/// An object-level check with access to every field.
#[derive(Clone)]
struct CustomCheck {
    kind: ConstraintKind,
    message: String,
    check: Arc<CheckFn>,
}

/// Ordered field rules plus object-level checks, evaluated over the JSON form
/// of any serializable value.
///
/// Rules whose groups do not intersect the requested groups are ignored; a
/// rule without groups belongs to [`ValidationGroup::DEFAULT`], and an empty
/// request means the default group. Null or missing values only fail
/// `not_null` and `not_blank`.
///
/// # Example
///
/// ```rust
/// use pinpoint::{ConstraintEngine, FieldRules, RuleSet};
/// use serde_json::json;
///
/// let rules = RuleSet::new()
///     .field("name", FieldRules::new().not_null().max_len(5))
///     .field("tags", FieldRules::new().each(FieldRules::new().not_blank()));
///
/// let violations = rules
///     .validate(&json!({"name": "too long", "tags": ["ok", " "]}), &[])
///     .unwrap();
///
/// let locations: Vec<_> = violations.iter().map(|v| v.pointer().to_string()).collect();
/// assert_eq!(locations, vec!["/name", "/tags/1"]);
/// ```
#[derive(Clone, Default)]
pub struct RuleSet {
    fields: IndexMap<String, FieldRules>,
    checks: Vec<CustomCheck>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the rules of a field. Adding a field twice replaces its rules.
    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(name.into(), rules);
        self
    }

    /// Adds an object-level check in the default group.
    ///
    /// The check reports through a [`ConstraintContext`] positioned at the
    /// object; `message` is the default message.
    pub fn check<F>(mut self, kind: ConstraintKind, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &mut ConstraintContext) -> Result<(), ConfigError> + Send + Sync + 'static,
    {
        self.checks.push(CustomCheck {
            kind,
            message: message.into(),
            check: Arc::new(check),
        });
        self
    }

    fn evaluate(
        &self,
        value: &Value,
        path: &[PropertyNode],
        groups: &[ValidationGroup],
    ) -> Result<Outcome, PreprocessingError> {
        let Value::Object(object) = value else {
            return Ok(Validation::Success(()));
        };

        let mut outcomes = Vec::with_capacity(self.fields.len() + self.checks.len());
        for (name, rules) in &self.fields {
            let field_value = object.get(name).unwrap_or(&Value::Null);
            let mut field_path = path.to_vec();
            field_path.push(PropertyNode::Property(name.clone()));
            outcomes.push(rules.evaluate(field_value, &field_path, groups)?);
        }

        if in_groups(&[], groups) {
            for custom in &self.checks {
                let mut ctx = ConstraintContext::at(path.to_vec(), custom.kind, custom.message.clone());
                (custom.check)(value, &mut ctx)?;
                outcomes.push(match Violations::from_vec(ctx.into_violations()) {
                    Some(violations) => Validation::Failure(violations),
                    None => Validation::Success(()),
                });
            }
        }

        Ok(accumulate(outcomes))
    }
}

impl<T: Serialize + ?Sized> ConstraintEngine<T> for RuleSet {
    fn validate(
        &self,
        value: &T,
        groups: &[ValidationGroup],
    ) -> Result<Vec<ConstraintViolation>, PreprocessingError> {
        let json = serde_json::to_value(value)
            .map_err(|err| PreprocessingError::stage("constraints", err))?;

        match self.evaluate(&json, &[], groups)? {
            Validation::Success(()) => Ok(Vec::new()),
            Validation::Failure(violations) => Ok(violations.into_vec()),
        }
    }
}

/// Returns true if a rule declared in `declared` runs for `requested`.
fn in_groups(declared: &[ValidationGroup], requested: &[ValidationGroup]) -> bool {
    let default = [ValidationGroup::DEFAULT];
    let declared = if declared.is_empty() { &default[..] } else { declared };
    let requested = if requested.is_empty() { &default[..] } else { requested };
    declared.iter().any(|group| requested.contains(group))
}

/// Checks a single rule and returns a violation if it fails.
fn check_rule(entry: &RuleEntry, value: &Value, path: &[PropertyNode]) -> Option<ConstraintViolation> {
    let default_message = match (&entry.rule, value) {
        (Rule::NotNull, Value::Null) => "must not be null".to_string(),
        (Rule::NotBlank, Value::Null) => "must not be blank".to_string(),
        (Rule::NotBlank, Value::String(s)) if s.trim().is_empty() => {
            "must not be blank".to_string()
        }
        (Rule::Length { min, max }, Value::String(_) | Value::Array(_)) => {
            let len = match value {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                _ => return None,
            };
            length_violation(len, *min, *max)?
        }
        (Rule::Pattern { regex }, Value::String(s)) if !regex.is_match(s) => {
            format!("must match \"{}\"", regex.as_str())
        }
        (Rule::Range { min, max }, Value::Number(n)) => {
            let n = n.as_f64()?;
            range_violation(n, *min, *max)?
        }
        _ => return None,
    };

    let message = entry.message.clone().unwrap_or(default_message);
    Some(ConstraintViolation::new(entry.rule.kind(), message).with_path(path.to_vec()))
}

fn length_violation(len: usize, min: Option<usize>, max: Option<usize>) -> Option<String> {
    let too_short = min.is_some_and(|min| len < min);
    let too_long = max.is_some_and(|max| len > max);
    if !too_short && !too_long {
        return None;
    }
    Some(match (min, max) {
        (Some(min), Some(max)) => format!("length must be between {} and {}", min, max),
        (Some(min), None) => format!("length must be at least {}", min),
        (None, Some(max)) => format!("length must be at most {}", max),
        (None, None) => return None,
    })
}

fn range_violation(n: f64, min: Option<f64>, max: Option<f64>) -> Option<String> {
    let too_small = min.is_some_and(|min| n < min);
    let too_large = max.is_some_and(|max| n > max);
    if !too_small && !too_large {
        return None;
    }
    Some(match (min, max) {
        (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
        (Some(min), None) => format!("must be at least {}", min),
        (None, Some(max)) => format!("must be at most {}", max),
        (None, None) => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locations(violations: &[ConstraintViolation]) -> Vec<String> {
        violations.iter().map(|v| v.pointer().to_string()).collect()
    }

    #[test]
    fn test_null_only_fails_presence_rules() {
        let rules = RuleSet::new()
            .field("a", FieldRules::new().min_len(3).pattern("^x$").unwrap().min(1.0))
            .field("b", FieldRules::new().not_null());

        let violations = rules.validate(&json!({}), &[]).unwrap();
        assert_eq!(locations(&violations), vec!["/b"]);
        assert_eq!(violations[0].kind(), ConstraintKind::NOT_NULL);
        assert_eq!(violations[0].message(), "must not be null");
    }

    #[test]
    fn test_all_violations_accumulate() {
        let rules = RuleSet::new().field(
            "name",
            FieldRules::new().min_len(5).pattern("^[a-z]+$").unwrap(),
        );

        let violations = rules.validate(&json!({"name": "AB"}), &[]).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].message(), "length must be at least 5");
        assert_eq!(violations[1].kind(), ConstraintKind::PATTERN);
    }

    #[test]
    fn test_blank_strings() {
        let rules = RuleSet::new().field("name", FieldRules::new().not_blank());
        assert_eq!(rules.validate(&json!({"name": " \t"}), &[]).unwrap().len(), 1);
        assert!(rules.validate(&json!({"name": "x"}), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_range_messages() {
        let rules = RuleSet::new()
            .field("age", FieldRules::new().range(0.0, 150.0))
            .field("score", FieldRules::new().max(10.0).message("too high"));

        let violations = rules
            .validate(&json!({"age": -1, "score": 11}), &[])
            .unwrap();
        assert_eq!(violations[0].message(), "must be between 0 and 150");
        assert_eq!(violations[1].message(), "too high");
    }

    #[test]
    fn test_groups_filter_rules() {
        let create = ValidationGroup::new("create");
        let rules = RuleSet::new()
            .field("id", FieldRules::new().not_null().groups([create]))
            .field("name", FieldRules::new().not_null());

        let default_only = rules.validate(&json!({}), &[]).unwrap();
        assert_eq!(locations(&default_only), vec!["/name"]);

        let create_only = rules.validate(&json!({}), &[create]).unwrap();
        assert_eq!(locations(&create_only), vec!["/id"]);

        let both = rules
            .validate(&json!({}), &[ValidationGroup::DEFAULT, create])
            .unwrap();
        assert_eq!(locations(&both), vec!["/id", "/name"]);
    }

    #[test]
    fn test_nested_and_each_paths() {
        let child = RuleSet::new().field("name", FieldRules::new().not_null());
        let rules = RuleSet::new().field(
            "person",
            FieldRules::new().nested(RuleSet::new().field(
                "children",
                FieldRules::new().max_len(3).each(FieldRules::new().nested(child)),
            )),
        );

        let value = json!({"person": {"children": [{"name": "a"}, {}, {"name": null}]}});
        let violations = rules.validate(&value, &[]).unwrap();
        assert_eq!(
            locations(&violations),
            vec!["/person/children/1/name", "/person/children/2/name"]
        );
    }

    #[test]
    fn test_custom_check() {
        let rules = RuleSet::new().check(
            ConstraintKind::new("date_range"),
            "invalid range",
            |value, ctx| {
                if value["start"].as_i64() > value["end"].as_i64() {
                    ctx.add_error("end", "must not be before start")?;
                }
                Ok(())
            },
        );

        let violations = rules.validate(&json!({"start": 5, "end": 1}), &[]).unwrap();
        assert_eq!(locations(&violations), vec!["/end"]);
        assert_eq!(violations[0].kind().as_str(), "date_range");
    }

    #[test]
    fn test_custom_check_config_error_propagates() {
        let rules = RuleSet::new().check(ConstraintKind::new("bad"), "", |_, ctx| {
            ctx.add_error("a.b", "nested")?;
            Ok(())
        });
        let err = rules.validate(&json!({}), &[]).unwrap_err();
        assert!(matches!(
            err.as_config(),
            Some(ConfigError::InvalidConstraintLocation { .. })
        ));
    }

    #[test]
    fn test_serialization_failure_is_stage_error() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot serialize"))
            }
        }

        let err = RuleSet::new().validate(&Broken, &[]).unwrap_err();
        assert!(matches!(
            err,
            PreprocessingError::Stage {
                stage: "constraints",
                ..
            }
        ));
    }
}
