//! The built-in `trim` modifier.

use serde_json::Value;

use super::modifiers::{Annotation, FieldMut, Modifier};
use crate::error::PreprocessingError;

/// Removes leading and trailing whitespace and, unless disabled, collapses
/// inner whitespace runs to a single space.
///
/// Null values are left untouched. The `collapseWhitespace` option defaults
/// to `true`.
///
/// ```rust
/// use pinpoint::TrimModifier;
///
/// assert_eq!(TrimModifier::apply("  a \t\n b  ", true), "a b");
/// assert_eq!(TrimModifier::apply("  a \t\n b  ", false), "a \t\n b");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimModifier;

impl TrimModifier {
    /// The annotation tag.
    pub const TAG: &'static str = "trim";

    /// The option controlling whitespace collapsing.
    pub const COLLAPSE_WHITESPACE: &'static str = "collapseWhitespace";

    /// Builds a `trim` annotation.
    pub fn annotation(collapse_whitespace: bool) -> Annotation {
        Annotation::new(Self::TAG).with_option(Self::COLLAPSE_WHITESPACE, collapse_whitespace)
    }

    /// Trims one string.
    pub fn apply(value: &str, collapse_whitespace: bool) -> String {
        if collapse_whitespace {
            value.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            value.trim().to_string()
        }
    }
}

impl Modifier for TrimModifier {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn modify(&self, field: FieldMut<'_>, annotation: &Annotation) -> Result<(), PreprocessingError> {
        let collapse = annotation.flag(Self::COLLAPSE_WHITESPACE, true);
        match field {
            FieldMut::Text(Some(text)) => {
                *text = Self::apply(text, collapse);
            }
            FieldMut::String(text) => {
                *text = Self::apply(text, collapse);
            }
            FieldMut::Text(None) | FieldMut::Json(Value::Null) => {}
            FieldMut::Json(Value::String(text)) => {
                *text = Self::apply(text, collapse);
            }
            FieldMut::Json(other) => {
                tracing::warn!(value = %other, "trim only applies to strings, field left unchanged");
            }
        }
        Ok(())
    }
}
