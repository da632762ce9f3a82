use std::fmt::Display;

use super::{ConstraintKind, ConstraintViolation, PropertyNode};
use crate::error::ConfigError;

/// Reporting helper for custom constraint checks.
///
/// A check runs against one object and reports violations relative to it:
/// on the object itself, on one of its properties, or on an element of a
/// list property. Property names are single, unnested names; a leading `/`
/// is tolerated.
///
/// ```rust
/// use pinpoint::{ConstraintContext, ConstraintKind};
///
/// let mut ctx = ConstraintContext::new(ConstraintKind::new("dates"), "invalid date range");
/// ctx.add_error("end", "must be after start").unwrap();
/// ctx.add_array_error("/holidays", 1, "must fall between start and end").unwrap();
///
/// assert!(ctx.add_error("period.end", "nested").is_err());
/// assert_eq!(ctx.into_violations().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintContext {
    base: Vec<PropertyNode>,
    kind: ConstraintKind,
    default_message: String,
    violations: Vec<ConstraintViolation>,
}

impl ConstraintContext {
    /// Creates a context for a check of the given kind at the root object.
    pub fn new(kind: ConstraintKind, default_message: impl Into<String>) -> Self {
        Self::at(Vec::new(), kind, default_message)
    }

    /// Creates a context whose violations are reported under `base`.
    pub(crate) fn at(
        base: Vec<PropertyNode>,
        kind: ConstraintKind,
        default_message: impl Into<String>,
    ) -> Self {
        Self {
            base,
            kind,
            default_message: default_message.into(),
            violations: Vec::new(),
        }
    }

    /// Reports the check's default message on the object.
    pub fn add_default_error(&mut self) -> &mut Self {
        let message = self.default_message.clone();
        self.push(Vec::new(), message)
    }

    /// Reports a violation on the object.
    pub fn add_error_at_current_location(&mut self, message: impl Display) -> &mut Self {
        self.push(Vec::new(), message.to_string())
    }

    /// Reports a violation on a property of the object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConstraintLocation`] if the name contains
    /// a `.` or a `/` other than a leading one.
    pub fn add_error(&mut self, property: &str, message: impl Display) -> Result<&mut Self, ConfigError> {
        let property = check_property(property)?;
        Ok(self.push(
            vec![PropertyNode::Property(property.to_string())],
            message.to_string(),
        ))
    }

    /// Reports a violation on an element of a list property.
    ///
    /// # Errors
    ///
    /// Same as [`add_error`](Self::add_error).
    pub fn add_array_error(
        &mut self,
        property: &str,
        index: usize,
        message: impl Display,
    ) -> Result<&mut Self, ConfigError> {
        let property = check_property(property)?;
        Ok(self.push(
            vec![
                PropertyNode::Property(property.to_string()),
                PropertyNode::Index(index),
            ],
            message.to_string(),
        ))
    }

    /// Returns true if any violation was reported.
    pub fn has_errors(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Consumes the context and returns the reported violations.
    pub fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations
    }

    fn push(&mut self, relative: Vec<PropertyNode>, message: String) -> &mut Self {
        let mut path = self.base.clone();
        path.extend(relative);
        self.violations
            .push(ConstraintViolation::new(self.kind, message).with_path(path));
        self
    }
}

fn check_property(property: &str) -> Result<&str, ConfigError> {
    if property.contains('.') {
        return Err(ConfigError::InvalidConstraintLocation {
            location: property.to_string(),
            reason: "property names cannot contain dots",
        });
    }
    let property = property.strip_prefix('/').unwrap_or(property);
    if property.contains('/') {
        return Err(ConfigError::InvalidConstraintLocation {
            location: property.to_string(),
            reason: "property names cannot contain a slash except as the first character",
        });
    }
    Ok(property)
}
