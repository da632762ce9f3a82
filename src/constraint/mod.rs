//! Declarative constraint checking.
//!
//! The constraint stage treats the engine as a black box: a
//! [`ConstraintEngine`] returns [`ConstraintViolation`]s, each with a property
//! path, a message and a [`ConstraintKind`]. A [`ConstraintConverter`] maps
//! kinds to error codes and location types. [`RuleSet`] is the engine that
//! ships with the crate.

mod context;
mod rules;

pub use context::ConstraintContext;
pub use rules::{FieldRules, RuleSet, Violations};

use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::error::{ErrorCode, LocationType, PreprocessingError};
use crate::path::JsonPointer;

/// A named group of constraints.
///
/// Constraints without an explicit group belong to [`ValidationGroup::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidationGroup(&'static str);

impl ValidationGroup {
    /// The group of constraints declared without a group.
    pub const DEFAULT: ValidationGroup = ValidationGroup("default");

    /// Creates a group with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the group name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Identifies the kind of constraint that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintKind(&'static str);

impl ConstraintKind {
    pub const NOT_NULL: ConstraintKind = ConstraintKind("not_null");
    pub const NOT_BLANK: ConstraintKind = ConstraintKind("not_blank");
    pub const LENGTH: ConstraintKind = ConstraintKind("length");
    pub const PATTERN: ConstraintKind = ConstraintKind("pattern");
    pub const RANGE: ConstraintKind = ConstraintKind("range");

    /// Creates a custom constraint kind.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the kind's name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One node of a violation's property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyNode {
    /// A named property; stored unescaped.
    Property(String),
    /// A position in a list.
    Index(usize),
}

/// A constraint violation reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    path: Vec<PropertyNode>,
    message: String,
    kind: ConstraintKind,
}

impl ConstraintViolation {
    /// Creates a violation on the validated object itself.
    pub fn new(kind: ConstraintKind, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
            kind,
        }
    }

    /// Sets the property path and returns self for chaining.
    pub fn with_path(mut self, path: Vec<PropertyNode>) -> Self {
        self.path = path;
        self
    }

    /// Returns the property path of the violating value.
    pub fn path(&self) -> &[PropertyNode] {
        &self.path
    }

    /// Returns the violation message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind of constraint that was violated.
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Converts the property path to a pointer, escaping property names.
    pub fn pointer(&self) -> JsonPointer {
        let mut pointer = JsonPointer::root();
        for node in &self.path {
            match node {
                PropertyNode::Property(name) => pointer.push(name.as_str()),
                PropertyNode::Index(index) => pointer.push(*index),
            };
        }
        pointer
    }
}

/// Evaluates constraints on an object.
pub trait ConstraintEngine<T: ?Sized>: Send + Sync {
    /// Returns the violations of the constraints in the requested groups.
    /// An empty group list means [`ValidationGroup::DEFAULT`].
    ///
    /// An `Err` aborts the run; violations are not errors.
    fn validate(
        &self,
        value: &T,
        groups: &[ValidationGroup],
    ) -> Result<Vec<ConstraintViolation>, PreprocessingError>;
}

/// Maps constraint kinds to the code and location type of reported errors.
pub trait ConstraintConverter: Send + Sync {
    fn error_code(&self, kind: ConstraintKind) -> Option<ErrorCode>;

    fn location_type(&self, kind: ConstraintKind) -> Option<LocationType>;
}

/// A table-driven [`ConstraintConverter`].
///
/// Kinds without an entry get no code, and the default location type
/// (`json` unless changed).
///
/// ```rust
/// use pinpoint::{ConstraintConverter, ConstraintKind, ConverterTable, ErrorCode, LocationType};
///
/// const REQUIRED: ErrorCode = ErrorCode::new(1000, 422);
///
/// let converter = ConverterTable::new().with_code(ConstraintKind::NOT_NULL, REQUIRED);
/// assert_eq!(converter.error_code(ConstraintKind::NOT_NULL), Some(REQUIRED));
/// assert_eq!(converter.error_code(ConstraintKind::RANGE), None);
/// assert_eq!(converter.location_type(ConstraintKind::RANGE), Some(LocationType::JSON));
/// ```
#[derive(Debug, Clone)]
pub struct ConverterTable {
    codes: HashMap<ConstraintKind, ErrorCode>,
    location_types: HashMap<ConstraintKind, LocationType>,
    default_location_type: Option<LocationType>,
}

impl ConverterTable {
    /// Creates an empty table: no codes, no location types.
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
            location_types: HashMap::new(),
            default_location_type: Some(LocationType::JSON),
        }
    }

    /// Sets the code of a kind.
    pub fn with_code(mut self, kind: ConstraintKind, code: ErrorCode) -> Self {
        self.codes.insert(kind, code);
        self
    }

    /// Sets the location type of a kind.
    pub fn with_location_type(mut self, kind: ConstraintKind, location_type: LocationType) -> Self {
        self.location_types.insert(kind, location_type);
        self
    }

    /// Sets the location type of kinds without an entry.
    pub fn with_default_location_type(mut self, location_type: Option<LocationType>) -> Self {
        self.default_location_type = location_type;
        self
    }
}

impl Default for ConverterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintConverter for ConverterTable {
    fn error_code(&self, kind: ConstraintKind) -> Option<ErrorCode> {
        self.codes.get(&kind).copied()
    }

    fn location_type(&self, kind: ConstraintKind) -> Option<LocationType> {
        self.location_types
            .get(&kind)
            .copied()
            .or(self.default_location_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_pointer_escapes_properties() {
        let violation = ConstraintViolation::new(ConstraintKind::NOT_NULL, "required").with_path(vec![
            PropertyNode::Property("children".to_string()),
            PropertyNode::Index(2),
            PropertyNode::Property("a/b".to_string()),
        ]);
        assert_eq!(violation.pointer().to_string(), "/children/2/a~1b");
    }

    #[test]
    fn test_object_level_violation_points_at_root() {
        let violation = ConstraintViolation::new(ConstraintKind::new("custom"), "invalid");
        assert!(violation.pointer().is_root());
    }

    #[test]
    fn test_converter_overrides() {
        let custom = LocationType::new("query");
        let converter = ConverterTable::new()
            .with_location_type(ConstraintKind::PATTERN, custom)
            .with_default_location_type(None);

        assert_eq!(converter.location_type(ConstraintKind::PATTERN), Some(custom));
        assert_eq!(converter.location_type(ConstraintKind::LENGTH), None);
    }
}
