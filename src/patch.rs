//! Partial-update payloads and root envelopes.
//!
//! A [`Patch`] wraps a value together with the names of the top-level
//! properties the client actually sent. With patch validation enabled, the
//! constraint stage only reports violations on those properties. A
//! [`JsonRoot`] is a single-key envelope (`{"user": {...}}`) whose key the
//! constraint stage strips from violation locations.

use indexmap::IndexSet;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::preprocessing::{FieldDescriptor, FieldMut, Modifiable, ShapeId};

/// An object that knows which of its properties were explicitly set.
pub trait PatchObject {
    /// Returns true if the (unescaped) top-level property was present in the
    /// request.
    fn is_property_set(&self, property: &str) -> bool;
}

/// Capabilities the constraint stage looks for on the processed object.
///
/// Both methods have defaults, so any type opts in with an empty impl.
pub trait Payload {
    /// Returns the object as a patch object, if it is one.
    fn as_patch(&self) -> Option<&dyn PatchObject> {
        None
    }

    /// Returns true if the object is a root envelope whose key must be
    /// stripped from violation locations.
    fn is_json_root(&self) -> bool {
        false
    }
}

impl Payload for Value {}

/// A value plus the set of properties that were explicitly provided.
///
/// # Example
///
/// ```rust
/// use pinpoint::{Patch, PatchObject};
/// use serde_json::{json, Value};
///
/// let patch: Patch<Value> = Patch::from_json(json!({"name": "Alice"})).unwrap();
/// assert!(patch.is_property_set("name"));
/// assert!(!patch.is_property_set("email"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<T> {
    value: T,
    set_properties: IndexSet<String>,
}

impl<T> Patch<T> {
    /// Wraps a value with no property marked as set.
    pub fn new(value: T) -> Self {
        Self {
            value,
            set_properties: IndexSet::new(),
        }
    }

    /// Marks a property as explicitly set.
    pub fn mark_set(&mut self, property: impl Into<String>) -> &mut Self {
        self.set_properties.insert(property.into());
        self
    }

    /// Marks a property as explicitly set and returns self for chaining.
    pub fn with_set(mut self, property: impl Into<String>) -> Self {
        self.mark_set(property);
        self
    }

    /// Returns the explicitly set properties, in the order they were marked.
    pub fn set_properties(&self) -> impl Iterator<Item = &str> {
        self.set_properties.iter().map(String::as_str)
    }

    /// Returns the patch payload.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the patch payload for in-place changes.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Consumes the patch and returns its payload.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: DeserializeOwned> Patch<T> {
    /// Deserializes a value from JSON and marks every top-level key present
    /// in it as set.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error of `T`.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let set_properties = match &raw {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => IndexSet::new(),
        };
        let value = T::deserialize(raw)?;
        Ok(Self {
            value,
            set_properties,
        })
    }
}

impl<T> PatchObject for Patch<T> {
    fn is_property_set(&self, property: &str) -> bool {
        self.set_properties.contains(property)
    }
}

impl<T> Payload for Patch<T> {
    fn as_patch(&self) -> Option<&dyn PatchObject> {
        Some(self)
    }
}

impl<T: Modifiable> Modifiable for Patch<T> {
    fn shape(&self) -> ShapeId {
        self.value.shape()
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        self.value.fields()
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        self.value.field_mut(name)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::from_json(raw).map_err(D::Error::custom)
    }
}

/// A value wrapped in a single-key root envelope.
///
/// Serializes as `{key: value}`. Violation locations produced for the
/// envelope start with `/key`; the constraint stage removes that fragment so
/// errors point into the wrapped value.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRoot<T> {
    key: &'static str,
    value: T,
}

impl<T> JsonRoot<T> {
    /// Wraps `value` under `key`.
    pub fn new(key: &'static str, value: T) -> Self {
        Self { key, value }
    }

    /// Returns the envelope key.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Returns the wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the wrapped value for in-place changes.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Consumes the envelope and returns the wrapped value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Payload> Payload for JsonRoot<T> {
    fn as_patch(&self) -> Option<&dyn PatchObject> {
        self.value.as_patch()
    }

    fn is_json_root(&self) -> bool {
        true
    }
}

impl<T: Modifiable> Modifiable for JsonRoot<T> {
    fn shape(&self) -> ShapeId {
        self.value.shape()
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        self.value.fields()
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        self.value.field_mut(name)
    }
}

impl<T: Serialize> Serialize for JsonRoot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize)]
    struct User {
        name: Option<String>,
        email: Option<String>,
    }

    #[test]
    fn test_from_json_marks_present_keys() {
        let patch: Patch<User> =
            serde_json::from_value(json!({"name": null})).unwrap();

        assert!(patch.is_property_set("name"));
        assert!(!patch.is_property_set("email"));
        assert!(patch.value().name.is_none());
    }

    #[test]
    fn test_mark_set_by_hand() {
        let mut patch = Patch::new(User {
            name: Some("a".to_string()),
            email: None,
        });
        patch.mark_set("name").mark_set("name");
        assert_eq!(patch.set_properties().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_patch_serializes_as_inner_value() {
        let patch = Patch::new(json!({"a": 1})).with_set("a");
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_deserialize_error_is_reported() {
        let result: Result<Patch<User>, _> = serde_json::from_value(json!({"name": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_json_root_serializes_envelope() {
        let root = JsonRoot::new("user", json!({"name": "a"}));
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({"user": {"name": "a"}})
        );
        assert!(root.is_json_root());
        assert!(root.as_patch().is_none());

        let patched = JsonRoot::new("user", Patch::new(json!({})).with_set("name"));
        assert!(patched.as_patch().is_some_and(|p| p.is_property_set("name")));
    }
}
