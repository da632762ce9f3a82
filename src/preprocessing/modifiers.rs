//! Annotation-driven field modification.
//!
//! Types describe their fields through [`Modifiable`]; each field carries
//! [`Annotation`]s whose tags select a [`Modifier`] from a
//! [`ModifierRegistry`]. The annotated fields of each shape are planned once
//! per process, the first time any [`ModifiersPreprocessor`] sees the shape.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::{PreprocessingConfig, Preprocessor};
use crate::error::PreprocessingError;
use crate::registry::ModifierRegistry;

/// Identifies the shape (the static field layout) of a modifiable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(&'static str);

impl ShapeId {
    /// Creates a shape identifier from a type name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the shape name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

/// A tag plus options attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    tag: &'static str,
    options: Map<String, Value>,
}

impl Annotation {
    /// Creates an annotation without options.
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            options: Map::new(),
        }
    }

    /// Sets an option and returns self for chaining.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Returns the tag naming the modifier to apply.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Returns an option value by key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Reads a boolean option, falling back to `default` when it is absent
    /// or not a boolean.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.option(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// A field name and its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: &'static str,
    annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    /// Creates a descriptor without annotations.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation and returns self for chaining.
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the annotations in declaration order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Mutable access to one field, in one of the representations modifiers
/// understand.
#[derive(Debug)]
pub enum FieldMut<'a> {
    /// An optional string; `None` is the null value.
    Text(&'a mut Option<String>),
    /// A required string.
    String(&'a mut String),
    /// An arbitrary JSON value.
    Json(&'a mut Value),
}

/// A value whose fields can be modified through annotations.
///
/// # Example
///
/// ```rust
/// use pinpoint::{Annotation, FieldDescriptor, FieldMut, Modifiable, ShapeId, TrimModifier};
///
/// struct Person {
///     name: Option<String>,
/// }
///
/// impl Modifiable for Person {
///     fn shape(&self) -> ShapeId {
///         ShapeId::new("Person")
///     }
///
///     fn fields(&self) -> Vec<FieldDescriptor> {
///         vec![FieldDescriptor::new("name").annotated(TrimModifier::annotation(true))]
///     }
///
///     fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
///         match name {
///             "name" => Some(FieldMut::Text(&mut self.name)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Modifiable {
    /// The shape of this value. Values of one shape must always describe the
    /// same fields.
    fn shape(&self) -> ShapeId;

    /// Describes the fields and their annotations.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Returns mutable access to a described field.
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;
}

/// JSON values carry no annotations.
impl Modifiable for Value {
    fn shape(&self) -> ShapeId {
        ShapeId::new("serde_json::Value")
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    fn field_mut(&mut self, _name: &str) -> Option<FieldMut<'_>> {
        None
    }
}

/// Handles one annotation tag.
pub trait Modifier: Send + Sync {
    /// The annotation tag this modifier handles.
    fn tag(&self) -> &'static str;

    /// Modifies the field in place.
    fn modify(&self, field: FieldMut<'_>, annotation: &Annotation) -> Result<(), PreprocessingError>;
}

/// The cached annotated fields of one shape.
#[derive(Debug)]
struct ShapePlan {
    fields: Vec<FieldDescriptor>,
}

/// Per-shape plan cache: populated once per shape, read many times, never
/// invalidated.
#[derive(Debug, Default)]
struct ShapeCache {
    plans: RwLock<HashMap<ShapeId, Arc<ShapePlan>>>,
}

impl ShapeCache {
    fn plan_for<T: Modifiable + ?Sized>(&self, value: &T) -> Arc<ShapePlan> {
        let shape = value.shape();
        if let Some(plan) = self.plans.read().get(&shape) {
            return Arc::clone(plan);
        }

        let mut plans = self.plans.write();
        let plan = plans.entry(shape).or_insert_with(|| {
            let fields: Vec<_> = value
                .fields()
                .into_iter()
                .filter(|field| !field.annotations.is_empty())
                .collect();
            tracing::debug!(
                shape = shape.as_str(),
                annotated_fields = fields.len(),
                "cached modifier plan"
            );
            Arc::new(ShapePlan { fields })
        });
        Arc::clone(plan)
    }

    fn contains(&self, shape: ShapeId) -> bool {
        self.plans.read().contains_key(&shape)
    }
}

/// Shared by every [`ModifiersPreprocessor`] in the process.
static SHAPE_CACHE: OnceLock<ShapeCache> = OnceLock::new();

fn shape_cache() -> &'static ShapeCache {
    SHAPE_CACHE.get_or_init(ShapeCache::default)
}

/// Applies registered modifiers to annotated fields.
///
/// Annotations whose tag has no registered modifier are ignored, so the same
/// field descriptors can carry tags meant for other tools. Always returns
/// `true`.
///
/// Field plans live in one process-wide cache keyed by [`ShapeId`], so a
/// shape is planned once no matter how many stages or chains process it.
/// Two types must not share a `ShapeId` unless they describe the same
/// fields.
#[derive(Debug, Default)]
pub struct ModifiersPreprocessor {
    registry: ModifierRegistry,
}

impl ModifiersPreprocessor {
    /// Creates the stage over a registry. Registrations made later are still seen.
    pub fn new(registry: ModifierRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry modifiers are looked up in.
    pub fn registry(&self) -> &ModifierRegistry {
        &self.registry
    }

    /// Returns true if the shape's field plan is already cached.
    pub fn is_cached(shape: ShapeId) -> bool {
        shape_cache().contains(shape)
    }

    /// Applies the modifiers to one value.
    pub fn modify<T: Modifiable + ?Sized>(&self, value: &mut T) -> Result<(), PreprocessingError> {
        let plan = shape_cache().plan_for(value);
        let shape = value.shape();

        for field in &plan.fields {
            for annotation in &field.annotations {
                let Some(modifier) = self.registry.get(annotation.tag) else {
                    continue;
                };
                match value.field_mut(field.name) {
                    Some(target) => {
                        tracing::trace!(field = field.name, tag = annotation.tag, "modifying field");
                        modifier.modify(target, annotation)?;
                    }
                    None => tracing::warn!(
                        shape = shape.as_str(),
                        field = field.name,
                        "annotated field is not accessible"
                    ),
                }
            }
        }
        Ok(())
    }
}

impl<T: Modifiable + ?Sized> Preprocessor<T> for ModifiersPreprocessor {
    fn name(&self) -> &'static str {
        "modifiers"
    }

    fn process(
        &self,
        value: &mut T,
        _config: &mut PreprocessingConfig<T>,
    ) -> Result<bool, PreprocessingError> {
        self.modify(value)?;
        Ok(true)
    }
}
