//! Location-tracking validation context.
//!
//! This module provides the [`ValidationContext`] type that is threaded
//! through every validator of a run. It couples a [`JsonPointer`] cursor with
//! an [`ErrorCollector`], so that validators report errors relative to the
//! object they are looking at while the collector always stores absolute
//! locations.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{
    ApiError, ConfigError, ErrorCode, ErrorCollector, LocationType, PreprocessingError,
};
use crate::path::JsonPointer;
use crate::validator::Validator;

/// Validation context carries the cursor, the collected errors and shared
/// state for one run.
///
/// Validators never build absolute locations themselves. They pass relative
/// locations (`"/name"`, `""` for "here", `None` for "nowhere in particular")
/// and delegate to nested validators with [`validate_object`], which moves
/// the cursor down for the duration of the call.
///
/// A context is created per run and never shared between runs.
///
/// [`validate_object`]: ValidationContext::validate_object
///
/// # Example
///
/// ```rust
/// use pinpoint::{validator, ValidationContext};
///
/// let mut ctx = ValidationContext::new();
/// let name_check = validator::from_fn(|name: &str, ctx: &mut ValidationContext| {
///     if name.is_empty() {
///         ctx.add_error_at_current_location(None, "must not be empty");
///     }
///     Ok(())
/// });
///
/// ctx.validate_object("", Some("/name"), &name_check).unwrap();
/// assert!(ctx.has_errors_at(Some("/name")));
/// ```
#[derive(Default)]
pub struct ValidationContext {
    collector: ErrorCollector,
    current: JsonPointer,
    states: HashMap<TypeId, Box<dyn Any>>,
}

impl ValidationContext {
    /// Creates a context at the root location with an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that appends to an existing collector.
    pub fn with_collector(collector: ErrorCollector) -> Self {
        Self {
            collector,
            ..Self::default()
        }
    }

    /// Returns the collected errors.
    pub fn collector(&self) -> &ErrorCollector {
        &self.collector
    }

    /// Consumes the context and returns the collected errors.
    pub fn into_collector(self) -> ErrorCollector {
        self.collector
    }

    /// Returns the cursor.
    pub fn current_location(&self) -> &JsonPointer {
        &self.current
    }

    /// Adds an error at a location relative to the cursor.
    ///
    /// `Some("")` is the current location, `None` reports an error that has
    /// no location at all.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLocation`] if the relative location
    /// contains an invalid escape.
    pub fn add_error(
        &mut self,
        relative: Option<&str>,
        location_type: Option<LocationType>,
        code: Option<ErrorCode>,
        message: impl Display,
    ) -> Result<&mut Self, ConfigError> {
        let location = self.location(relative)?;
        self.collector.add(
            ApiError::new(message.to_string())
                .with_code(code)
                .with_location(location)
                .with_location_type(location_type),
        );
        Ok(self)
    }

    /// Adds an error at the cursor, with the `json` location type.
    pub fn add_error_at_current_location(
        &mut self,
        code: Option<ErrorCode>,
        message: impl Display,
    ) -> &mut Self {
        self.collector.add(
            ApiError::new(message.to_string())
                .with_code(code)
                .with_location(self.current.to_string())
                .with_location_type(LocationType::JSON),
        );
        self
    }

    /// Returns true if any error was added during this run.
    pub fn has_errors(&self) -> bool {
        self.collector.has_errors()
    }

    /// Returns true if an error was added at or under the absolute location.
    pub fn has_errors_at(&self, location: Option<&str>) -> bool {
        self.collector.has_errors_at(location)
    }

    /// Returns true if an error with the code was added.
    pub fn has_errors_with_code(&self, code: Option<ErrorCode>) -> bool {
        self.collector.has_errors_with_code(code)
    }

    /// Resolves a relative location against the cursor.
    ///
    /// `None` stays `None`, `Some("")` is the cursor itself. The cursor is
    /// not modified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLocation`] on an invalid escape.
    pub fn location(&self, relative: Option<&str>) -> Result<Option<String>, ConfigError> {
        let Some(relative) = relative else {
            return Ok(None);
        };

        let mut absolute = self.current.clone();
        absolute.push_many(relative)?;
        Ok(Some(absolute.to_string()))
    }

    /// Runs a validator on a nested value, with the cursor moved to the
    /// relative location for the duration of the call.
    ///
    /// `None` and `Some("")` validate in place. The validator's skip policy
    /// is honored. If the validator fails, the error propagates and the run
    /// is over; the cursor is not restored.
    pub fn validate_object<U, V>(
        &mut self,
        value: &U,
        relative: Option<&str>,
        validator: &V,
    ) -> Result<&mut Self, PreprocessingError>
    where
        U: ?Sized,
        V: Validator<U> + ?Sized,
    {
        let pushed = self.current.push_many(relative.unwrap_or(""))?;
        validator.collect_errors(value, self)?;
        self.current.pop_n(pushed);
        Ok(self)
    }

    /// Runs a validator on each element of a list, with the cursor at
    /// `relative/<index>` for each element.
    ///
    /// A `None` list is a no-op.
    pub fn validate_objects<U, V>(
        &mut self,
        values: Option<&[U]>,
        relative: Option<&str>,
        validator: &V,
    ) -> Result<&mut Self, PreprocessingError>
    where
        V: Validator<U> + ?Sized,
    {
        let Some(values) = values else {
            return Ok(self);
        };

        let pushed = self.current.push_many(relative.unwrap_or(""))?;
        for (index, value) in values.iter().enumerate() {
            self.current.push(index);
            validator.collect_errors(value, self)?;
            self.current.pop();
        }
        self.current.pop_n(pushed);
        Ok(self)
    }

    /// Dispatches to [`validate_object`](Self::validate_object) or
    /// [`validate_objects`](Self::validate_objects) depending on the shape of
    /// the value.
    pub fn validate_object_or_list<U, V>(
        &mut self,
        value: &SingleObjectOrList<U>,
        relative: Option<&str>,
        validator: &V,
    ) -> Result<&mut Self, PreprocessingError>
    where
        V: Validator<U> + ?Sized,
    {
        match value {
            SingleObjectOrList::Single(single) => self.validate_object(single, relative, validator),
            SingleObjectOrList::List(list) => {
                self.validate_objects(Some(list.as_slice()), relative, validator)
            }
        }
    }

    /// Registers a state object, keyed by its type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateState`] if a state of the same type is
    /// already registered.
    pub fn add_state<S: Any>(&mut self, state: S) -> Result<&mut Self, ConfigError> {
        self.insert_state(TypeId::of::<S>(), type_name::<S>(), Box::new(state))
    }

    /// Registers several boxed state objects, each keyed by its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateState`] on the first duplicate; the
    /// states before it stay registered.
    pub fn add_states<I>(&mut self, states: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = Box<dyn Any>>,
    {
        for state in states {
            let key = (*state).type_id();
            self.insert_state(key, "boxed state", state)?;
        }
        Ok(self)
    }

    fn insert_state(
        &mut self,
        key: TypeId,
        name: &'static str,
        state: Box<dyn Any>,
    ) -> Result<&mut Self, ConfigError> {
        if self.states.contains_key(&key) {
            return Err(ConfigError::DuplicateState(name.to_string()));
        }
        self.states.insert(key, state);
        Ok(self)
    }

    /// Returns the state object registered for `S`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingState`] if none is registered.
    pub fn state<S: Any>(&self) -> Result<&S, ConfigError> {
        self.states
            .get(&TypeId::of::<S>())
            .and_then(|state| state.downcast_ref::<S>())
            .ok_or_else(|| ConfigError::MissingState(type_name::<S>().to_string()))
    }

    /// Returns the state object registered for `S`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingState`] if none is registered.
    pub fn state_mut<S: Any>(&mut self) -> Result<&mut S, ConfigError> {
        self.states
            .get_mut(&TypeId::of::<S>())
            .and_then(|state| state.downcast_mut::<S>())
            .ok_or_else(|| ConfigError::MissingState(type_name::<S>().to_string()))
    }

    /// Removes and returns the state object registered for `S`.
    pub fn take_state<S: Any>(&mut self) -> Option<S> {
        self.states
            .remove(&TypeId::of::<S>())
            .and_then(|state| state.downcast::<S>().ok())
            .map(|state| *state)
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext")
            .field("current", &self.current.to_string())
            .field("errors", &self.collector.len())
            .field("states", &self.states.len())
            .finish()
    }
}

/// A value that arrives either as one object or as a list of objects.
///
/// Deserializes from a JSON object or a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleObjectOrList<T> {
    List(Vec<T>),
    Single(T),
}

impl<T> SingleObjectOrList<T> {
    /// Returns true if the value arrived as a list.
    pub fn is_list(&self) -> bool {
        matches!(self, SingleObjectOrList::List(_))
    }

    /// Returns the elements, a single object counting as one.
    pub fn as_slice(&self) -> &[T] {
        match self {
            SingleObjectOrList::Single(single) => std::slice::from_ref(single),
            SingleObjectOrList::List(list) => list,
        }
    }

    /// Consumes the value and returns its elements.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            SingleObjectOrList::Single(single) => vec![single],
            SingleObjectOrList::List(list) => list,
        }
    }
}
