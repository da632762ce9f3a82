//! Per-run preprocessing configuration.

use std::any::Any;

use crate::constraint::ValidationGroup;
use crate::error::ConfigError;
use crate::validation::ValidationContext;
use crate::validator::Validator;

/// Configuration for one preprocessing run.
///
/// Owns the run's [`ValidationContext`], so every stage of a chain reports
/// into the same collector. Create one per run.
///
/// # Example
///
/// ```rust
/// use pinpoint::{validator, PreprocessingConfig, ValidationContext, ValidationGroup};
/// use serde_json::Value;
///
/// struct Tenant(&'static str);
///
/// let config = PreprocessingConfig::<Value>::new()
///     .validate_only([ValidationGroup::DEFAULT, ValidationGroup::new("create")])
///     .validate_with(validator::from_fn(|_: &Value, _: &mut ValidationContext| Ok(())))
///     .validate_patch()
///     .with_state(Tenant("acme"))
///     .unwrap();
///
/// assert_eq!(config.groups().len(), 2);
/// assert_eq!(config.validators().len(), 1);
/// assert!(config.is_patch_validation_enabled());
/// assert_eq!(config.context().state::<Tenant>().unwrap().0, "acme");
/// ```
pub struct PreprocessingConfig<T: ?Sized> {
    context: ValidationContext,
    groups: Vec<ValidationGroup>,
    validators: Vec<Box<dyn Validator<T>>>,
    patch_validation: bool,
}

impl<T: ?Sized> PreprocessingConfig<T> {
    /// Creates a configuration with a fresh context, the default group, no
    /// extra validators and patch validation disabled.
    pub fn new() -> Self {
        Self {
            context: ValidationContext::new(),
            groups: Vec::new(),
            validators: Vec::new(),
            patch_validation: false,
        }
    }

    /// Restricts constraint checking to the given groups.
    ///
    /// Without this call, only [`ValidationGroup::DEFAULT`] constraints run.
    pub fn validate_only<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = ValidationGroup>,
    {
        self.groups.extend(groups);
        self
    }

    /// Adds a validator run by the validation stage, after constraints.
    pub fn validate_with<V>(mut self, validator: V) -> Self
    where
        V: Validator<T> + 'static,
    {
        self.validators.push(Box::new(validator));
        self
    }

    /// Enables patch validation: constraint violations are only reported on
    /// explicitly set top-level properties.
    pub fn validate_patch(mut self) -> Self {
        self.patch_validation = true;
        self
    }

    /// Registers a state object in the run's context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateState`] if a state of the same type is
    /// already registered.
    pub fn with_state<S: Any>(mut self, state: S) -> Result<Self, ConfigError> {
        self.context.add_state(state)?;
        Ok(self)
    }

    /// Registers several boxed state objects in the run's context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateState`] on the first duplicate.
    pub fn with_states<I>(mut self, states: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Box<dyn Any>>,
    {
        self.context.add_states(states)?;
        Ok(self)
    }

    /// Returns the validation context errors are collected into.
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Returns the validation context for adding errors or state.
    pub fn context_mut(&mut self) -> &mut ValidationContext {
        &mut self.context
    }

    /// The requested groups; empty means the default group.
    pub fn groups(&self) -> &[ValidationGroup] {
        &self.groups
    }

    /// Returns the validators run by the validation stage, in order.
    pub fn validators(&self) -> &[Box<dyn Validator<T>>] {
        &self.validators
    }

    /// Returns true if constraint violations are filtered by the patch's set properties.
    pub fn is_patch_validation_enabled(&self) -> bool {
        self.patch_validation
    }

    /// Consumes the configuration and returns its context.
    pub fn into_context(self) -> ValidationContext {
        self.context
    }

    /// Borrows the context mutably and the validators immutably at once.
    pub(crate) fn split_mut(&mut self) -> (&mut ValidationContext, &[Box<dyn Validator<T>>]) {
        (&mut self.context, &self.validators)
    }
}

impl<T: ?Sized> Default for PreprocessingConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for PreprocessingConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessingConfig")
            .field("context", &self.context)
            .field("groups", &self.groups)
            .field("validators", &self.validators.len())
            .field("patch_validation", &self.patch_validation)
            .finish()
    }
}
