//! Preprocessing pipeline.
//!
//! A [`PreprocessingChain`] runs ordered [`Preprocessor`] stages over one
//! object. The canonical chain has three stages:
//!
//! 1. [`ModifiersPreprocessor`]: normalizes annotated fields in place.
//! 2. [`ConstraintPreprocessor`]: runs a [`ConstraintEngine`] and reports
//!    its violations.
//! 3. [`ValidationPreprocessor`]: runs the configured [`Validator`]s.
//!
//! Validation errors accumulate in the configuration's context and never
//! stop the chain; a stage returning `Ok(false)` does.
//!
//! [`ConstraintEngine`]: crate::ConstraintEngine
//! [`Validator`]: crate::Validator

mod config;
mod constraints;
mod context;
mod modifiers;
mod trim;
mod validators;

pub use config::PreprocessingConfig;
pub use constraints::ConstraintPreprocessor;
pub use context::{PreprocessingContext, UNPROCESSABLE_ENTITY};
pub use modifiers::{
    Annotation, FieldDescriptor, FieldMut, Modifiable, Modifier, ModifiersPreprocessor, ShapeId,
};
pub use trim::TrimModifier;
pub use validators::ValidationPreprocessor;

use rayon::prelude::*;
use std::sync::Arc;

use crate::constraint::{ConstraintConverter, ConstraintEngine};
use crate::error::PreprocessingError;
use crate::patch::Payload;
use crate::registry::ModifierRegistry;
use crate::ValidationResult;

/// One stage of a preprocessing chain.
///
/// Stages are shared between concurrent runs, so they must be `Send + Sync`;
/// per-run state lives in the [`PreprocessingConfig`].
pub trait Preprocessor<T: ?Sized>: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Processes the object.
    ///
    /// Returns `Ok(false)` to stop the chain. Validation problems go to the
    /// config's context and do not by themselves make this return `false`.
    fn process(
        &self,
        value: &mut T,
        config: &mut PreprocessingConfig<T>,
    ) -> Result<bool, PreprocessingError>;
}

/// Ordered preprocessors that stop at the first one returning `false`.
///
/// A chain is itself a [`Preprocessor`], so chains nest.
///
/// # Example
///
/// ```rust
/// use pinpoint::{PreprocessingChain, PreprocessingConfig, ValidationPreprocessor};
/// use serde_json::{json, Value};
///
/// let chain = PreprocessingChain::<Value>::new().add(ValidationPreprocessor);
///
/// let mut config = PreprocessingConfig::new();
/// let mut value = json!({});
/// assert!(pinpoint::Preprocessor::process(&chain, &mut value, &mut config).unwrap());
/// ```
pub struct PreprocessingChain<T: ?Sized> {
    preprocessors: Vec<Box<dyn Preprocessor<T>>>,
}

impl<T: ?Sized> PreprocessingChain<T> {
    /// Creates an empty chain, which always succeeds.
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
        }
    }

    /// Appends a stage and returns self for chaining.
    pub fn add<P>(mut self, preprocessor: P) -> Self
    where
        P: Preprocessor<T> + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Appends a stage.
    pub fn push<P>(&mut self, preprocessor: P) -> &mut Self
    where
        P: Preprocessor<T> + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Returns the number of preprocessors in the chain.
    pub fn len(&self) -> usize {
        self.preprocessors.len()
    }

    /// Returns true if the chain has no preprocessors.
    pub fn is_empty(&self) -> bool {
        self.preprocessors.is_empty()
    }

    /// Returns the stage names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.preprocessors.iter().map(|p| p.name()).collect()
    }
}

impl<T: Send> PreprocessingChain<T> {
    /// Processes independent objects in parallel.
    ///
    /// Each object gets its own configuration from `configure` and its own
    /// [`PreprocessingContext`] with default settings. Results are returned
    /// in input order.
    pub fn process_all<F>(
        &self,
        values: &mut [T],
        configure: F,
    ) -> Vec<Result<ValidationResult<bool>, PreprocessingError>>
    where
        F: Fn() -> PreprocessingConfig<T> + Sync,
    {
        values
            .par_iter_mut()
            .map(|value| PreprocessingContext::new(self, configure()).process(value))
            .collect()
    }
}

impl<T: ?Sized> Default for PreprocessingChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for PreprocessingChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessingChain")
            .field("preprocessors", &self.names())
            .finish()
    }
}

impl<T: ?Sized> Preprocessor<T> for PreprocessingChain<T> {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn process(
        &self,
        value: &mut T,
        config: &mut PreprocessingConfig<T>,
    ) -> Result<bool, PreprocessingError> {
        for preprocessor in &self.preprocessors {
            let stage = preprocessor.name();
            tracing::debug!(stage, "running preprocessor");

            if !preprocessor.process(value, config)? {
                tracing::debug!(stage, "preprocessor stopped the chain");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// The canonical modifiers, constraints, validators chain.
pub struct DefaultPreprocessingChain;

impl DefaultPreprocessingChain {
    /// Assembles the three canonical stages.
    ///
    /// ```rust
    /// use pinpoint::{
    ///     ConverterTable, DefaultPreprocessingChain, FieldRules, ModifierRegistry, RuleSet,
    /// };
    /// use pinpoint::PreprocessingChain;
    /// use serde_json::Value;
    ///
    /// let rules = RuleSet::new().field("name", FieldRules::new().not_null());
    /// let chain: PreprocessingChain<Value> = DefaultPreprocessingChain::new(
    ///     ModifierRegistry::with_defaults(),
    ///     rules,
    ///     ConverterTable::new(),
    /// );
    /// assert_eq!(chain.names(), vec!["modifiers", "constraints", "validators"]);
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T, E, C>(modifiers: ModifierRegistry, engine: E, converter: C) -> PreprocessingChain<T>
    where
        T: Modifiable + Payload + 'static,
        E: ConstraintEngine<T> + 'static,
        C: ConstraintConverter + 'static,
    {
        PreprocessingChain::new()
            .add(ModifiersPreprocessor::new(modifiers))
            .add(ConstraintPreprocessor::new(engine, Arc::new(converter)))
            .add(ValidationPreprocessor)
    }
}
