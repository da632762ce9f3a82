//! The constraint stage.

use std::sync::Arc;

use super::{PreprocessingConfig, Preprocessor};
use crate::constraint::{ConstraintConverter, ConstraintEngine};
use crate::error::{ConfigError, PreprocessingError};
use crate::patch::Payload;
use crate::path::unescape;

/// Runs a constraint engine and reports its violations as errors.
///
/// For each violation, the property path becomes a pointer. For a
/// [`JsonRoot`](crate::JsonRoot) the envelope key is removed first. In patch
/// mode, violations on top-level properties that were not explicitly set are
/// dropped; violations on the object itself are always kept. The code and
/// location type come from the converter. Always returns `true`.
pub struct ConstraintPreprocessor<E> {
    engine: E,
    converter: Arc<dyn ConstraintConverter>,
}

impl<E> ConstraintPreprocessor<E> {
    /// Creates the stage from an engine and a violation converter.
    pub fn new(engine: E, converter: Arc<dyn ConstraintConverter>) -> Self {
        Self { engine, converter }
    }

    /// Returns the constraint engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<T, E> Preprocessor<T> for ConstraintPreprocessor<E>
where
    T: Payload + ?Sized,
    E: ConstraintEngine<T>,
{
    fn name(&self) -> &'static str {
        "constraints"
    }

    fn process(
        &self,
        value: &mut T,
        config: &mut PreprocessingConfig<T>,
    ) -> Result<bool, PreprocessingError> {
        let patch = if config.is_patch_validation_enabled() {
            Some(value.as_patch().ok_or(ConfigError::NotAPatchObject)?)
        } else {
            None
        };

        let violations = self.engine.validate(value, config.groups())?;
        if violations.is_empty() {
            return Ok(true);
        }

        let json_root = value.is_json_root();
        let context = config.context_mut();
        for violation in violations {
            let mut pointer = violation.pointer();
            if json_root {
                pointer.pop_first();
            }

            if let (Some(patch), Ok(property)) = (patch, pointer.fragment_at(0)) {
                if !patch.is_property_set(&unescape(property)) {
                    tracing::trace!(
                        location = %pointer,
                        "dropping violation on a property the patch does not set"
                    );
                    continue;
                }
            }

            let kind = violation.kind();
            let location = pointer.to_string();
            context.add_error(
                Some(location.as_str()),
                self.converter.location_type(kind),
                self.converter.error_code(kind),
                violation.message(),
            )?;
        }
        Ok(true)
    }
}

impl<E> std::fmt::Debug for ConstraintPreprocessor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintPreprocessor").finish_non_exhaustive()
    }
}
