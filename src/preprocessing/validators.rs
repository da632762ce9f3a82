use super::{PreprocessingConfig, Preprocessor};
use crate::error::PreprocessingError;

/// Runs the validators of the configuration, in order, at the root location.
///
/// Validators report through the run's context; this stage always returns
/// `true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPreprocessor;

impl<T: ?Sized> Preprocessor<T> for ValidationPreprocessor {
    fn name(&self) -> &'static str {
        "validators"
    }

    fn process(
        &self,
        value: &mut T,
        config: &mut PreprocessingConfig<T>,
    ) -> Result<bool, PreprocessingError> {
        let (ctx, validators) = config.split_mut();
        for validator in validators {
            validator.collect_errors(value, ctx)?;
        }
        Ok(true)
    }
}
