//! One-shot driver that turns a chain run into an error report.

use stillwater::Validation;

use super::{PreprocessingConfig, Preprocessor};
use crate::error::{ApiErrorResponse, ApiErrors, ConfigError, PreprocessingError};
use crate::ValidationResult;

/// The default status of a failed run.
pub const UNPROCESSABLE_ENTITY: u16 = 422;

/// Runs a preprocessor (usually a chain) once with a configuration.
///
/// A context is single use: [`process`](Self::process) may be called once,
/// and the result accessors fail until it has been.
///
/// # Example
///
/// ```rust
/// use pinpoint::{
///     validator, PreprocessingChain, PreprocessingConfig, PreprocessingContext,
///     ValidationContext, ValidationPreprocessor,
/// };
/// use serde_json::{json, Value};
///
/// let chain = PreprocessingChain::<Value>::new().add(ValidationPreprocessor);
/// let config = PreprocessingConfig::new().validate_with(validator::from_fn(
///     |value: &Value, ctx: &mut ValidationContext| {
///         if value.get("name").is_none() {
///             ctx.add_error(Some("/name"), None, None, "is required")?;
///         }
///         Ok(())
///     },
/// ));
///
/// let mut context = PreprocessingContext::new(&chain, config);
/// let result = context.process(&mut json!({})).unwrap();
///
/// let errors = result.into_result().unwrap_err();
/// assert_eq!(errors.status_code(), 422);
/// assert_eq!(errors.errors()[0].location(), Some("/name"));
/// ```
pub struct PreprocessingContext<'c, T: ?Sized> {
    preprocessor: &'c dyn Preprocessor<T>,
    config: PreprocessingConfig<T>,
    status_code: u16,
    fail_on_errors: bool,
    processed: bool,
    result: Option<bool>,
}

impl<'c, T: ?Sized> PreprocessingContext<'c, T> {
    /// Creates a context with status 422 that fails on errors.
    pub fn new(preprocessor: &'c dyn Preprocessor<T>, config: PreprocessingConfig<T>) -> Self {
        Self {
            preprocessor,
            config,
            status_code: UNPROCESSABLE_ENTITY,
            fail_on_errors: true,
            processed: false,
            result: None,
        }
    }

    /// Sets the status of the error report.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStatusCode`] unless the status is in 400..=599.
    pub fn status_code(mut self, status_code: u16) -> Result<Self, ConfigError> {
        if !(400..=599).contains(&status_code) {
            return Err(ConfigError::InvalidStatusCode(status_code));
        }
        self.status_code = status_code;
        Ok(self)
    }

    /// Chooses whether [`process`](Self::process) returns a failure when
    /// errors were collected. Defaults to `true`.
    pub fn fail_on_errors(mut self, fail_on_errors: bool) -> Self {
        self.fail_on_errors = fail_on_errors;
        self
    }

    /// Runs the preprocessor.
    ///
    /// With `fail_on_errors` and at least one collected error, returns
    /// `Failure` with the error report. Otherwise returns `Success` with the
    /// preprocessor's result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyProcessed`] on a second call, and any
    /// error raised by the preprocessor.
    pub fn process(&mut self, value: &mut T) -> Result<ValidationResult<bool>, PreprocessingError> {
        if self.processed {
            return Err(ConfigError::AlreadyProcessed.into());
        }
        self.processed = true;

        let result = self.preprocessor.process(value, &mut self.config)?;
        self.result = Some(result);

        if self.fail_on_errors && self.config.context().has_errors() {
            let errors = ApiErrors::new(self.response()?);
            tracing::debug!(
                errors = errors.len(),
                status = errors.status_code(),
                "preprocessing failed"
            );
            return Ok(Validation::Failure(errors));
        }
        Ok(Validation::Success(result))
    }

    /// Returns the preprocessor's result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotProcessed`] if processing has not completed.
    pub fn is_successful(&self) -> Result<bool, ConfigError> {
        self.result.ok_or(ConfigError::NotProcessed)
    }

    /// Returns true if any error was collected so far.
    pub fn has_errors(&self) -> bool {
        self.config.context().has_errors()
    }

    /// Builds the error report from the errors collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotProcessed`] if nothing was processed yet.
    pub fn response(&self) -> Result<ApiErrorResponse, ConfigError> {
        if !self.processed {
            return Err(ConfigError::NotProcessed);
        }
        ApiErrorResponse::from_collector(self.status_code, self.config.context().collector().clone())
    }

    /// Returns the configuration, including its validation context.
    pub fn config(&self) -> &PreprocessingConfig<T> {
        &self.config
    }

    /// Consumes the context and returns its configuration.
    pub fn into_config(self) -> PreprocessingConfig<T> {
        self.config
    }
}
