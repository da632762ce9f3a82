//! The error report handed back to callers.

use std::fmt::{self, Display};

use serde::Serialize;

use super::api_error::{ApiError, ErrorCode, LocationType};
use super::collector::ErrorCollector;
use super::config::ConfigError;

/// An error report with an HTTP status.
///
/// Serializes to `{"errors": [...]}`; the status travels out of band.
///
/// # Example
///
/// ```rust
/// use pinpoint::{ApiErrorResponse, ErrorCode, LocationType};
///
/// const NOT_FOUND: ErrorCode = ErrorCode::new(404_01, 404);
///
/// let response = ApiErrorResponse::single(
///     "no such user",
///     Some("/userId".to_string()),
///     Some(LocationType::JSON),
///     NOT_FOUND,
/// )
/// .unwrap();
/// assert_eq!(response.status_code(), 404);
///
/// assert!(ApiErrorResponse::new(302).is_err());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    #[serde(skip)]
    status_code: u16,
    #[serde(flatten)]
    collector: ErrorCollector,
}

impl ApiErrorResponse {
    /// Creates an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStatusCode`] unless the status is in 400..=599.
    pub fn new(status_code: u16) -> Result<Self, ConfigError> {
        Self::from_collector(status_code, ErrorCollector::new())
    }

    /// Wraps the errors accumulated by a validation run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStatusCode`] unless the status is in 400..=599.
    pub fn from_collector(status_code: u16, collector: ErrorCollector) -> Result<Self, ConfigError> {
        if !(400..=599).contains(&status_code) {
            return Err(ConfigError::InvalidStatusCode(status_code));
        }
        Ok(Self {
            status_code,
            collector,
        })
    }

    /// Creates a one-error report using the code's default status.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStatusCode`] if the code's default status
    /// is outside 400..=599.
    pub fn single(
        message: impl Into<String>,
        location: Option<String>,
        location_type: Option<LocationType>,
        code: ErrorCode,
    ) -> Result<Self, ConfigError> {
        let mut response = Self::new(code.default_status())?;
        response.collector.add(
            ApiError::new(message)
                .with_code(code)
                .with_location(location)
                .with_location_type(location_type),
        );
        Ok(response)
    }

    /// Appends an error.
    pub fn add(&mut self, error: ApiError) -> &mut Self {
        self.collector.add(error);
        self
    }

    /// Returns the HTTP status of the report.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the errors in insertion order.
    pub fn errors(&self) -> &[ApiError] {
        self.collector.errors()
    }

    /// Returns true if the report holds at least one error.
    pub fn has_errors(&self) -> bool {
        self.collector.has_errors()
    }

    /// Returns the underlying collector, with its lookup indexes.
    pub fn collector(&self) -> &ErrorCollector {
        &self.collector
    }

    /// Consumes the report and returns its collector.
    pub fn into_collector(self) -> ErrorCollector {
        self.collector
    }
}

/// A report with at least one error, raised as an error value.
///
/// This is what a failed run returns inside
/// [`ValidationResult`](crate::ValidationResult).
#[derive(Debug, Clone)]
pub struct ApiErrors(ApiErrorResponse);

impl ApiErrors {
    /// Wraps a report.
    pub fn new(response: ApiErrorResponse) -> Self {
        Self(response)
    }

    /// Returns the HTTP status of the report.
    pub fn status_code(&self) -> u16 {
        self.0.status_code()
    }

    /// Returns the errors in insertion order.
    pub fn errors(&self) -> &[ApiError] {
        self.0.errors()
    }

    /// Returns the number of errors in the report.
    pub fn len(&self) -> usize {
        self.0.errors().len()
    }

    /// Returns true if the report holds no errors.
    pub fn is_empty(&self) -> bool {
        self.0.errors().is_empty()
    }

    /// Returns the errors reported at exactly this location.
    pub fn at_location(&self, location: &str) -> Vec<&ApiError> {
        self.errors()
            .iter()
            .filter(|e| e.location() == Some(location))
            .collect()
    }

    /// Returns the errors reported with this code.
    pub fn with_code(&self, code: ErrorCode) -> Vec<&ApiError> {
        self.errors()
            .iter()
            .filter(|e| e.code().map(|c| c.code()) == Some(code.code()))
            .collect()
    }

    /// Returns the wrapped report.
    pub fn response(&self) -> &ApiErrorResponse {
        &self.0
    }

    /// Unwraps the report.
    pub fn into_response(self) -> ApiErrorResponse {
        self.0
    }
}

impl Display for ApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Validation failed with {} error(s) (status {}):",
            self.len(),
            self.status_code()
        )?;
        for (i, error) in self.errors().iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiErrors {}

impl From<ApiErrorResponse> for ApiErrors {
    fn from(response: ApiErrorResponse) -> Self {
        Self(response)
    }
}

// Reports cross thread boundaries when chains run in parallel.
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ApiErrors>();
    assert_sync::<ApiErrors>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INVALID: ErrorCode = ErrorCode::new(1000, 422);

    #[test]
    fn test_status_code_range() {
        assert!(ApiErrorResponse::new(400).is_ok());
        assert!(ApiErrorResponse::new(599).is_ok());
        assert_eq!(
            ApiErrorResponse::new(399).unwrap_err(),
            ConfigError::InvalidStatusCode(399)
        );
        assert_eq!(
            ApiErrorResponse::new(600).unwrap_err(),
            ConfigError::InvalidStatusCode(600)
        );
    }

    #[test]
    fn test_single_uses_default_status() {
        let response = ApiErrorResponse::single("bad", None, None, INVALID).unwrap();
        assert_eq!(response.status_code(), 422);
        assert_eq!(response.errors().len(), 1);
        assert!(response.collector().has_errors_with_code(Some(INVALID)));
    }

    #[test]
    fn test_single_rejects_code_with_success_status() {
        let odd = ErrorCode::new(1, 200);
        assert_eq!(
            ApiErrorResponse::single("bad", None, None, odd).unwrap_err(),
            ConfigError::InvalidStatusCode(200)
        );
    }

    #[test]
    fn test_serializes_errors_only() {
        let mut response = ApiErrorResponse::new(422).unwrap();
        response.add(ApiError::new("first").with_location("/a".to_string()));
        response.add(ApiError::new("second").with_code(INVALID));

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "errors": [
                    {"message": "first", "code": null, "location": "/a", "locationType": null},
                    {"message": "second", "code": 1000, "location": null, "locationType": null}
                ]
            })
        );
    }

    #[test]
    fn test_api_errors_lookup_and_display() {
        let mut response = ApiErrorResponse::new(422).unwrap();
        response.add(
            ApiError::new("required")
                .with_location("/name".to_string())
                .with_code(INVALID),
        );
        response.add(ApiError::new("too long").with_location("/bio".to_string()));

        let errors = ApiErrors::new(response);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.at_location("/name").len(), 1);
        assert_eq!(errors.with_code(INVALID).len(), 1);

        let display = errors.to_string();
        assert!(display.contains("2 error(s)"));
        assert!(display.contains("/name: required [code 1000]"));
        assert!(display.contains("/bio: too long"));
    }
}
