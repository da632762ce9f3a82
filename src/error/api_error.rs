//! A single reported validation error.

use std::fmt::{self, Display};

use serde::{Serialize, Serializer};

/// Identifies the kind of an error.
///
/// Codes classify errors for clients and for [`has_errors_with_code`]
/// lookups; they never drive message text. Each code carries the HTTP status
/// a one-error report should use by default.
///
/// [`has_errors_with_code`]: crate::ErrorCollector::has_errors_with_code
///
/// # Example
///
/// ```rust
/// use pinpoint::ErrorCode;
///
/// const NAME_TAKEN: ErrorCode = ErrorCode::new(10_001, 409);
/// assert_eq!(NAME_TAKEN.code(), 10_001);
/// assert!(NAME_TAKEN.is_client_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    code: i32,
    default_status: u16,
}

impl ErrorCode {
    /// Creates a code with its default HTTP status.
    pub const fn new(code: i32, default_status: u16) -> Self {
        Self {
            code,
            default_status,
        }
    }

    /// Returns the numeric code.
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Returns the default HTTP status of errors with this code.
    pub const fn default_status(&self) -> u16 {
        self.default_status
    }

    /// Returns true if the default status is in the 4xx range.
    pub const fn is_client_error(&self) -> bool {
        self.default_status >= 400 && self.default_status < 500
    }

    /// Returns true if the default status is in the 5xx range.
    pub const fn is_server_error(&self) -> bool {
        self.default_status >= 500 && self.default_status < 600
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code)
    }
}

/// Tells clients what kind of location an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LocationType(&'static str);

impl LocationType {
    /// A JSON Pointer into the request body.
    pub const JSON: LocationType = LocationType("json");

    /// Creates a location type from its wire name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the wire name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One validation problem, located by an absolute JSON Pointer.
///
/// Errors are immutable once built. The serialized form is the wire shape
/// of one entry of an error report:
///
/// ```json
/// { "message": "...", "code": 1000, "location": "/name", "locationType": "json" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    message: String,
    code: Option<ErrorCode>,
    location: Option<String>,
    location_type: Option<LocationType>,
}

impl ApiError {
    /// Creates an error with no code and no location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            location: None,
            location_type: None,
        }
    }

    /// Sets the code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<Option<ErrorCode>>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the absolute location and returns self for chaining.
    pub fn with_location(mut self, location: impl Into<Option<String>>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the location type and returns self for chaining.
    pub fn with_location_type(mut self, location_type: impl Into<Option<LocationType>>) -> Self {
        self.location_type = location_type.into();
        self
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// The absolute location, or None for errors about the request as a whole.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the location type, if any.
    pub fn location_type(&self) -> Option<LocationType> {
        self.location_type
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location.as_deref() {
            None => write!(f, "(no location): {}", self.message)?,
            Some("") => write!(f, "(root): {}", self.message)?,
            Some(location) => write!(f, "{}: {}", location, self.message)?,
        }
        if let Some(code) = self.code {
            write!(f, " [code {}]", code.code())?;
        }
        Ok(())
    }
}
