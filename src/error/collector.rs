//! Error accumulation with location and code indexes.

use std::collections::HashSet;

use serde::Serialize;

use super::api_error::{ApiError, ErrorCode};

/// Collects validation errors in the order they are reported.
///
/// Besides the ordered error list, the collector keeps two append-only
/// indexes so that lookups during validation are O(1):
///
/// - every location of a reported error together with all of its ancestors
///   (excluding the root), so that `/person/children/0/name` marks `/person`,
///   `/person/children`, `/person/children/0` and `/person/children/0/name`;
///   errors without a location are indexed under `None`;
/// - every reported code, with `None` for errors without one.
///
/// An error reported exactly at the root location (`""`) indexes `""` itself.
///
/// # Example
///
/// ```rust
/// use pinpoint::{ApiError, ErrorCollector};
///
/// let mut collector = ErrorCollector::new();
/// collector.add(ApiError::new("invalid").with_location("/a/b/c".to_string()));
///
/// assert!(collector.has_errors_at(Some("/a")));
/// assert!(collector.has_errors_at(Some("/a/b/c")));
/// assert!(!collector.has_errors_at(Some("/a/bb")));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorCollector {
    errors: Vec<ApiError>,
    #[serde(skip)]
    known_locations: HashSet<Option<String>>,
    #[serde(skip)]
    known_codes: HashSet<Option<i32>>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error and indexes its code and location.
    pub fn add(&mut self, error: ApiError) -> &mut Self {
        self.known_codes.insert(error.code().map(|code| code.code()));

        match error.location() {
            None => {
                self.known_locations.insert(None);
            }
            Some("") => {
                self.known_locations.insert(Some(String::new()));
            }
            Some(location) => {
                // Fragments are escaped, so every '/' is a separator.
                let mut prefix = location;
                while !prefix.is_empty() {
                    self.known_locations.insert(Some(prefix.to_string()));
                    prefix = match prefix.rfind('/') {
                        Some(idx) => &prefix[..idx],
                        None => "",
                    };
                }
            }
        }

        self.errors.push(error);
        self
    }

    /// Returns true if at least one error was added.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if an error was added at or under the absolute location.
    ///
    /// `None` matches errors that were added without a location. Only whole
    /// fragments match: an error at `/a/bc` does not mark `/a/b`.
    pub fn has_errors_at(&self, location: Option<&str>) -> bool {
        self.known_locations
            .contains(&location.map(str::to_string))
    }

    /// Returns true if an error with the code was added.
    ///
    /// `None` matches errors that were added without a code.
    pub fn has_errors_with_code(&self, code: Option<ErrorCode>) -> bool {
        self.known_codes.contains(&code.map(|code| code.code()))
    }

    /// Returns the errors in insertion order.
    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    /// Returns an iterator over the errors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ApiError> {
        self.errors.iter()
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no error was added.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the collector and returns the errors in insertion order.
    pub fn into_errors(self) -> Vec<ApiError> {
        self.errors
    }
}

impl Extend<ApiError> for ErrorCollector {
    fn extend<I: IntoIterator<Item = ApiError>>(&mut self, iter: I) {
        for error in iter {
            self.add(error);
        }
    }
}

impl FromIterator<ApiError> for ErrorCollector {
    fn from_iter<I: IntoIterator<Item = ApiError>>(iter: I) -> Self {
        let mut collector = Self::new();
        collector.extend(iter);
        collector
    }
}

impl<'a> IntoIterator for &'a ErrorCollector {
    type Item = &'a ApiError;
    type IntoIter = std::slice::Iter<'a, ApiError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
