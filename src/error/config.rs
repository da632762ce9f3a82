//! Fatal error types.
//!
//! Validation problems are never raised as errors; they accumulate in an
//! [`ErrorCollector`](crate::ErrorCollector). The types here cover the two
//! other tiers: integration mistakes ([`ConfigError`]) and stage failures that
//! abort a chain ([`PreprocessingError`]).

/// A programmer or integration mistake detected while configuring or running
/// a validation.
///
/// These errors abort the current operation and are never added to an error
/// report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A location string contains a disallowed character sequence.
    #[error("malformed location '{location}': {reason}")]
    MalformedLocation {
        location: String,
        reason: &'static str,
    },

    /// A pointer fragment was requested past the end of the pointer.
    #[error("fragment index {index} is out of range for a pointer with {len} fragment(s)")]
    FragmentOutOfRange { index: usize, len: usize },

    /// An error report was given a status outside the 4xx and 5xx ranges.
    #[error("HTTP status code for an API error response must be in the 4xx or 5xx range, got {0}")]
    InvalidStatusCode(u16),

    /// A second state object was registered under the same type.
    #[error("a state object is already registered for {0}")]
    DuplicateState(String),

    /// No state object is registered under the requested type.
    #[error("no state object registered for {0}")]
    MissingState(String),

    /// Patch validation was enabled for an object that does not track set properties.
    #[error("patch validation is enabled but the processed object is not a patch object")]
    NotAPatchObject,

    /// A preprocessing context was asked to process a second object.
    #[error("this preprocessing context has already been used; create another one")]
    AlreadyProcessed,

    /// A preprocessing context was queried before processing anything.
    #[error("this preprocessing context has not been used yet; call process first")]
    NotProcessed,

    /// A constraint implementation reported an error at an unsupported location.
    #[error("invalid constraint location '{location}': {reason}")]
    InvalidConstraintLocation {
        location: String,
        reason: &'static str,
    },

    /// A modifier was registered twice for the same annotation tag.
    #[error("a modifier is already registered for annotation '{0}'")]
    DuplicateModifier(String),
}

/// An error that aborts a preprocessing chain.
///
/// Chains and validators propagate these with `?`; nothing in the crate
/// attempts to recover from them.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessingError {
    /// A configuration mistake surfaced while running.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A stage or validator failed in a way that cannot be reported as a
    /// validation error.
    #[error("preprocessing stage '{stage}' failed")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PreprocessingError {
    /// Wraps an arbitrary failure raised by the named stage.
    pub fn stage(
        stage: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PreprocessingError::Stage {
            stage,
            source: source.into(),
        }
    }

    /// Returns the configuration error, if this is one.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            PreprocessingError::Config(err) => Some(err),
            PreprocessingError::Stage { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::InvalidStatusCode(200).to_string(),
            "HTTP status code for an API error response must be in the 4xx or 5xx range, got 200"
        );
        assert_eq!(
            ConfigError::FragmentOutOfRange { index: 2, len: 1 }.to_string(),
            "fragment index 2 is out of range for a pointer with 1 fragment(s)"
        );
    }

    #[test]
    fn test_preprocessing_error_from_config() {
        let err: PreprocessingError = ConfigError::NotAPatchObject.into();
        assert_eq!(err.as_config(), Some(&ConfigError::NotAPatchObject));
        assert!(err.to_string().contains("not a patch object"));
    }

    #[test]
    fn test_stage_error_keeps_source() {
        let err = PreprocessingError::stage("constraints", "engine unavailable");
        assert!(err.as_config().is_none());
        assert_eq!(err.to_string(), "preprocessing stage 'constraints' failed");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "engine unavailable");
    }
}
