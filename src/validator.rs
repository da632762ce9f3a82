//! The validator trait and the skip-on-previous-errors policy.
//!
//! A [`Validator`] inspects a value and reports problems into a
//! [`ValidationContext`]. Before it runs, [`Validator::collect_errors`]
//! checks its skip locations: if an error was already reported at or under
//! any of them, the validator is skipped. This keeps a business rule such as
//! "the name must be unique" quiet when the name already failed a
//! "must not be blank" constraint.

use indexmap::IndexSet;
use std::sync::Arc;

use crate::error::{ConfigError, PreprocessingError};
use crate::validation::ValidationContext;

/// Relative locations that suppress a validator when they already have errors.
///
/// [`SkipLocations::CURRENT_LOCATION`] (`""`) refers to the location the
/// validator runs at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipLocations(IndexSet<String>);

impl SkipLocations {
    /// The validator's own location.
    pub const CURRENT_LOCATION: &'static str = "";

    /// Creates an empty set; the validator always runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the validator if its own location already has errors.
    pub fn at_current_location() -> Self {
        Self::new().with(Self::CURRENT_LOCATION)
    }

    /// Adds a relative location and returns self for chaining.
    pub fn with(mut self, location: impl Into<String>) -> Self {
        self.0.insert(location.into());
        self
    }

    /// Returns true if `location` is one of the skip locations.
    pub fn contains(&self, location: &str) -> bool {
        self.0.contains(location)
    }

    /// Returns the number of skip locations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no skip locations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the skip locations in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if any of the locations, resolved against the context's
    /// cursor, already has errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLocation`] if a location contains an
    /// invalid escape.
    pub fn has_previous_errors(&self, ctx: &ValidationContext) -> Result<bool, ConfigError> {
        for relative in &self.0 {
            let absolute = ctx.location(Some(relative))?;
            if ctx.has_errors_at(absolute.as_deref()) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<S: Into<String>> FromIterator<S> for SkipLocations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for SkipLocations {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// A unit of validation logic for values of type `T`.
///
/// Implementors write [`validate`](Validator::validate); callers go through
/// [`collect_errors`](Validator::collect_errors), which applies the skip
/// policy first.
///
/// # Example
///
/// ```rust
/// use pinpoint::{PreprocessingError, SkipLocations, ValidationContext, Validator};
///
/// struct UniqueName;
///
/// impl Validator<String> for UniqueName {
///     fn validate(&self, name: &String, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
///         if name == "taken" {
///             ctx.add_error_at_current_location(None, "name is already taken");
///         }
///         Ok(())
///     }
///
///     fn skip_on_previous_errors(&self) -> SkipLocations {
///         SkipLocations::at_current_location()
///     }
/// }
///
/// let mut ctx = ValidationContext::new();
/// ctx.add_error(Some("/name"), None, None, "must not be blank").unwrap();
/// ctx.validate_object(&"taken".to_string(), Some("/name"), &UniqueName).unwrap();
///
/// // The uniqueness check was skipped.
/// assert_eq!(ctx.collector().len(), 1);
/// ```
pub trait Validator<T: ?Sized> {
    /// Inspects the value and adds errors to the context.
    ///
    /// Validation problems are reported through the context; an `Err`
    /// aborts the whole run.
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError>;

    /// The statically declared skip locations. Empty by default.
    fn skip_on_previous_errors(&self) -> SkipLocations {
        SkipLocations::new()
    }

    /// The skip locations for this particular value.
    ///
    /// Defaults to [`skip_on_previous_errors`](Validator::skip_on_previous_errors).
    /// Overriding it replaces the static declaration.
    fn previous_error_locations(&self, _value: &T, _ctx: &ValidationContext) -> SkipLocations {
        self.skip_on_previous_errors()
    }

    /// Runs [`validate`](Validator::validate) unless a skip location already
    /// has errors.
    fn collect_errors(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        let locations = self.previous_error_locations(value, ctx);
        if locations.has_previous_errors(ctx)? {
            tracing::trace!(
                location = %ctx.current_location(),
                skip_locations = ?locations,
                "skipping validator because of previous errors"
            );
            return Ok(());
        }
        self.validate(value, ctx)
    }
}

impl<T: ?Sized, V: Validator<T> + ?Sized> Validator<T> for &V {
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).validate(value, ctx)
    }

    fn skip_on_previous_errors(&self) -> SkipLocations {
        (**self).skip_on_previous_errors()
    }

    fn previous_error_locations(&self, value: &T, ctx: &ValidationContext) -> SkipLocations {
        (**self).previous_error_locations(value, ctx)
    }

    fn collect_errors(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).collect_errors(value, ctx)
    }
}

impl<T: ?Sized, V: Validator<T> + ?Sized> Validator<T> for Box<V> {
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).validate(value, ctx)
    }

    fn skip_on_previous_errors(&self) -> SkipLocations {
        (**self).skip_on_previous_errors()
    }

    fn previous_error_locations(&self, value: &T, ctx: &ValidationContext) -> SkipLocations {
        (**self).previous_error_locations(value, ctx)
    }

    fn collect_errors(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).collect_errors(value, ctx)
    }
}

impl<T: ?Sized, V: Validator<T> + ?Sized> Validator<T> for Arc<V> {
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).validate(value, ctx)
    }

    fn skip_on_previous_errors(&self) -> SkipLocations {
        (**self).skip_on_previous_errors()
    }

    fn previous_error_locations(&self, value: &T, ctx: &ValidationContext) -> SkipLocations {
        (**self).previous_error_locations(value, ctx)
    }

    fn collect_errors(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (**self).collect_errors(value, ctx)
    }
}

/// Wraps a validator with extra skip locations chosen at the call site.
///
/// The extra locations are added to whatever the wrapped validator declares,
/// including a per-value [`Validator::previous_error_locations`] override.
/// An override only replaces the wrapped validator's static
/// [`Validator::skip_on_previous_errors`] set; it never removes the
/// call-site locations added here.
///
/// ```rust
/// use pinpoint::{validator, Guarded, ValidationContext};
///
/// let check = validator::from_fn(|_: &str, ctx: &mut ValidationContext| {
///     ctx.add_error(Some("/email"), None, None, "already registered")?;
///     Ok(())
/// });
/// let guarded = Guarded::new(check).skip_on_previous_errors(["/email"]);
///
/// let mut ctx = ValidationContext::new();
/// ctx.add_error(Some("/email"), None, None, "is not an email address").unwrap();
/// ctx.validate_object("user", None, &guarded).unwrap();
/// assert_eq!(ctx.collector().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Guarded<V> {
    inner: V,
    locations: SkipLocations,
}

impl<V> Guarded<V> {
    /// Wraps a validator with no extra skip locations.
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            locations: SkipLocations::new(),
        }
    }

    /// Adds skip locations to the ones already registered.
    pub fn skip_on_previous_errors<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations.extend(locations);
        self
    }

    /// Returns the wrapped validator.
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Consumes the wrapper and returns the wrapped validator.
    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<T: ?Sized, V: Validator<T>> Validator<T> for Guarded<V> {
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        self.inner.validate(value, ctx)
    }

    fn skip_on_previous_errors(&self) -> SkipLocations {
        let mut locations = self.inner.skip_on_previous_errors();
        locations.extend(self.locations.iter());
        locations
    }

    fn previous_error_locations(&self, value: &T, ctx: &ValidationContext) -> SkipLocations {
        let mut locations = self.inner.previous_error_locations(value, ctx);
        locations.extend(self.locations.iter());
        locations
    }
}

/// A validator backed by a closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnValidator<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

/// Creates a validator from a closure.
pub fn from_fn<T, F>(f: F) -> FnValidator<F>
where
    T: ?Sized,
    F: Fn(&T, &mut ValidationContext) -> Result<(), PreprocessingError>,
{
    FnValidator { f }
}

impl<T, F> Validator<T> for FnValidator<F>
where
    T: ?Sized,
    F: Fn(&T, &mut ValidationContext) -> Result<(), PreprocessingError>,
{
    fn validate(&self, value: &T, ctx: &mut ValidationContext) -> Result<(), PreprocessingError> {
        (self.f)(value, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting<'a> {
        runs: &'a Cell<usize>,
        skip: SkipLocations,
    }

    impl Validator<str> for Counting<'_> {
        fn validate(&self, _: &str, _: &mut ValidationContext) -> Result<(), PreprocessingError> {
            self.runs.set(self.runs.get() + 1);
            Ok(())
        }

        fn skip_on_previous_errors(&self) -> SkipLocations {
            self.skip.clone()
        }
    }

    #[test]
    fn test_skip_locations_preserve_order_and_dedupe() {
        let locations: SkipLocations = ["/b", "/a", "/b"].into_iter().collect();
        assert_eq!(locations.iter().collect::<Vec<_>>(), vec!["/b", "/a"]);
        assert!(locations.contains("/a"));
    }

    #[test]
    fn test_runs_without_skip_locations() {
        let runs = Cell::new(0);
        let validator = Counting {
            runs: &runs,
            skip: SkipLocations::new(),
        };

        let mut ctx = ValidationContext::new();
        ctx.add_error(Some(""), None, None, "root error").unwrap();
        validator.collect_errors("x", &mut ctx).unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_current_location_skip() {
        let runs = Cell::new(0);
        let validator = Counting {
            runs: &runs,
            skip: SkipLocations::at_current_location(),
        };

        let mut ctx = ValidationContext::new();
        ctx.validate_object("x", Some("/a"), &validator).unwrap();
        assert_eq!(runs.get(), 1);

        ctx.add_error(Some("/a/b"), None, None, "nested error").unwrap();
        ctx.validate_object("x", Some("/a"), &validator).unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_guarded_unions_with_declared() {
        let runs = Cell::new(0);
        let validator = Counting {
            runs: &runs,
            skip: SkipLocations::new().with("/declared"),
        };
        let guarded = Guarded::new(validator).skip_on_previous_errors(["/manual"]);

        let declared = Validator::<str>::skip_on_previous_errors(&guarded);
        assert!(declared.contains("/declared"));
        assert!(declared.contains("/manual"));
    }

    #[test]
    fn test_bad_skip_location_is_fatal() {
        let runs = Cell::new(0);
        let validator = Counting {
            runs: &runs,
            skip: SkipLocations::new().with("/~x"),
        };

        let mut ctx = ValidationContext::new();
        let err = validator.collect_errors("x", &mut ctx).unwrap_err();
        assert!(matches!(
            err.as_config(),
            Some(ConfigError::MalformedLocation { .. })
        ));
        assert_eq!(runs.get(), 0);
    }
}
