//! # Pinpoint
//!
//! A validation pipeline that accumulates ALL validation errors and reports
//! each one at the exact JSON Pointer location where it occurred.
//!
//! ## Overview
//!
//! An object goes through a chain of preprocessing stages: annotated fields
//! are normalized, declarative constraints are checked, then custom
//! validators run. Problems never stop the chain; they accumulate in a
//! collector and come back as a single report shaped like
//! `{"errors": [{"message", "code", "location", "locationType"}]}` with a
//! 4xx/5xx status. Run outcomes use stillwater's `Validation` type.
//!
//! ## Core Types
//!
//! - [`JsonPointer`]: the cursor that tracks the current location
//! - [`ValidationContext`]: couples the cursor with an [`ErrorCollector`]
//! - [`Validator`]: custom validation logic, with a skip-on-previous-errors policy
//! - [`PreprocessingChain`]: ordered, short-circuiting preprocessing stages
//! - [`PreprocessingContext`]: runs a chain once and produces an [`ApiErrorResponse`]
//!
//! ## Example
//!
//! ```rust
//! use pinpoint::{
//!     ConstraintKind, ConverterTable, DefaultPreprocessingChain, ErrorCode, FieldRules,
//!     ModifierRegistry, PreprocessingChain, PreprocessingConfig, PreprocessingContext, RuleSet,
//! };
//! use serde_json::{json, Value};
//!
//! const REQUIRED: ErrorCode = ErrorCode::new(10_000, 422);
//!
//! let chain: PreprocessingChain<Value> = DefaultPreprocessingChain::new(
//!     ModifierRegistry::with_defaults(),
//!     RuleSet::new().field("name", FieldRules::new().not_null()),
//!     ConverterTable::new().with_code(ConstraintKind::NOT_NULL, REQUIRED),
//! );
//!
//! let mut context = PreprocessingContext::new(&chain, PreprocessingConfig::new());
//! let result = context.process(&mut json!({"name": null})).unwrap();
//!
//! let errors = result.into_result().unwrap_err();
//! assert_eq!(
//!     serde_json::to_value(errors.response()).unwrap(),
//!     json!({"errors": [{
//!         "message": "must not be null",
//!         "code": 10000,
//!         "location": "/name",
//!         "locationType": "json"
//!     }]})
//! );
//! ```

pub mod constraint;
pub mod error;
pub mod patch;
pub mod path;
pub mod preprocessing;
pub mod registry;
pub mod validation;
pub mod validator;

pub use constraint::{
    ConstraintContext, ConstraintConverter, ConstraintEngine, ConstraintKind, ConstraintViolation,
    ConverterTable, FieldRules, PropertyNode, RuleSet, ValidationGroup,
};
pub use error::{
    ApiError, ApiErrorResponse, ApiErrors, ConfigError, ErrorCode, ErrorCollector, LocationType,
    PreprocessingError,
};
pub use patch::{JsonRoot, Patch, PatchObject, Payload};
pub use path::{JsonPointer, PathSegment};
pub use preprocessing::{
    Annotation, ConstraintPreprocessor, DefaultPreprocessingChain, FieldDescriptor, FieldMut,
    Modifiable, Modifier, ModifiersPreprocessor, PreprocessingChain, PreprocessingConfig,
    PreprocessingContext, Preprocessor, ShapeId, TrimModifier, ValidationPreprocessor,
    UNPROCESSABLE_ENTITY,
};
pub use registry::ModifierRegistry;
pub use validation::{SingleObjectOrList, ValidationContext};
pub use validator::{Guarded, SkipLocations, Validator};

/// Type alias for run outcomes: `Failure` carries the error report.
pub type ValidationResult<T> = stillwater::Validation<T, ApiErrors>;
