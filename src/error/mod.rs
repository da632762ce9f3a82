//! Error types.
//!
//! [`ApiError`] is one reported validation problem, [`ErrorCollector`]
//! accumulates them with location and code indexes, and
//! [`ApiErrorResponse`]/[`ApiErrors`] carry the final report. Fatal errors
//! that abort a run are [`ConfigError`] and [`PreprocessingError`].

mod api_error;
mod collector;
mod config;
mod response;

pub use api_error::{ApiError, ErrorCode, LocationType};
pub use collector::ErrorCollector;
pub use config::{ConfigError, PreprocessingError};
pub use response::{ApiErrorResponse, ApiErrors};
