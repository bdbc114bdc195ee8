//! Shared request/response models and error types for the evaluation service.

pub mod error;
pub mod types;

pub use error::EvalError;
pub use types::{BasicResponse, ResourceMetrics, Sample, TestSpec, Verdict};
