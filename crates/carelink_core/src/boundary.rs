//! Mapping from core errors to transport outcomes.
//!
//! Infrastructure failures never leak their detail; everything else carries
//! the error's display text.

use crate::error::CoreError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP-style status code.
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl From<&CoreError> for ErrorResponse {
    fn from(err: &CoreError) -> Self {
        let status = match err {
            CoreError::MissingParams(_) | CoreError::Validation(_) | CoreError::Conflict(_) => 400,
            CoreError::Authorization(_) => 403,
            CoreError::NotFound { .. } => 404,
            CoreError::Repo(_) => 500,
        };
        let message = match err {
            CoreError::Repo(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };

        Self {
            status,
            code: err.code(),
            message,
        }
    }
}
