// src/health/error.rs
use crate::retry::RetryError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a single attempt of a readiness check failed.
///
/// Rejected credentials surface as [`CheckError::Transport`]; the drivers
/// do not let us tell them apart from an unreachable server.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("connection to {target} failed: {source}")]
    Transport { target: String, source: BoxError },

    #[error("reading response from {target} failed: {source}")]
    Response { target: String, source: BoxError },

    #[error("exec statement failed: {0}")]
    Query(#[source] BoxError),

    #[error("rows affected 0 for the query: {0}")]
    EmptyResult(String),

    #[error("ping failed after {attempts} attempts: {last}")]
    PingExhausted {
        attempts: u32,
        #[source]
        last: Box<CheckError>,
    },
}

impl CheckError {
    pub fn transport(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn response(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Response {
            target: target.into(),
            source: source.into(),
        }
    }
}

impl From<RetryError<CheckError>> for CheckError {
    fn from(err: RetryError<CheckError>) -> Self {
        Self::PingExhausted {
            attempts: err.attempts,
            last: Box::new(err.last),
        }
    }
}
