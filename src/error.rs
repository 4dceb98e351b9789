use std::time::Duration;
use thiserror::Error;

use crate::wire::Code;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed with HTTP status {status}")]
    HttpStatus { operation: &'static str, status: u16 },

    #[error("Remote status {code}: {message}")]
    Status { code: Code, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Client connection is closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse environment variable {var_name}: value '{value}' - {error}")]
    EnvParseError {
        var_name: String,
        value: String,
        error: String,
    },
}

impl ClientError {
    /// Classify a `reqwest` failure raised while performing `operation`.
    pub(crate) fn from_request(
        err: reqwest::Error,
        operation: &'static str,
        addr: &str,
        after: Duration,
    ) -> Self {
        if err.is_timeout() {
            ClientError::Timeout { operation, after }
        } else if err.is_connect() {
            ClientError::Connect {
                addr: addr.to_string(),
                source: err,
            }
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::HttpStatus {
                operation,
                status: status.as_u16(),
            }
        } else {
            ClientError::Transport(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}
