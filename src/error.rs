//! Error types for Careflow.
//!
//! All errors in Careflow are represented by the `CareflowError` enum.
//! A missing node id is not an error: tree mutations report it through
//! [`Outcome::NotFound`](crate::Outcome).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Careflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum CareflowError {
    /// A tree mutation would break a structural invariant. The tree is left untouched.
    #[error("{0}")]
    Structural(String),

    /// A node could not be compiled into an executable step.
    #[error("node {node_id}: {message}")]
    Compile {
        node_id: String,
        message: String,
    },

    /// The persistence collaborator rejected or failed a round trip.
    #[error("{0}")]
    Persistence(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl CareflowError {
    pub(crate) fn compile(
        node_id: &str,
        message: impl Into<String>,
    ) -> Self {
        CareflowError::Compile {
            node_id: node_id.to_string(),
            message: message.into(),
        }
    }
}

impl From<CareflowError> for String {
    fn from(val: CareflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for CareflowError {
    fn from(error: std::io::Error) -> Self {
        CareflowError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for CareflowError {
    fn from(error: serde_json::Error) -> Self {
        CareflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for CareflowError {
    fn from(error: toml::de::Error) -> Self {
        CareflowError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for CareflowError {
    fn from(error: reqwest::Error) -> Self {
        CareflowError::Persistence(error.to_string())
    }
}
