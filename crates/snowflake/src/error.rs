//! Error types for the Snowflake connector

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during connector operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Failed to initialize connector (e.g., HTTP client creation failed)
    #[error("failed to initialize connector: {0}")]
    Init(String),

    /// HTTP request to the warehouse failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host has no authentication details for this connection
    #[error("unknown connection: {0}")]
    UnknownConnection(Uuid),

    /// Authentication map is missing a required key
    #[error("authentication details missing required key '{0}'")]
    MissingAuthKey(&'static str),

    /// Warehouse rejected the login
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Session token expired or was revoked
    #[error("session expired")]
    SessionExpired,

    /// Statement was rejected by the warehouse
    #[error("statement failed ({code}): {message}")]
    Execution {
        /// Warehouse error code
        code: String,
        /// Warehouse error message
        message: String,
    },

    /// Container model cannot produce valid DDL
    #[error("invalid container model: {0}")]
    InvalidModel(String),

    /// Upsert requested with no rows
    #[error("upsert requested for an empty batch")]
    EmptyBatch,

    /// Record payload could not be interpreted
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Operation exceeded its deadline
    #[error("operation timed out")]
    Timeout,

    /// Sync scheduler has stopped or its command queue is full
    #[error("sync scheduler unavailable")]
    SchedulerUnavailable,
}

impl ConnectorError {
    /// Create an execution error
    pub fn execution(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(msg: impl Into<String>) -> Self {
        Self::InvalidModel(msg.into())
    }
}
