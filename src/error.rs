//! Error types for Brief Assist.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Question catalog loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Catalog collection {name:?} not found (available: {available})")]
    MissingCollection { name: String, available: String },

    #[error("Catalog {name:?} has no questions")]
    Empty { name: String },

    #[error("Duplicate question id: {id}")]
    DuplicateId { id: String },

    #[error("Invalid question {id}: {reason}")]
    InvalidQuestion { id: String, reason: String },
}

/// Conversation protocol errors.
///
/// These indicate a transport or client bug (a stale button, a replayed
/// callback) and never crash the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown question: {id}")]
    UnknownQuestion { id: String },

    #[error("Choice index {index} out of range for question {question_id} ({len} choices)")]
    IndexOutOfRange {
        question_id: String,
        index: usize,
        len: usize,
    },

    #[error("Question {id} is not multi-select")]
    NotMultiSelect { id: String },

    #[error("No active question: all questions are answered")]
    NoActiveQuestion,

    #[error("Flow incomplete: {cursor} of {total} questions answered")]
    IncompleteFlow { cursor: usize, total: usize },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Operator notification and CRM errors.
///
/// Logged and reported, never surfaced to the end user.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Operator notification failed: {reason}")]
    DispatchFailure { reason: String },

    #[error("CRM lead creation failed: {reason}")]
    CrmFailure { reason: String },

    #[error("{target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },
}
