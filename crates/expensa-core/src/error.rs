//! Error types for Expensa

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Coarse classification used by callers to pick a recovery path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; re-prompt with the message
    Validation,
    /// Disk/driver/pool failure; show a generic message and abandon
    Persistence,
    /// Malformed stored or configured data
    Parse,
}

/// Message shown for any persistence failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::DuplicateCategory(_) => ErrorKind::Validation,
            Self::Json(_) | Self::Config(_) => ErrorKind::Parse,
            Self::Database(_)
            | Self::Pool(_)
            | Self::Io(_)
            | Self::NotFound(_)
            | Self::Task(_) => ErrorKind::Persistence,
        }
    }

    /// Text suitable for the UI error state
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Persistence | ErrorKind::Parse => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
