use crate::validation::ValidationError;
use thiserror::Error;

/// Coarse classification of a [`FitError`], for callers that need to branch
/// on the failure class without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Authentication,
    Persistence,
}

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("Weight entry not found: {0}")]
    WeightEntryNotFound(String),

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl FitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FitError::Validation(_) => ErrorKind::Validation,
            FitError::ActivityNotFound(_)
            | FitError::WeightEntryNotFound(_)
            | FitError::UserNotFound => ErrorKind::NotFound,
            FitError::Conflict(_) => ErrorKind::Conflict,
            FitError::AuthenticationFailed => ErrorKind::Authentication,
            FitError::Io(_)
            | FitError::Serialization(_)
            | FitError::Database(_)
            | FitError::Password(_)
            | FitError::Config(_)
            | FitError::Store(_) => ErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, FitError>;
