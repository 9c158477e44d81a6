//! Error types for Statline operations

use crate::EntityType;
use thiserror::Error;

/// Errors raised by the external stats and players repositories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: i64 },

    #[error("Database error: {reason}")]
    Database { reason: String },
}

impl RepositoryError {
    pub fn not_found(entity_type: EntityType, id: i64) -> Self {
        Self::NotFound { entity_type, id }
    }

    pub fn database(reason: impl Into<String>) -> Self {
        Self::Database {
            reason: reason.into(),
        }
    }
}

/// Cache backend errors.
///
/// Only raised when the store itself fails or a value cannot be serialized.
/// A missing, expired or corrupt entry is a miss, not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Cache write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Cache delete failed for key {key}: {reason}")]
    Delete { key: String, reason: String },

    #[error("Cache list failed for prefix {prefix}: {reason}")]
    List { prefix: String, reason: String },

    #[error("Cache serialization failed for key {key}: {reason}")]
    Serialization { key: String, reason: String },
}

/// Aggregation service failure wrapping the repository error behind it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    #[source]
    pub cause: RepositoryError,
}

impl ServiceError {
    pub fn new(message: impl Into<String>, cause: RepositoryError) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown stat field: {name}")]
    UnknownStatField { name: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Statline errors.
///
/// `Cache` and `Service` are never translated into each other, so a caller can
/// tell a broken cache backend apart from a failed data fetch.
#[derive(Debug, Clone, Error)]
pub enum StatlineError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Statline operations.
pub type StatlineResult<T> = Result<T, StatlineError>;

// =============================================================================
// TESTS
// =============================================================================
