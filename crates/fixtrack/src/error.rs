use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("{0}")]
    Service(#[from] ServiceError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Errors surfaced to the caller of the lifecycle service. Side-effect
/// failures (notifications, email) are never represented here — they are
/// logged and recorded on the outbox row instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Wrong id or wrong tenant. The two are indistinguishable on
    /// purpose: a caller must not learn that the id exists elsewhere.
    #[error("Job not found: {id}")]
    NotFound { id: String },

    #[error("Validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The stored version moved past the caller's expected version.
    #[error("Job {id} was modified concurrently")]
    Conflict { id: String },
}

pub type Result<T> = std::result::Result<T, FixtrackError>;
