//! Error types for Cukerun

use thiserror::Error;

/// Result type alias using Cukerun Error
pub type Result<T> = std::result::Result<T, Error>;

/// Cukerun error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: String, id: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Failed to spawn `{program}`: {reason}")]
    SpawnFailure { program: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl Error {
    /// Shorthand for an unknown run token.
    pub fn run_not_found(token: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "Test run".to_string(),
            id: token.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::run_not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Test run not found: abc");
    }

    #[test]
    fn test_spawn_failure_message() {
        let err = Error::SpawnFailure {
            program: "npx".to_string(),
            reason: "No such file or directory (os error 2)".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Failed to spawn `npx`"));
        assert!(err.to_string().contains("No such file"));
    }
}
