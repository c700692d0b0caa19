//! Error types for mozvault-core

use thiserror::Error;

/// Result type alias using mozvault-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for mozvault
#[derive(Error, Debug)]
pub enum Error {
    /// Registry, profile, or path absent
    #[error("{what} not found: {path}")]
    NotFound { what: String, path: String },

    /// Malformed registry or preferences content
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Missing or invalid required field
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Duplicate id/name, or a destination that already exists
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Profile is in active use by its application
    #[error("Profile is locked: found '{lock_file}' in {profile_dir}")]
    Locked {
        profile_dir: String,
        lock_file: String,
    },

    /// Archive backend operation called outside its valid session state
    #[error("Invalid session state: {operation} requires {required}, session is {actual}")]
    State {
        operation: String,
        required: String,
        actual: String,
    },

    /// Filesystem operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem operation failed, with the path it concerned
    #[error("IO error at {path}: {message}")]
    IoAt { path: String, message: String },
}

impl Error {
    /// Create a not-found error
    pub fn not_found(what: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a locked-profile error
    pub fn locked(profile_dir: impl Into<String>, lock_file: impl Into<String>) -> Self {
        Self::Locked {
            profile_dir: profile_dir.into(),
            lock_file: lock_file.into(),
        }
    }

    /// Create a session-state error
    pub fn state(
        operation: impl Into<String>,
        required: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::State {
            operation: operation.into(),
            required: required.into(),
            actual: actual.into(),
        }
    }

    /// Create an IO error that names the path it concerned
    pub fn io_at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IoAt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True if this is a session-state violation
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// True if this is a conflict (duplicate or already-exists)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// True if this is a locked-profile refusal
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}
