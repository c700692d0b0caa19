//! Archive session state machine.
//!
//! Every backend instance owns exactly one `ArchiveSession`. The session
//! starts `Closed`, opens for exactly one of backup or restore, and must be
//! closed before it can be opened again:
//!
//! ```text
//! Closed --open_for_backup-->  OpenForBackup --close_backup-->  Closed
//! Closed --open_for_restore--> OpenForRestore --close_restore--> Closed
//! ```
//!
//! A transition attempted from the wrong state fails with a state error and
//! leaves the session untouched, so a rejected second open keeps the first
//! session's location.

use mozvault_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Where a backend's session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    OpenForBackup,
    OpenForRestore,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Closed => "closed",
            SessionState::OpenForBackup => "open-for-backup",
            SessionState::OpenForRestore => "open-for-restore",
        }
    }
}

/// The runtime state of one backend instance.
#[derive(Debug, Default)]
pub struct ArchiveSession {
    state: SessionState,
    location: Option<PathBuf>,
}

impl ArchiveSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The archive location of the current (or, after close, most recent)
    /// session.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Fails with a state error unless the session is in `required`.
    pub fn require(&self, operation: &str, required: SessionState) -> Result<()> {
        if self.state != required {
            return Err(Error::state(
                operation,
                required.as_str(),
                self.state.as_str(),
            ));
        }
        Ok(())
    }

    pub fn open_for_backup(&mut self, location: &Path) -> Result<()> {
        self.require("open_for_backup", SessionState::Closed)?;
        self.state = SessionState::OpenForBackup;
        self.location = Some(location.to_path_buf());
        Ok(())
    }

    pub fn open_for_restore(&mut self, location: &Path) -> Result<()> {
        self.require("open_for_restore", SessionState::Closed)?;
        self.state = SessionState::OpenForRestore;
        self.location = Some(location.to_path_buf());
        Ok(())
    }

    pub fn close_backup(&mut self) -> Result<()> {
        self.require("close_backup", SessionState::OpenForBackup)?;
        self.state = SessionState::Closed;
        Ok(())
    }

    pub fn close_restore(&mut self) -> Result<()> {
        self.require("close_restore", SessionState::OpenForRestore)?;
        self.state = SessionState::Closed;
        Ok(())
    }
}
