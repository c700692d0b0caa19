//! # mozvault-backup
//!
//! Backup and restore engines for mozvault profiles, built around a
//! pluggable archive-backend contract:
//!
//! - **ArchiveBackend**: the capability trait every storage format
//!   implements (tar.gz, zip, plain directory copy), with a strict
//!   single-session state machine
//! - **ExclusionFilter**: anchored path patterns compiled once into a
//!   single alternation
//! - **BackupEngine** / **RestoreEngine**: synchronous, fail-fast drivers
//!   that walk a profile tree or an archive's contents through a backend
//!
//! # Examples
//!
//! ```no_run
//! use mozvault_backup::{new_backend, BackendOptions, BackupEngine, ExclusionFilter};
//! use std::path::Path;
//!
//! fn main() -> mozvault_core::Result<()> {
//!     let mut backend = new_backend("targz", &BackendOptions::default())?;
//!     let exclusions = ExclusionFilter::compile(&["^Cache/".to_string()])?;
//!     let engine = BackupEngine::new(exclusions, true);
//!     let summary = engine.backup(
//!         Path::new("/home/user/.mozilla/firefox/ab3f9k2q.default"),
//!         Path::new("firefox-default-20260807-101500.tar.gz"),
//!         backend.as_mut(),
//!     )?;
//!     println!("archived {} entries", summary.entries);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod backends;
pub mod backup;
pub mod filters;
pub mod restore;
pub mod session;

// Re-export commonly used types
pub use backend::{new_backend, ArchiveBackend, BackendOptions, BACKEND_KINDS};
pub use backends::{DirCopyBackend, TarGzBackend, ZipBackend};
pub use backup::{archive_name, BackupEngine, BackupSummary};
pub use filters::{ExclusionFilter, DEFAULT_EXCLUDE};
pub use restore::{RestoreEngine, RestoreSummary};
pub use session::{ArchiveSession, SessionState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
