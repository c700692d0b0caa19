//! The archive-backend capability contract.
//!
//! A backend knows how to read and write one storage format. The engines
//! depend only on this trait; conformance to the session state machine is
//! part of the contract and is exercised for every backend by the shared
//! suite in `tests/backend_conformance.rs`.

use crate::backends::{DirCopyBackend, TarGzBackend, ZipBackend};
use crate::session::ArchiveSession;
use mozvault_core::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Backend kinds accepted by [`new_backend`].
pub const BACKEND_KINDS: &[&str] = &["targz", "zip", "dir"];

/// Key/value construction options for a backend, validated against the
/// backend's `allowed_options` at construction time.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    values: BTreeMap<String, String>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `key=value` option specs, as collected from the command line.
    pub fn parse(specs: &[String]) -> Result<Self> {
        let mut options = Self::new();
        for spec in specs {
            let Some((key, value)) = spec.split_once('=') else {
                return Err(Error::validation(format!(
                    "backend option '{}' is not of the form key=value",
                    spec
                )));
            };
            options.values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(options)
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Rejects any option key the backend does not understand.
    pub fn validate(&self, allowed: &'static [&'static str]) -> Result<()> {
        for key in self.values.keys() {
            if !allowed.contains(&key.as_str()) {
                return Err(Error::validation(format!(
                    "unknown backend option '{}' (allowed: {})",
                    key,
                    if allowed.is_empty() {
                        "none".to_string()
                    } else {
                        allowed.join(", ")
                    }
                )));
            }
        }
        Ok(())
    }
}

/// The capability contract implemented by every archive format adaptor.
///
/// A backend instance is single-session: it must be closed before it can be
/// opened again, and `backup_file` / `contents` / `restore_file` are valid
/// only in the matching open state. Archive-internal names use `/`
/// separators; directory entries carry a trailing `/`.
pub trait ArchiveBackend: std::fmt::Debug {
    /// Short format name, e.g. "targz".
    fn name(&self) -> &'static str;

    /// Canonical extension including the leading dot, or "" for
    /// directory-shaped archives.
    fn extension(&self) -> &'static str;

    /// Option keys this backend accepts at construction.
    fn allowed_options(&self) -> &'static [&'static str];

    /// The backend's session, for state introspection.
    fn session(&self) -> &ArchiveSession;

    /// Appends the canonical extension to `name` unless already present.
    fn munge_location(&self, name: &str) -> String {
        let ext = self.extension();
        if ext.is_empty() || name.ends_with(ext) {
            name.to_string()
        } else {
            format!("{}{}", name, ext)
        }
    }

    fn open_for_backup(&mut self, path: &Path) -> Result<()>;

    fn open_for_restore(&mut self, path: &Path) -> Result<()>;

    /// Archive-internal entry names, in storage order. Valid only while
    /// open for restore.
    fn contents(&mut self) -> Result<Vec<String>>;

    /// Stores `local` under the archive-internal name `internal`.
    fn backup_file(&mut self, local: &Path, internal: &str) -> Result<()>;

    /// Materializes `internal` under `dest_dir`.
    fn restore_file(&mut self, internal: &str, dest_dir: &Path) -> Result<()>;

    fn close_backup(&mut self) -> Result<()>;

    fn close_restore(&mut self) -> Result<()>;
}

/// Constructs the backend named by `kind` (CLI `--plugin` values).
pub fn new_backend(kind: &str, options: &BackendOptions) -> Result<Box<dyn ArchiveBackend>> {
    match kind {
        "targz" | "tar.gz" => Ok(Box::new(TarGzBackend::new(options)?)),
        "zip" => Ok(Box::new(ZipBackend::new(options)?)),
        "dir" => Ok(Box::new(DirCopyBackend::new(options)?)),
        other => Err(Error::validation(format!(
            "unknown backend '{}' (expected one of: {})",
            other,
            BACKEND_KINDS.join(", ")
        ))),
    }
}

/// Normalizes an archive-internal name for joining under a root: strips any
/// leading `/` so absolute internal names nest instead of escaping, exactly
/// as tar itself stores them.
pub(crate) fn entry_rel_name(internal: &str) -> &str {
    internal.trim_start_matches('/')
}
