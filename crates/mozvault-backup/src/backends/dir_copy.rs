//! Plain directory-copy backend.
//!
//! The "archive" is just a directory tree mirroring the profile. Useful for
//! inspecting a backup with ordinary shell tools, and as the simplest
//! conformance target for the backend contract.

use crate::backend::{entry_rel_name, ArchiveBackend, BackendOptions};
use crate::filters::slash_normalize;
use crate::session::{ArchiveSession, SessionState};
use mozvault_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const ALLOWED_OPTIONS: &[&str] = &[];

/// Archive backend mirroring the profile into a plain directory.
#[derive(Debug)]
pub struct DirCopyBackend {
    session: ArchiveSession,
}

impl DirCopyBackend {
    pub fn new(options: &BackendOptions) -> Result<Self> {
        options.validate(ALLOWED_OPTIONS)?;
        Ok(Self {
            session: ArchiveSession::new(),
        })
    }

    fn root(&self) -> PathBuf {
        self.session
            .location()
            .expect("open session always has a location")
            .to_path_buf()
    }
}

impl ArchiveBackend for DirCopyBackend {
    fn name(&self) -> &'static str {
        "dir"
    }

    /// Directory archives have no extension to append.
    fn extension(&self) -> &'static str {
        ""
    }

    fn allowed_options(&self) -> &'static [&'static str] {
        ALLOWED_OPTIONS
    }

    fn session(&self) -> &ArchiveSession {
        &self.session
    }

    fn open_for_backup(&mut self, path: &Path) -> Result<()> {
        self.session.require("open_for_backup", SessionState::Closed)?;
        fs::create_dir_all(path)?;
        self.session.open_for_backup(path)
    }

    fn open_for_restore(&mut self, path: &Path) -> Result<()> {
        self.session
            .require("open_for_restore", SessionState::Closed)?;
        if !path.is_dir() {
            return Err(Error::not_found("Archive", path.display().to_string()));
        }
        self.session.open_for_restore(path)
    }

    fn contents(&mut self) -> Result<Vec<String>> {
        self.session
            .require("contents", SessionState::OpenForRestore)?;
        let root = self.root();
        let mut names = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| Error::io_at(root.display().to_string(), e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(&root)
                .expect("walked entries live under the root");
            let mut name = slash_normalize(rel);
            if entry.file_type().is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        Ok(names)
    }

    fn backup_file(&mut self, local: &Path, internal: &str) -> Result<()> {
        self.session
            .require("backup_file", SessionState::OpenForBackup)?;
        let name = entry_rel_name(internal);
        let target = self.root().join(name.trim_end_matches('/'));

        if internal.ends_with('/') {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(local, &target)?;
        }
        debug!("Archived {} as {}", local.display(), name);
        Ok(())
    }

    fn restore_file(&mut self, internal: &str, dest_dir: &Path) -> Result<()> {
        self.session
            .require("restore_file", SessionState::OpenForRestore)?;
        let name = entry_rel_name(internal);
        let source = self.root().join(name.trim_end_matches('/'));
        let target = dest_dir.join(name.trim_end_matches('/'));

        if internal.ends_with('/') {
            fs::create_dir_all(&target)?;
            return Ok(());
        }

        if !source.is_file() {
            return Err(Error::not_found("Archive entry", internal));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &target)?;
        debug!("Restored {} to {}", name, target.display());
        Ok(())
    }

    fn close_backup(&mut self) -> Result<()> {
        self.session.close_backup()
    }

    fn close_restore(&mut self) -> Result<()> {
        self.session.close_restore()
    }
}
