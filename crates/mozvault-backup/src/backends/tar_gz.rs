//! Gzip-compressed tar backend.

use crate::backend::{entry_rel_name, ArchiveBackend, BackendOptions};
use crate::session::{ArchiveSession, SessionState};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mozvault_core::{Error, Result};
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Default gzip compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

const ALLOWED_OPTIONS: &[&str] = &["compression"];

/// Archive backend writing `.tar.gz` streams.
pub struct TarGzBackend {
    session: ArchiveSession,
    compression: u32,
    writer: Option<tar::Builder<GzEncoder<File>>>,
}

impl std::fmt::Debug for TarGzBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarGzBackend")
            .field("session", &self.session)
            .field("compression", &self.compression)
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

impl TarGzBackend {
    pub fn new(options: &BackendOptions) -> Result<Self> {
        options.validate(ALLOWED_OPTIONS)?;
        let compression = match options.get("compression") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| {
                    Error::validation(format!("compression level '{}' is not a number", raw))
                })?
                .clamp(1, 9),
            None => DEFAULT_COMPRESSION_LEVEL,
        };
        Ok(Self {
            session: ArchiveSession::new(),
            compression,
            writer: None,
        })
    }

    fn open_archive(&self) -> Result<tar::Archive<GzDecoder<File>>> {
        let location = self
            .session
            .location()
            .expect("open session always has a location");
        let file = File::open(location)?;
        Ok(tar::Archive::new(GzDecoder::new(file)))
    }
}

impl ArchiveBackend for TarGzBackend {
    fn name(&self) -> &'static str {
        "targz"
    }

    fn extension(&self) -> &'static str {
        ".tar.gz"
    }

    fn allowed_options(&self) -> &'static [&'static str] {
        ALLOWED_OPTIONS
    }

    fn session(&self) -> &ArchiveSession {
        &self.session
    }

    fn open_for_backup(&mut self, path: &Path) -> Result<()> {
        self.session.require("open_for_backup", SessionState::Closed)?;
        let file = File::create(path)?;
        let encoder = GzEncoder::new(file, Compression::new(self.compression));
        self.writer = Some(tar::Builder::new(encoder));
        self.session.open_for_backup(path)
    }

    fn open_for_restore(&mut self, path: &Path) -> Result<()> {
        self.session
            .require("open_for_restore", SessionState::Closed)?;
        if !path.is_file() {
            return Err(Error::not_found("Archive", path.display().to_string()));
        }
        self.session.open_for_restore(path)
    }

    fn contents(&mut self) -> Result<Vec<String>> {
        self.session
            .require("contents", SessionState::OpenForRestore)?;
        let mut archive = self.open_archive()?;
        let mut names = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let mut name = entry.path()?.to_string_lossy().into_owned();
            if entry.header().entry_type().is_dir() && !name.ends_with('/') {
                name.push('/');
            }
            names.push(name);
        }
        Ok(names)
    }

    fn backup_file(&mut self, local: &Path, internal: &str) -> Result<()> {
        self.session
            .require("backup_file", SessionState::OpenForBackup)?;
        let writer = self.writer.as_mut().expect("open backup has a writer");
        let name = entry_rel_name(internal);
        if internal.ends_with('/') {
            writer.append_dir(name.trim_end_matches('/'), local)?;
        } else {
            writer.append_path_with_name(local, name)?;
        }
        debug!("Archived {} as {}", local.display(), name);
        Ok(())
    }

    fn restore_file(&mut self, internal: &str, dest_dir: &Path) -> Result<()> {
        self.session
            .require("restore_file", SessionState::OpenForRestore)?;
        let name = entry_rel_name(internal);
        let target = dest_dir.join(name.trim_end_matches('/'));

        if internal.ends_with('/') {
            fs::create_dir_all(&target)?;
            return Ok(());
        }

        let mut archive = self.open_archive()?;
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.path()?.to_string_lossy() == name {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                entry.unpack(&target)?;
                debug!("Restored {} to {}", name, target.display());
                return Ok(());
            }
        }

        Err(Error::not_found("Archive entry", internal))
    }

    fn close_backup(&mut self) -> Result<()> {
        self.session
            .require("close_backup", SessionState::OpenForBackup)?;
        let writer = self.writer.take();
        self.session.close_backup()?;
        if let Some(writer) = writer {
            let encoder = writer.into_inner()?;
            encoder.finish()?;
        }
        Ok(())
    }

    fn close_restore(&mut self) -> Result<()> {
        self.session.close_restore()
    }
}
