//! Zip backend.

use crate::backend::{entry_rel_name, ArchiveBackend, BackendOptions};
use crate::session::{ArchiveSession, SessionState};
use mozvault_core::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const ALLOWED_OPTIONS: &[&str] = &["compression"];

/// Archive backend writing `.zip` files with deflate compression.
pub struct ZipBackend {
    session: ArchiveSession,
    compression: Option<i64>,
    writer: Option<ZipWriter<File>>,
    reader: Option<ZipArchive<File>>,
}

impl std::fmt::Debug for ZipBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipBackend")
            .field("session", &self.session)
            .field("compression", &self.compression)
            .field("writer", &self.writer.is_some())
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

impl ZipBackend {
    pub fn new(options: &BackendOptions) -> Result<Self> {
        options.validate(ALLOWED_OPTIONS)?;
        let compression = match options.get("compression") {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| {
                        Error::validation(format!("compression level '{}' is not a number", raw))
                    })?
                    .clamp(1, 9),
            ),
            None => None,
        };
        Ok(Self {
            session: ArchiveSession::new(),
            compression,
            writer: None,
            reader: None,
        })
    }

    fn file_options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression)
    }
}

/// Maps zip-crate errors onto the core taxonomy.
fn zip_error(e: ZipError) -> Error {
    match e {
        ZipError::Io(io) => Error::Io(io),
        ZipError::FileNotFound => Error::not_found("Archive entry", "<zip>"),
        other => Error::parse(format!("zip archive error: {}", other)),
    }
}

impl ArchiveBackend for ZipBackend {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn extension(&self) -> &'static str {
        ".zip"
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
        self.writer = Some(ZipWriter::new(file));
        self.session.open_for_backup(path)
    }

    fn open_for_restore(&mut self, path: &Path) -> Result<()> {
        self.session
            .require("open_for_restore", SessionState::Closed)?;
        if !path.is_file() {
            return Err(Error::not_found("Archive", path.display().to_string()));
        }
        let file = File::open(path)?;
        self.reader = Some(ZipArchive::new(file).map_err(zip_error)?);
        self.session.open_for_restore(path)
    }

    fn contents(&mut self) -> Result<Vec<String>> {
        self.session
            .require("contents", SessionState::OpenForRestore)?;
        let reader = self.reader.as_ref().expect("open restore has a reader");
        Ok(reader.file_names().map(String::from).collect())
    }

    fn backup_file(&mut self, local: &Path, internal: &str) -> Result<()> {
        self.session
            .require("backup_file", SessionState::OpenForBackup)?;
        let options = self.file_options();
        let writer = self.writer.as_mut().expect("open backup has a writer");
        let name = entry_rel_name(internal);

        if internal.ends_with('/') {
            writer.add_directory(name, options).map_err(zip_error)?;
        } else {
            writer.start_file(name, options).map_err(zip_error)?;
            let mut source = File::open(local)?;
            io::copy(&mut source, writer)?;
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

        let reader = self.reader.as_mut().expect("open restore has a reader");
        let mut entry = reader.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => Error::not_found("Archive entry", internal),
            other => zip_error(other),
        })?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Restored {} to {}", name, target.display());
        Ok(())
    }

    fn close_backup(&mut self) -> Result<()> {
        self.session
            .require("close_backup", SessionState::OpenForBackup)?;
        let writer = self.writer.take();
        self.session.close_backup()?;
        if let Some(writer) = writer {
            writer.finish().map_err(zip_error)?;
        }
        Ok(())
    }

    fn close_restore(&mut self) -> Result<()> {
        self.session.close_restore()?;
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_munge_location() {
        let backend = ZipBackend::new(&BackendOptions::default()).unwrap();
        assert_eq!(backend.munge_location("backup"), "backup.zip");
        assert_eq!(backend.munge_location("backup.zip"), "backup.zip");
    }

    #[test]
    fn test_open_for_restore_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not-a-zip.zip");
        fs::write(&path, b"this is not a zip archive").unwrap();

        let mut backend = ZipBackend::new(&BackendOptions::default()).unwrap();
        let err = backend.open_for_restore(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(backend.session().state(), SessionState::Closed);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let options = BackendOptions::new().set("encryption", "aes");
        let err = ZipBackend::new(&options).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
