//! The backup engine.
//!
//! Walks a profile directory depth-first (children before parents), applies
//! the exclusion filter, and drives an archive backend through one full
//! backup session. Per-entry failures abort the whole operation without
//! closing the backend; the caller decides what to do with the partial
//! archive.

use crate::backend::ArchiveBackend;
use crate::filters::{slash_normalize, ExclusionFilter};
use mozvault_core::{lock, AppType, Error, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Result of a backup operation.
#[derive(Debug, Clone)]
pub struct BackupSummary {
    /// Path of the created archive
    pub archive_path: PathBuf,

    /// Number of entries written, directories included
    pub entries: usize,

    /// Number of entries skipped by the exclusion filter
    pub excluded: usize,

    /// Duration of the operation in seconds
    pub duration_seconds: f64,
}

/// Conventional archive name for a profile: `<type>-<name>-<YYYYMMDD>-<HHMMSS>`
/// plus the backend's canonical extension.
pub fn archive_name(app: AppType, profile_name: &str, backend: &dyn ArchiveBackend) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    backend.munge_location(&format!("{}-{}-{}", app.name(), profile_name, stamp))
}

/// Drives one backup session against an archive backend.
pub struct BackupEngine {
    exclusions: ExclusionFilter,

    /// Archive entries under profile-relative names rather than absolute
    /// paths. Deliberately independent of the registry's own relative-path
    /// flag.
    use_relative_paths: bool,
}

impl BackupEngine {
    pub fn new(exclusions: ExclusionFilter, use_relative_paths: bool) -> Self {
        Self {
            exclusions,
            use_relative_paths,
        }
    }

    /// Backs up `profile_dir` into a fresh archive at `destination`.
    ///
    /// Fails if the destination already exists or the profile is locked.
    /// The first per-entry failure aborts the operation.
    pub fn backup(
        &self,
        profile_dir: &Path,
        destination: &Path,
        backend: &mut dyn ArchiveBackend,
    ) -> Result<BackupSummary> {
        let start = Instant::now();

        if !profile_dir.is_dir() {
            return Err(Error::not_found(
                "Profile directory",
                profile_dir.display().to_string(),
            ));
        }
        if destination.exists() {
            return Err(Error::conflict(format!(
                "destination already exists: {}",
                destination.display()
            )));
        }
        if let Some(lock_file) = lock::find_lock(profile_dir) {
            return Err(Error::locked(profile_dir.display().to_string(), lock_file));
        }

        info!(
            "Backing up {} to {}",
            profile_dir.display(),
            destination.display()
        );

        backend.open_for_backup(destination)?;

        let mut entries = 0usize;
        let mut excluded = 0usize;

        // Children before parents, so a restore replaying the archive in
        // reverse order can create parents first.
        for entry in WalkDir::new(profile_dir)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true)
        {
            let entry = entry
                .map_err(|e| Error::io_at(profile_dir.display().to_string(), e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(profile_dir)
                .expect("walked entries live under the profile root");
            let is_dir = entry.file_type().is_dir();

            let mut match_key = slash_normalize(relative);
            if is_dir {
                match_key.push('/');
            }
            if self.exclusions.matches(&match_key) {
                debug!("Excluded {}", match_key);
                excluded += 1;
                continue;
            }

            let mut internal = if self.use_relative_paths {
                slash_normalize(relative)
            } else {
                slash_normalize(entry.path())
            };
            if is_dir {
                internal.push('/');
            }

            backend.backup_file(entry.path(), &internal)?;
            entries += 1;
        }

        backend.close_backup()?;

        let duration_seconds = start.elapsed().as_secs_f64();
        info!(
            "Backup complete: {} entries, {} excluded, {:.1}s",
            entries, excluded, duration_seconds
        );

        Ok(BackupSummary {
            archive_path: destination.to_path_buf(),
            entries,
            excluded,
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendOptions;
    use crate::backends::DirCopyBackend;
    use std::fs;
    use tempfile::TempDir;

    fn create_profile_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("prefs.js"), "user_pref(\"a\", 1);\n").unwrap();
        fs::write(base.join("bookmarks.html"), "<html></html>").unwrap();
        fs::create_dir_all(base.join("Cache")).unwrap();
        fs::write(base.join("Cache/foo.dat"), "cached").unwrap();
        fs::create_dir_all(base.join("Mail/pop.example.org")).unwrap();
        fs::write(base.join("Mail/pop.example.org/Inbox"), "mail").unwrap();
        dir
    }

    #[test]
    fn test_backup_excludes_cache() {
        // Scenario: exclusions=["^Cache/"] on a tree containing
        // Cache/foo.dat and bookmarks.html.
        let profile = create_profile_tree();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("backup");

        let filter = ExclusionFilter::compile(&[r"^Cache/".to_string()]).unwrap();
        let engine = BackupEngine::new(filter, true);
        let mut backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();

        let summary = engine.backup(profile.path(), &dest, &mut backend).unwrap();
        assert!(dest.join("bookmarks.html").is_file());
        assert!(dest.join("Mail/pop.example.org/Inbox").is_file());
        assert!(!dest.join("Cache").exists());
        assert_eq!(summary.excluded, 2); // Cache/ and Cache/foo.dat
    }

    #[test]
    fn test_backup_refuses_existing_destination() {
        let profile = create_profile_tree();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("backup");
        fs::create_dir(&dest).unwrap();

        let engine = BackupEngine::new(ExclusionFilter::compile(&[]).unwrap(), true);
        let mut backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();
        let err = engine.backup(profile.path(), &dest, &mut backend).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_backup_refuses_locked_profile() {
        let profile = create_profile_tree();
        fs::write(profile.path().join("parent.lock"), "").unwrap();
        let out = TempDir::new().unwrap();

        let engine = BackupEngine::new(ExclusionFilter::compile(&[]).unwrap(), true);
        let mut backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();
        let err = engine
            .backup(profile.path(), &out.path().join("backup"), &mut backend)
            .unwrap_err();
        assert!(err.is_locked());
    }

    #[test]
    fn test_backup_missing_profile() {
        let out = TempDir::new().unwrap();
        let engine = BackupEngine::new(ExclusionFilter::compile(&[]).unwrap(), true);
        let mut backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();
        let err = engine
            .backup(
                &out.path().join("nope"),
                &out.path().join("backup"),
                &mut backend,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_archive_name_convention() {
        let backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();
        let name = archive_name(AppType::Firefox, "default", &backend);
        // firefox-default-YYYYMMDD-HHMMSS
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts[0], "firefox");
        assert_eq!(parts[1], "default");
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[3].len(), 6);
    }

    #[test]
    fn test_absolute_internal_names() {
        let profile = create_profile_tree();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("backup");

        let engine = BackupEngine::new(ExclusionFilter::compile(&[]).unwrap(), false);
        let mut backend = DirCopyBackend::new(&BackendOptions::default()).unwrap();
        engine.backup(profile.path(), &dest, &mut backend).unwrap();

        // Absolute names nest under the destination with the leading
        // separator stripped.
        let nested = dest.join(
            profile
                .path()
                .join("bookmarks.html")
                .display()
                .to_string()
                .trim_start_matches('/'),
        );
        assert!(nested.is_file(), "expected {}", nested.display());
    }
}
