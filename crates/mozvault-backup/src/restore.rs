//! The restore engine.
//!
//! Opens an archive backend for restore, filters the stored entries through
//! the exclusion matcher, materializes survivors into a (possibly newly
//! created) profile directory, and optionally rewrites profile-relative
//! preference paths afterwards.

use crate::backend::ArchiveBackend;
use crate::filters::ExclusionFilter;
use mozvault_core::{lock, Error, Result};
use mozvault_profiles::{prefs, Registry};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of a restore operation.
#[derive(Debug, Clone)]
pub struct RestoreSummary {
    /// Directory the profile was restored into
    pub profile_dir: PathBuf,

    /// Number of entries materialized
    pub restored: usize,

    /// Number of entries skipped by the exclusion filter
    pub skipped: usize,

    /// Whether the target profile was created by this operation
    pub created_profile: bool,

    /// Preference rewrite outcome, when requested and applicable
    pub prefs: Option<prefs::RewriteReport>,

    /// Duration of the operation in seconds
    pub duration_seconds: f64,
}

/// Drives one restore session against an archive backend.
pub struct RestoreEngine {
    exclusions: ExclusionFilter,
    rewrite_preferences: bool,
}

impl RestoreEngine {
    pub fn new(exclusions: ExclusionFilter, rewrite_preferences: bool) -> Self {
        Self {
            exclusions,
            rewrite_preferences,
        }
    }

    /// Restores `archive_path` into the profile named `profile_name`,
    /// creating the profile through `registry` if it does not exist yet.
    pub fn restore(
        &self,
        archive_path: &Path,
        registry: &mut Registry,
        profile_name: &str,
        is_default: bool,
        backend: &mut dyn ArchiveBackend,
    ) -> Result<RestoreSummary> {
        let start = Instant::now();

        if !archive_path.exists() {
            return Err(Error::not_found(
                "Archive",
                archive_path.display().to_string(),
            ));
        }

        let created_profile = registry.get(profile_name).is_none();
        if created_profile {
            info!("Profile '{}' not in registry, creating it", profile_name);
            registry.create_profile(profile_name, is_default, None)?;
        }

        let profile_dir = registry
            .profile_dir(profile_name)
            .expect("profile exists or was just created");
        if !profile_dir.is_dir() {
            return Err(Error::not_found(
                "Profile directory",
                profile_dir.display().to_string(),
            ));
        }
        if let Some(lock_file) = lock::find_lock(&profile_dir) {
            return Err(Error::locked(profile_dir.display().to_string(), lock_file));
        }

        info!(
            "Restoring {} into {}",
            archive_path.display(),
            profile_dir.display()
        );

        backend.open_for_restore(archive_path)?;

        let mut restored = 0usize;
        let mut skipped = 0usize;
        for entry in backend.contents()? {
            if self.exclusions.matches(&entry) {
                debug!("Skipped {}", entry);
                skipped += 1;
                continue;
            }
            backend.restore_file(&entry, &profile_dir)?;
            restored += 1;
        }

        backend.close_restore()?;

        let prefs_report = if self.rewrite_preferences {
            self.rewrite_prefs(&profile_dir)?
        } else {
            None
        };

        let duration_seconds = start.elapsed().as_secs_f64();
        info!(
            "Restore complete: {} entries, {} skipped, {:.1}s",
            restored, skipped, duration_seconds
        );

        Ok(RestoreSummary {
            profile_dir,
            restored,
            skipped,
            created_profile,
            prefs: prefs_report,
            duration_seconds,
        })
    }

    /// Runs the preference rewriter when a preferences file exists. Absence
    /// of the file, or of path-bearing keys inside it, is only a warning.
    fn rewrite_prefs(&self, profile_dir: &Path) -> Result<Option<prefs::RewriteReport>> {
        let prefs_path = profile_dir.join(prefs::PREFS_FILE);
        if !prefs_path.is_file() {
            warn!(
                "No {} in restored profile, skipping preference rewrite",
                prefs::PREFS_FILE
            );
            return Ok(None);
        }
        match prefs::rewrite_preferences(profile_dir, &prefs_path) {
            Ok(report) => Ok(Some(report)),
            Err(Error::NotFound { .. }) => {
                warn!("No profile-relative preferences to rewrite");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
