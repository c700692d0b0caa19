//! Profile lock-file detection.
//!
//! Mozilla applications drop a marker file directly inside a profile
//! directory while it is in active use. Backing up or restoring a live
//! profile would capture half-written SQLite databases, so both engines
//! refuse to touch a locked profile.

use std::path::Path;
use tracing::debug;

/// Lock-file names checked directly inside a profile directory.
pub const LOCK_FILES: &[&str] = &["lock", "parent.lock", ".parentlock"];

/// Returns the name of the first lock file present in `profile_dir`,
/// or None if the profile is not locked.
pub fn find_lock(profile_dir: &Path) -> Option<&'static str> {
    let found = LOCK_FILES
        .iter()
        .find(|name| profile_dir.join(name).exists())
        .copied();
    if let Some(name) = found {
        debug!("Found lock file '{}' in {}", name, profile_dir.display());
    }
    found
}

/// Checks whether a profile directory is locked by its application.
pub fn is_locked(profile_dir: &Path) -> bool {
    find_lock(profile_dir).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unlocked_profile() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("prefs.js"), "").unwrap();
        assert!(!is_locked(dir.path()));
        assert_eq!(find_lock(dir.path()), None);
    }

    #[test]
    fn test_each_lock_name_is_detected() {
        for name in LOCK_FILES {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join(name), "").unwrap();
            assert!(is_locked(dir.path()), "expected '{}' to lock", name);
            assert_eq!(find_lock(dir.path()), Some(*name));
        }
    }

    #[test]
    fn test_lock_in_subdirectory_does_not_count() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/lock"), "").unwrap();
        assert!(!is_locked(dir.path()));
    }
}
