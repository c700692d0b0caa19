//! End-to-end backup → restore round trips through the engines.
//!
//! For any profile tree and exclusion set, restoring a backup into a fresh
//! profile must reproduce exactly the files whose relative path did not
//! match an exclusion, byte for byte, with no extras.

use mozvault_backup::{
    new_backend, BackendOptions, BackupEngine, ExclusionFilter, RestoreEngine, BACKEND_KINDS,
};
use mozvault_profiles::Registry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn make_profile_tree(base: &Path) {
    fs::write(base.join("prefs.js"), "user_pref(\"browser.startup.page\", 1);\n").unwrap();
    fs::write(base.join("bookmarks.html"), "<html>bookmarks</html>").unwrap();
    fs::write(base.join("places.sqlite"), vec![0u8, 1, 2, 3, 255]).unwrap();
    fs::create_dir_all(base.join("Cache/entries")).unwrap();
    fs::write(base.join("Cache/entries/0001"), "cache data").unwrap();
    fs::create_dir_all(base.join("Cache.Trash")).unwrap();
    fs::write(base.join("Cache.Trash/old"), "stale").unwrap();
    fs::create_dir_all(base.join("Mail/pop.example.org")).unwrap();
    fs::write(base.join("Mail/pop.example.org/Inbox"), "mail body").unwrap();
    fs::create_dir_all(base.join("extensions/empty-dir")).unwrap();
}

/// Relative path -> file bytes, for every regular file under `root`.
fn file_map(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut map = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            map.insert(rel, fs::read(entry.path()).unwrap());
        }
    }
    map
}

#[test]
fn roundtrip_with_exclusions_every_backend() {
    for kind in BACKEND_KINDS {
        let profile = TempDir::new().unwrap();
        make_profile_tree(profile.path());

        let work = TempDir::new().unwrap();
        let mut backend = new_backend(kind, &BackendOptions::default()).unwrap();
        let dest = work.path().join(backend.munge_location("roundtrip"));

        let exclusions = vec![r"^Cache(\.Trash)?/".to_string()];
        let backup_engine =
            BackupEngine::new(ExclusionFilter::compile(&exclusions).unwrap(), true);
        let summary = backup_engine
            .backup(profile.path(), &dest, backend.as_mut())
            .unwrap();
        assert!(summary.entries > 0, "{}", kind);

        // Restore into a brand-new profile tracked by a fresh registry.
        let registry_root = TempDir::new().unwrap();
        let file = Registry::create(registry_root.path(), false).unwrap();
        let mut registry = Registry::load(&file).unwrap();

        let restore_engine =
            RestoreEngine::new(ExclusionFilter::compile(&exclusions).unwrap(), false);
        let restored = restore_engine
            .restore(&dest, &mut registry, "roundtrip", false, backend.as_mut())
            .unwrap();

        let expected: BTreeMap<String, Vec<u8>> = file_map(profile.path())
            .into_iter()
            .filter(|(rel, _)| !rel.starts_with("Cache/") && !rel.starts_with("Cache.Trash/"))
            .collect();
        let actual = file_map(&restored.profile_dir);

        assert_eq!(expected, actual, "{}: restored tree diverges", kind);
        // Directory structure survives too, including the empty directory.
        assert!(
            restored.profile_dir.join("extensions/empty-dir").is_dir(),
            "{}",
            kind
        );
        assert!(!restored.profile_dir.join("Cache").exists(), "{}", kind);
    }
}

#[test]
fn roundtrip_without_exclusions_is_lossless() {
    for kind in BACKEND_KINDS {
        let profile = TempDir::new().unwrap();
        make_profile_tree(profile.path());

        let work = TempDir::new().unwrap();
        let mut backend = new_backend(kind, &BackendOptions::default()).unwrap();
        let dest = work.path().join(backend.munge_location("full"));

        let backup_engine = BackupEngine::new(ExclusionFilter::compile(&[]).unwrap(), true);
        backup_engine
            .backup(profile.path(), &dest, backend.as_mut())
            .unwrap();

        let registry_root = TempDir::new().unwrap();
        let file = Registry::create(registry_root.path(), false).unwrap();
        let mut registry = Registry::load(&file).unwrap();

        let restore_engine = RestoreEngine::new(ExclusionFilter::compile(&[]).unwrap(), false);
        let restored = restore_engine
            .restore(&dest, &mut registry, "full", false, backend.as_mut())
            .unwrap();

        assert_eq!(
            file_map(profile.path()),
            file_map(&restored.profile_dir),
            "{}: lossless roundtrip failed",
            kind
        );
    }
}
