//! Exclusion filtering for tree walks.
//!
//! Patterns are anchored regex fragments matched against a path relative to
//! the profile root, with `/` separators regardless of host path syntax and
//! a trailing `/` on directories (so `^Cache/` excludes the `Cache`
//! directory itself along with everything inside it). All fragments are
//! combined into one alternation compiled exactly once; matching never
//! recompiles.

use mozvault_core::{Error, Result};
use regex::Regex;
use std::path::Path;

/// Patterns excluded from backups by default: disposable caches and the
/// application's runtime lock files.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    r"^Cache(\.Trash)?/",
    r"^OfflineCache/",
    r"^lock$",
    r"^parent\.lock$",
    r"^\.parentlock$",
];

/// A set of exclusion patterns compiled into a single matcher.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    matcher: Option<Regex>,
}

impl ExclusionFilter {
    /// Compiles `patterns` into one alternation. An empty list matches
    /// nothing. Invalid fragments fail here, never at match time.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { matcher: None });
        }

        // Validate fragments individually so the error names the culprit.
        for pattern in patterns {
            Regex::new(pattern).map_err(|e| {
                Error::parse(format!("invalid exclusion pattern '{}': {}", pattern, e))
            })?;
        }

        let alternation = patterns
            .iter()
            .map(|p| format!("(?:{})", p))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&alternation)
            .map_err(|e| Error::parse(format!("invalid exclusion set: {}", e)))?;

        Ok(Self {
            matcher: Some(matcher),
        })
    }

    /// Compiles the default exclusions plus `additional` patterns.
    pub fn with_defaults(additional: &[String]) -> Result<Self> {
        let mut patterns: Vec<String> = DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect();
        patterns.extend_from_slice(additional);
        Self::compile(&patterns)
    }

    /// Tests a `/`-normalized profile-relative path.
    pub fn matches(&self, relative: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(relative))
    }
}

/// Joins a path's components with `/`, independent of host separators.
/// Absolute paths keep a single leading `/` (or their drive prefix).
pub fn slash_normalize(path: &Path) -> String {
    use std::path::Component;

    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_set_matches_nothing() {
        let filter = ExclusionFilter::compile(&[]).unwrap();
        assert!(!filter.matches("Cache/foo.dat"));
        assert!(!filter.matches("bookmarks.html"));
    }

    #[test]
    fn test_anchored_fragment() {
        let filter = ExclusionFilter::compile(&[r"^Cache(\.Trash)?/".to_string()]).unwrap();
        assert!(filter.matches("Cache/"));
        assert!(filter.matches("Cache/foo.dat"));
        assert!(filter.matches("Cache.Trash/old.dat"));
        assert!(!filter.matches("bookmarks.html"));
        // Anchoring keeps nested directories with the same name.
        assert!(!filter.matches("extensions/Cache/foo.dat"));
    }

    #[test]
    fn test_alternation_semantics_match_individual_patterns() {
        let patterns = vec![r"^Cache/".to_string(), r"\.sqlite-journal$".to_string()];
        let filter = ExclusionFilter::compile(&patterns).unwrap();
        let singles: Vec<ExclusionFilter> = patterns
            .iter()
            .map(|p| ExclusionFilter::compile(std::slice::from_ref(p)).unwrap())
            .collect();

        for path in [
            "Cache/x",
            "places.sqlite-journal",
            "places.sqlite",
            "Mail/pop/Inbox",
        ] {
            let combined = filter.matches(path);
            let any_single = singles.iter().any(|f| f.matches(path));
            assert_eq!(combined, any_single, "divergence on {}", path);
        }
    }

    #[test]
    fn test_default_excludes() {
        let filter = ExclusionFilter::with_defaults(&[]).unwrap();
        assert!(filter.matches("Cache/entries/0001"));
        assert!(filter.matches("OfflineCache/index.sqlite"));
        assert!(filter.matches("parent.lock"));
        assert!(filter.matches("lock"));
        assert!(!filter.matches("prefs.js"));
        assert!(!filter.matches("lockfile.txt"));
    }

    #[test]
    fn test_invalid_pattern_names_culprit() {
        let err =
            ExclusionFilter::compile(&["^ok/".to_string(), "[broken".to_string()]).unwrap_err();
        assert!(err.to_string().contains("[broken"));
    }

    #[test]
    fn test_slash_normalize() {
        let path: PathBuf = ["Mail", "pop.example.org", "Inbox"].iter().collect();
        assert_eq!(slash_normalize(&path), "Mail/pop.example.org/Inbox");
    }

    #[cfg(unix)]
    #[test]
    fn test_slash_normalize_absolute() {
        assert_eq!(slash_normalize(Path::new("/home/user/p")), "/home/user/p");
    }
}
