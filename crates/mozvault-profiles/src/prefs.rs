//! Preference-path rewriting.
//!
//! A restored profile's `prefs.js` still carries absolute paths that point
//! into the old profile's location (mail folder roots, per-server
//! directories, newsrc files). Mozilla writes a `-rel` companion for each of
//! these, encoding the same path relative to the profile directory as
//! `[ProfD]some/path`. Rewriting joins that relative form onto the new
//! profile directory and substitutes it for the stale absolute value.

use mozvault_core::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// The preferences file name inside a profile directory.
pub const PREFS_FILE: &str = "prefs.js";

/// Suffix of the pseudo-keys carrying profile-relative path encodings.
const REL_SUFFIX: &str = "-rel";

/// Prefix marking a profile-relative path in a `-rel` value.
const PROFILE_TOKEN: &str = "[ProfD]";

/// Mail folder root keys: `mail.root.none`, `mail.root.pop3`, ...
const MAIL_ROOT_PREFIX: &str = "mail.root.";

/// `user_pref("key", value);` statements.
static PREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"user_pref\(\s*"([^"]+)"\s*,\s*(.+?)\s*\)\s*;"#).expect("valid pref grammar")
});

/// Per-server path-bearing keys.
static SERVER_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mail\.server\.server\d+\.(directory|newsrc\.file)$").expect("valid server key")
});

/// Block comments; line comments are stripped per-line to avoid eating
/// `//` sequences inside quoted path values.
static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment"));

/// Outcome of a rewrite pass.
#[derive(Debug, Clone)]
pub struct RewriteReport {
    /// Number of preference values substituted
    pub rewritten: usize,

    /// Path-bearing keys whose companion was missing or malformed
    pub warnings: usize,

    /// Where the original file was copied before rewriting
    pub backup_path: PathBuf,
}

/// True for the small fixed set of preference keys whose values are
/// absolute paths inside the profile.
fn is_path_pref(key: &str) -> bool {
    (key.starts_with(MAIL_ROOT_PREFIX) && !key.ends_with(REL_SUFFIX))
        || SERVER_PATH_RE.is_match(key)
}

/// Rewrites profile-relative preference paths in `prefs_path` so they point
/// under `profile_dir`.
///
/// The original file is copied to a `.backup` sibling first. Fails if the
/// file contains no path-bearing keys at all; individual missing or
/// malformed `-rel` companions only log warnings.
pub fn rewrite_preferences(profile_dir: &Path, prefs_path: &Path) -> Result<RewriteReport> {
    if !prefs_path.is_file() {
        return Err(Error::not_found(
            "Preferences file",
            prefs_path.display().to_string(),
        ));
    }

    let original = fs::read_to_string(prefs_path)?;
    let stripped = strip_comments(&original);
    let statements = parse_statements(&stripped);

    if !statements.iter().any(|(key, _)| is_path_pref(key)) {
        return Err(Error::not_found(
            "Profile-relative preferences",
            prefs_path.display().to_string(),
        ));
    }

    let mut rewritten = 0usize;
    let mut warnings = 0usize;
    let mut output: Vec<(String, String)> = Vec::with_capacity(statements.len());

    for (key, raw_value) in &statements {
        let mut value = raw_value.clone();
        if is_path_pref(key) {
            match relative_companion(&statements, key) {
                Some(rel) => {
                    let absolute = profile_dir.join(rel);
                    value = quote(&absolute.display().to_string());
                    rewritten += 1;
                    debug!("Rewrote {} -> {}", key, absolute.display());
                }
                None => {
                    warn!(
                        "No usable {}{} companion for '{}', leaving value as-is",
                        key, REL_SUFFIX, key
                    );
                    warnings += 1;
                }
            }
        }
        output.push((key.clone(), value));
    }

    let backup_path = prefs_path.with_extension("js.backup");
    fs::copy(prefs_path, &backup_path)?;
    restrict_permissions(&backup_path)?;

    let mut text = String::new();
    text.push_str("// Rewritten by mozvault after restoring this profile.\n");
    text.push_str(&format!(
        "// The previous contents were saved to: {}\n\n",
        backup_path.display()
    ));
    for (key, value) in &output {
        text.push_str(&format!("user_pref(\"{}\", {});\n", key, value));
    }
    fs::write(prefs_path, text)?;

    info!(
        "Rewrote {} preference path(s) in {} ({} warning(s))",
        rewritten,
        prefs_path.display(),
        warnings
    );

    Ok(RewriteReport {
        rewritten,
        warnings,
        backup_path,
    })
}

/// Looks up `key`'s `-rel` companion and decodes its `[ProfD]` form.
/// Returns the profile-relative fragment, or None if the companion is
/// missing or malformed.
fn relative_companion<'a>(statements: &'a [(String, String)], key: &str) -> Option<&'a str> {
    let companion = format!("{}{}", key, REL_SUFFIX);
    let raw = statements
        .iter()
        .find(|(k, _)| *k == companion)
        .map(|(_, v)| v.as_str())?;
    let unquoted = unquote(raw)?;
    unquoted.strip_prefix(PROFILE_TOKEN)
}

fn strip_comments(text: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(text, "");
    without_blocks
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts `(key, raw value)` pairs in file order.
fn parse_statements(text: &str) -> Vec<(String, String)> {
    PREF_RE
        .captures_iter(text)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Strips the quotes from a string-typed raw value.
fn unquote(raw: &str) -> Option<&str> {
    raw.strip_prefix('"')?.strip_suffix('"')
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_prefs(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(PREFS_FILE);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_mail_root_is_rewritten() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "// prefs\n\
             user_pref(\"mail.root.pop3\", \"/old/profile/Mail\");\n\
             user_pref(\"mail.root.pop3-rel\", \"[ProfD]Mail\");\n\
             user_pref(\"browser.startup.page\", 1);\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.warnings, 0);

        let text = fs::read_to_string(&prefs).unwrap();
        let expected = profile.path().join("Mail").display().to_string();
        assert!(text.contains(&expected), "rewritten text: {}", text);
        assert!(!text.contains("/old/profile/Mail"));
        // Non-path prefs survive untouched.
        assert!(text.contains("user_pref(\"browser.startup.page\", 1);"));
        assert!(report.backup_path.is_file());
    }

    #[test]
    fn test_server_directory_and_newsrc_keys() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "user_pref(\"mail.server.server1.directory\", \"/old/Mail/pop.example.org\");\n\
             user_pref(\"mail.server.server1.directory-rel\", \"[ProfD]Mail/pop.example.org\");\n\
             user_pref(\"mail.server.server2.newsrc.file\", \"/old/News/newsrc-news.example.org\");\n\
             user_pref(\"mail.server.server2.newsrc.file-rel\", \"[ProfD]News/newsrc-news.example.org\");\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        assert_eq!(report.rewritten, 2);

        let text = fs::read_to_string(&prefs).unwrap();
        assert!(text.contains(
            &profile
                .path()
                .join("Mail/pop.example.org")
                .display()
                .to_string()
        ));
        assert!(text.contains(
            &profile
                .path()
                .join("News/newsrc-news.example.org")
                .display()
                .to_string()
        ));
    }

    #[test]
    fn test_missing_companion_warns_but_succeeds() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "user_pref(\"mail.root.imap\", \"/old/ImapMail\");\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        assert_eq!(report.rewritten, 0);
        assert_eq!(report.warnings, 1);

        // Stale value stays, but the file was still rewritten with a header.
        let text = fs::read_to_string(&prefs).unwrap();
        assert!(text.contains("/old/ImapMail"));
        assert!(text.starts_with("// Rewritten by mozvault"));
    }

    #[test]
    fn test_malformed_companion_warns() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "user_pref(\"mail.root.none\", \"/old/Mail\");\n\
             user_pref(\"mail.root.none-rel\", \"Mail\");\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        assert_eq!(report.rewritten, 0);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn test_no_path_bearing_keys_fails() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "user_pref(\"browser.startup.homepage\", \"about:blank\");\n",
        );

        let err = rewrite_preferences(profile.path(), &prefs).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        // Nothing was rewritten and no backup was made.
        assert!(!profile.path().join("prefs.js.backup").exists());
    }

    #[test]
    fn test_missing_file_fails() {
        let profile = TempDir::new().unwrap();
        let err =
            rewrite_preferences(profile.path(), &profile.path().join(PREFS_FILE)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_comments_are_stripped_before_parsing() {
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "/* header\n spanning lines */\n\
             // user_pref(\"mail.root.pop3\", \"/commented/out\");\n\
             user_pref(\"mail.root.pop3\", \"/old/Mail\");\n\
             user_pref(\"mail.root.pop3-rel\", \"[ProfD]Mail\");\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        assert_eq!(report.rewritten, 1);
        let text = fs::read_to_string(&prefs).unwrap();
        assert!(!text.contains("/commented/out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_has_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let profile = TempDir::new().unwrap();
        let prefs = write_prefs(
            profile.path(),
            "user_pref(\"mail.root.pop3\", \"/old/Mail\");\n\
             user_pref(\"mail.root.pop3-rel\", \"[ProfD]Mail\");\n",
        );

        let report = rewrite_preferences(profile.path(), &prefs).unwrap();
        let mode = fs::metadata(&report.backup_path)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
