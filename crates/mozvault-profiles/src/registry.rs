//! `profiles.ini` registry management.
//!
//! The registry file enumerates one application's profiles:
//!
//! ```ini
//! [General]
//! StartWithLastProfile=1
//!
//! [Profile0]
//! Name=default
//! Path=Profiles/ab3f9k2q.default
//! IsRelative=1
//! Default=1
//! ```
//!
//! Sections are numbered contiguously from 0; parsing stops at the first
//! missing `Profile<N>`. Every mutation rewrites the whole file from the
//! in-memory state and verifies the result, so the on-disk registry always
//! reflects either the pre- or post-operation state.

use mozvault_core::{Error, Result};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Registry file name, as written by the applications themselves.
pub const REGISTRY_FILE: &str = "profiles.ini";

/// Directory holding allocated profile directories, sibling to the registry file.
const PROFILES_DIR: &str = "Profiles";

/// Length of the random prefix on allocated profile directory names.
const SALT_LEN: usize = 8;

/// Give up allocating a salted directory name after this many collisions.
const MAX_SALT_ATTEMPTS: usize = 100;

/// One tracked profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Registry-assigned identifier, e.g. "Profile0"
    pub id: String,

    /// Unique name within the registry
    pub name: String,

    /// Directory path as stored: absolute, or relative to the registry dir
    pub path: String,

    /// Whether `path` is relative to the registry directory
    pub is_relative: bool,

    /// Whether this is the profile the application starts with
    pub is_default: bool,
}

/// The parsed registry for one application type.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Path of the registry file itself
    file: PathBuf,

    /// Directory containing the registry file
    dir: PathBuf,

    /// Profiles in creation order
    profiles: Vec<Profile>,

    /// The `StartWithLastProfile` flag
    start_with_last: bool,
}

impl Registry {
    /// Loads and validates the registry file at `file`.
    pub fn load(file: &Path) -> Result<Registry> {
        if !file.is_file() {
            return Err(Error::not_found("Registry", file.display().to_string()));
        }

        let text = fs::read_to_string(file)?;
        let sections = parse_sections(&text);
        let dir = registry_dir_of(file);

        let start_with_last = section_value(&sections, "General", "StartWithLastProfile") == "1";

        let mut profiles: Vec<Profile> = Vec::new();
        for n in 0.. {
            let id = format!("Profile{}", n);
            let Some(section) = find_section(&sections, &id) else {
                break;
            };

            let name = section.get("Name").map(String::as_str).unwrap_or("");
            if name.is_empty() {
                return Err(Error::validation(format!(
                    "profile section [{}] has no Name",
                    id
                )));
            }
            if profiles.iter().any(|p| p.name == name) {
                return Err(Error::parse(format!(
                    "duplicate profile name '{}' in {}",
                    name,
                    file.display()
                )));
            }

            let path = section.get("Path").map(String::as_str).unwrap_or("");
            if path.is_empty() {
                return Err(Error::parse(format!(
                    "profile '{}' has no Path in {}",
                    name,
                    file.display()
                )));
            }
            // The stored path must resolve to an existing directory, either
            // relative to the registry dir or as given.
            if !dir.join(path).is_dir() && !Path::new(path).is_dir() {
                return Err(Error::parse(format!(
                    "profile '{}' path does not resolve to a directory: {}",
                    name, path
                )));
            }

            profiles.push(Profile {
                id,
                name: name.to_string(),
                path: path.to_string(),
                is_relative: section.get("IsRelative").map(String::as_str).unwrap_or("") == "1",
                is_default: section.get("Default").map(String::as_str).unwrap_or("") == "1",
            });
        }

        // StartWithLastProfile overrides the stored Default flags: the
        // last-parsed profile becomes the default regardless of its own flag.
        // Upstream behaves this way and callers depend on it.
        if start_with_last && !profiles.is_empty() {
            for p in profiles.iter_mut() {
                p.is_default = false;
            }
            let last = profiles.len() - 1;
            profiles[last].is_default = true;
        }

        debug!(
            "Loaded registry {} with {} profile(s)",
            file.display(),
            profiles.len()
        );

        Ok(Registry {
            file: file.to_path_buf(),
            dir,
            profiles,
            start_with_last,
        })
    }

    /// Creates a minimal registry file inside the existing directory `dir`.
    ///
    /// With `ignore_existing`, an already-present registry file is left
    /// untouched and reported as success; otherwise it is a conflict.
    /// Returns the registry file path.
    pub fn create(dir: &Path, ignore_existing: bool) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(Error::io_at(
                dir.display().to_string(),
                "registry location is not a directory",
            ));
        }

        let file = dir.join(REGISTRY_FILE);
        if file.exists() {
            if ignore_existing {
                debug!("Registry already exists, keeping: {}", file.display());
                return Ok(file);
            }
            return Err(Error::conflict(format!(
                "registry already exists: {}",
                file.display()
            )));
        }

        fs::write(&file, "[General]\nStartWithLastProfile=\n")?;
        info!("Created registry: {}", file.display());
        Ok(file)
    }

    /// Creates a new profile, allocates its directory if none is supplied,
    /// and rewrites the registry file.
    ///
    /// The first profile in a registry is always created as the default,
    /// regardless of `is_default`.
    pub fn create_profile(
        &mut self,
        name: &str,
        is_default: bool,
        explicit_path: Option<&Path>,
    ) -> Result<&Profile> {
        if name.is_empty() {
            return Err(Error::validation("profile name must not be empty"));
        }
        if self.profiles.iter().any(|p| p.name == name) {
            return Err(Error::conflict(format!(
                "profile '{}' already exists in {}",
                name,
                self.file.display()
            )));
        }

        let id = format!("Profile{}", self.profiles.len());
        if self.profiles.iter().any(|p| p.id == id) {
            return Err(Error::conflict(format!(
                "profile id '{}' is already claimed in {}",
                id,
                self.file.display()
            )));
        }

        let is_default = is_default || self.profiles.is_empty();

        let (stored_path, is_relative, allocated_dir) = match explicit_path {
            Some(dir) => {
                if !dir.is_dir() {
                    create_dir_private(dir, true)?;
                }
                (dir.display().to_string(), false, dir.to_path_buf())
            }
            None => {
                let dir = self.allocate_profile_dir(name)?;
                let stored = format!(
                    "{}/{}",
                    PROFILES_DIR,
                    dir.file_name()
                        .and_then(|n| n.to_str())
                        .expect("allocated name is ascii")
                );
                (stored, true, dir)
            }
        };

        // Build the full post-operation state in memory before touching the
        // file, so a failed write leaves the pre-operation file intact.
        let snapshot = (self.profiles.clone(), self.start_with_last);

        if is_default {
            for p in self.profiles.iter_mut() {
                p.is_default = false;
            }
        }
        self.start_with_last = is_default;
        self.profiles.push(Profile {
            id,
            name: name.to_string(),
            path: stored_path,
            is_relative,
            is_default,
        });

        if let Err(e) = self.save().and_then(|_| self.verify()) {
            // The allocated directory is already on disk; never lose track
            // of it in the error we surface.
            (self.profiles, self.start_with_last) = snapshot;
            return Err(Error::io_at(
                allocated_dir.display().to_string(),
                format!(
                    "profile directory was created but the registry rewrite failed: {}",
                    e
                ),
            ));
        }

        info!(
            "Created profile '{}' at {} (default: {})",
            name,
            allocated_dir.display(),
            is_default
        );

        Ok(self.profiles.last().expect("just pushed"))
    }

    /// Allocates `Profiles/<salt>.<name>` with owner-only permissions,
    /// retrying on name collisions. Creation itself is the collision check:
    /// an `AlreadyExists` error triggers a new salt rather than a pre-check
    /// racing against concurrent creators.
    fn allocate_profile_dir(&self, name: &str) -> Result<PathBuf> {
        let profiles_root = self.dir.join(PROFILES_DIR);
        if !profiles_root.is_dir() {
            create_dir_private(&profiles_root, false)?;
        }

        for _ in 0..MAX_SALT_ATTEMPTS {
            let candidate = profiles_root.join(format!("{}.{}", salt(), name));
            match create_dir_private(&candidate, false) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!("Salted name collision, retrying: {}", candidate.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::io_at(
            profiles_root.display().to_string(),
            format!(
                "could not allocate a unique profile directory after {} attempts",
                MAX_SALT_ATTEMPTS
            ),
        ))
    }

    /// Rewrites the registry file from the in-memory state.
    pub fn save(&self) -> Result<()> {
        let mut out = String::new();
        out.push_str("[General]\n");
        out.push_str(&format!(
            "StartWithLastProfile={}\n",
            flag(self.start_with_last)
        ));
        for p in &self.profiles {
            out.push('\n');
            out.push_str(&format!("[{}]\n", p.id));
            out.push_str(&format!("Name={}\n", p.name));
            out.push_str(&format!("Path={}\n", p.path));
            out.push_str(&format!("IsRelative={}\n", flag(p.is_relative)));
            out.push_str(&format!("Default={}\n", flag(p.is_default)));
        }
        fs::write(&self.file, out)?;
        Ok(())
    }

    /// Re-parses the on-disk file and confirms it carries the expected
    /// number of profiles.
    fn verify(&self) -> Result<()> {
        let reread = Registry::load(&self.file)?;
        if reread.profiles.len() != self.profiles.len() {
            return Err(Error::io_at(
                self.file.display().to_string(),
                format!(
                    "registry verification failed: expected {} profile(s), found {}",
                    self.profiles.len(),
                    reread.profiles.len()
                ),
            ));
        }
        Ok(())
    }

    /// Looks up a profile by name.
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The profile the application starts with, if any.
    pub fn default_profile(&self) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.is_default)
    }

    /// Resolves a profile's directory, honoring its relative flag.
    pub fn profile_dir(&self, name: &str) -> Option<PathBuf> {
        self.get(name).map(|p| self.resolve(p))
    }

    /// Resolves `profile`'s stored path against the registry directory.
    pub fn resolve(&self, profile: &Profile) -> PathBuf {
        if profile.is_relative {
            self.dir.join(&profile.path)
        } else {
            PathBuf::from(&profile.path)
        }
    }

    /// Profiles in creation order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// The registry file path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The directory containing the registry file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn start_with_last(&self) -> bool {
        self.start_with_last
    }
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        ""
    }
}

fn salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|b| (b as char).to_ascii_lowercase())
        .take(SALT_LEN)
        .collect()
}

fn registry_dir_of(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Creates a directory readable only by its owner.
fn create_dir_private(path: &Path, recursive: bool) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

/// Minimal line-oriented section parser for the registry format.
/// Comments (`;`, `#`) and blank lines are ignored; the last occurrence of
/// a key within a section wins.
fn parse_sections(text: &str) -> Vec<(String, HashMap<String, String>)> {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push((name.to_string(), HashMap::new()));
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if let Some((_, map)) = sections.last_mut() {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    sections
}

fn find_section<'a>(
    sections: &'a [(String, HashMap<String, String>)],
    name: &str,
) -> Option<&'a HashMap<String, String>> {
    sections.iter().find(|(n, _)| n == name).map(|(_, m)| m)
}

fn section_value(
    sections: &[(String, HashMap<String, String>)],
    section: &str,
    key: &str,
) -> String {
    find_section(sections, section)
        .and_then(|m| m.get(key))
        .cloned()
        .unwrap_or_default()
}
