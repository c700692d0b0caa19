//! Profile root discovery.
//!
//! Finds the directory holding an application's `profiles.ini` and profile
//! subdirectories. The search is a pure function of the supplied home
//! directory and environment snapshot: candidates for every platform are
//! evaluated in one fixed priority order, and entries that belong to a
//! foreign platform simply never exist on disk. Nothing here reads or
//! mutates real process environment state, which keeps the locator fully
//! testable.

use mozvault_core::AppType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shared environment override: joined with the capitalized type name.
pub const SHARED_ROOT_VAR: &str = "MOZVAULT_PROFILE_ROOT";

/// An immutable snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Empty snapshot, for tests and fully explicit invocations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

/// Type-specific override variable, e.g. `FIREFOX_PROFILE_HOME`.
fn type_override_var(app: AppType) -> String {
    format!("{}_PROFILE_HOME", app.name().to_uppercase())
}

/// Candidate profile roots for `app`, in priority order.
fn candidates(home: &Path, env: &Environment, app: AppType) -> Vec<PathBuf> {
    let mut out = Vec::new();

    if let Some(dir) = env.get(&type_override_var(app)) {
        out.push(PathBuf::from(dir));
    }
    if let Some(root) = env.get(SHARED_ROOT_VAR) {
        out.push(Path::new(root).join(app.capitalized()));
    }

    out.push(home.join(format!(".{}", app.name())));
    out.push(home.join(".mozilla").join(app.name()));
    out.push(home.join(app.capitalized()));
    out.push(home.join("Mozilla").join(app.capitalized()));

    // macOS conventions
    out.push(
        home.join("Library")
            .join("Application Support")
            .join(app.capitalized()),
    );
    out.push(
        home.join("Library")
            .join("Application Support")
            .join("Mozilla")
            .join(app.capitalized()),
    );
    out.push(home.join("Library").join(app.capitalized()));

    // Windows conventions
    if let Some(program_files) = env.get("ProgramFiles") {
        out.push(Path::new(program_files).join(format!("Mozilla {}", app.capitalized())));
        out.push(Path::new(program_files).join(app.capitalized()));
    }

    out
}

/// Returns the first candidate that exists as a directory, or None.
pub fn find_profile_root(home: &Path, env: &Environment, app: AppType) -> Option<PathBuf> {
    for candidate in candidates(home, env, app) {
        if candidate.is_dir() {
            debug!("Profile root for {}: {}", app, candidate.display());
            return Some(candidate);
        }
        debug!("Not a profile root: {}", candidate.display());
    }
    None
}
