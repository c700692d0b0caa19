//! Command implementations

pub mod backup;
pub mod list;
pub mod restore;

use anyhow::{Context, Result};
use camino::Utf8Path;
use mozvault_core::AppType;
use mozvault_profiles::{find_profile_root, Environment, Registry, REGISTRY_FILE};
use std::path::PathBuf;

/// Resolves the profile root for `app`: an explicit `--path` wins, otherwise
/// the locator searches from the real home directory and environment.
pub fn resolve_root(app: AppType, path: Option<&Utf8Path>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path.as_std_path().to_path_buf());
    }
    let home = dirs::home_dir().context("could not determine the home directory")?;
    find_profile_root(&home, &Environment::from_process(), app)
        .with_context(|| format!("no profile root found for '{}'", app))
}

/// Loads the registry under `root`.
pub fn load_registry(root: &std::path::Path) -> Result<Registry> {
    let file = root.join(REGISTRY_FILE);
    Ok(Registry::load(&file)?)
}
