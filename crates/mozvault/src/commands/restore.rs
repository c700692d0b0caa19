//! Restore command

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use mozvault_backup::{new_backend, BackendOptions, ExclusionFilter, RestoreEngine};
use mozvault_core::AppType;
use mozvault_profiles::{Registry, REGISTRY_FILE};

use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Archive to restore
    pub archive: Utf8PathBuf,

    /// Application type
    #[arg(short = 't', long = "type", default_value = "firefox")]
    pub app_type: AppType,

    /// Target profile name (default: derived from the archive name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Profile root directory (skip the locator)
    #[arg(short, long)]
    pub path: Option<Utf8PathBuf>,

    /// Archive backend (default: inferred from the archive extension)
    #[arg(long)]
    pub plugin: Option<String>,

    /// Backend option, as key=value (repeatable)
    #[arg(long = "plugin-option")]
    pub plugin_options: Vec<String>,

    /// Exclusion patterns applied to the archive's entries
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Mark the restored profile as the application's default
    #[arg(long)]
    pub set_default: bool,

    /// Skip preference-path rewriting
    #[arg(long)]
    pub no_prefs: bool,
}

pub fn run(args: RestoreArgs) -> Result<()> {
    output::header("Restore Profile");

    let root = super::resolve_root(args.app_type, args.path.as_deref())?;

    // A fresh machine has no registry yet; an existing one is left alone.
    Registry::create(&root, true)?;
    let mut registry = Registry::load(&root.join(REGISTRY_FILE))?;

    let plugin = match &args.plugin {
        Some(plugin) => plugin.clone(),
        None => infer_plugin(&args.archive).to_string(),
    };
    let profile_name = match &args.name {
        Some(name) => name.clone(),
        None => profile_name_from_archive(&args.archive)
            .context("cannot derive a profile name from the archive name; pass --name")?,
    };

    output::kv("Type", args.app_type.name());
    output::kv("Archive", args.archive.as_str());
    output::kv("Profile", &profile_name);
    output::kv("Backend", &plugin);

    let options = BackendOptions::parse(&args.plugin_options)?;
    let mut backend = new_backend(&plugin, &options)?;

    let exclusions = ExclusionFilter::compile(&args.exclude)?;
    let engine = RestoreEngine::new(exclusions, !args.no_prefs);

    let spinner = output::spinner("Restoring profile...");
    let result = engine.restore(
        args.archive.as_std_path(),
        &mut registry,
        &profile_name,
        args.set_default,
        backend.as_mut(),
    );
    spinner.finish_and_clear();
    let summary = result?;

    output::success("Restore complete");
    output::kv("Profile dir", &summary.profile_dir.display().to_string());
    output::kv("Restored", &summary.restored.to_string());
    output::kv("Skipped", &summary.skipped.to_string());
    if summary.created_profile {
        output::info(&format!("Created new profile '{}'", profile_name));
    }
    match &summary.prefs {
        Some(report) => output::kv(
            "Preferences",
            &format!("{} path(s) rewritten", report.rewritten),
        ),
        None if !args.no_prefs => output::warning("No preference paths were rewritten"),
        None => {}
    }

    Ok(())
}

/// Picks a backend from the archive's shape: `.tar.gz`/`.tgz`, `.zip`, or a
/// plain directory.
fn infer_plugin(archive: &Utf8Path) -> &'static str {
    let name = archive.as_str();
    if name.ends_with(".zip") {
        "zip"
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        "targz"
    } else if archive.as_std_path().is_dir() {
        "dir"
    } else {
        "targz"
    }
}

/// Recovers the profile name from the `<type>-<name>-<date>-<time>` naming
/// convention. Names containing `-` survive because the type, date, and
/// time segments are fixed.
fn profile_name_from_archive(archive: &Utf8Path) -> Option<String> {
    let stem = archive
        .file_name()?
        .trim_end_matches(".tar.gz")
        .trim_end_matches(".tgz")
        .trim_end_matches(".zip");
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 4 {
        return None;
    }
    let name = parts[1..parts.len() - 2].join("-");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
