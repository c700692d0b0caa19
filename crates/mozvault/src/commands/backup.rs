//! Backup command

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Args;
use mozvault_backup::{archive_name, new_backend, BackendOptions, BackupEngine, ExclusionFilter};
use mozvault_core::AppType;
use std::path::PathBuf;

use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Application type
    #[arg(short = 't', long = "type", default_value = "firefox")]
    pub app_type: AppType,

    /// Profile name (default: the registry's default profile)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Profile root directory (skip the locator)
    #[arg(short, long)]
    pub path: Option<Utf8PathBuf>,

    /// Archive backend
    #[arg(long, default_value = "targz")]
    pub plugin: String,

    /// Backend option, as key=value (repeatable)
    #[arg(long = "plugin-option")]
    pub plugin_options: Vec<String>,

    /// Output file, or directory for the conventional archive name
    #[arg(short, long, default_value = ".")]
    pub output: Utf8PathBuf,

    /// Additional exclusion patterns, anchored against the profile root
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Archive entries under absolute paths instead of profile-relative names
    #[arg(long)]
    pub absolute_paths: bool,
}

pub fn run(args: BackupArgs) -> Result<()> {
    output::header("Backup Profile");

    let root = super::resolve_root(args.app_type, args.path.as_deref())?;
    let registry = super::load_registry(&root)?;

    let profile = match &args.name {
        Some(name) => registry
            .get(name)
            .with_context(|| format!("profile '{}' not found in {}", name, registry.file().display()))?,
        None => registry
            .default_profile()
            .with_context(|| format!("registry {} has no default profile", registry.file().display()))?,
    }
    .clone();
    let profile_dir = registry.resolve(&profile);

    let options = BackendOptions::parse(&args.plugin_options)?;
    let mut backend = new_backend(&args.plugin, &options)?;

    let destination = resolve_destination(&args, &profile.name, backend.as_ref());

    output::kv("Type", args.app_type.name());
    output::kv("Profile", &profile.name);
    output::kv("Source", &profile_dir.display().to_string());
    output::kv("Backend", backend.name());
    output::kv("Destination", &destination.display().to_string());

    let exclusions = ExclusionFilter::with_defaults(&args.exclude)?;
    let engine = BackupEngine::new(exclusions, !args.absolute_paths);

    let spinner = output::spinner("Archiving profile...");
    let result = engine.backup(&profile_dir, &destination, backend.as_mut());
    spinner.finish_and_clear();
    let summary = result?;

    output::success("Backup created");
    output::kv("Entries", &summary.entries.to_string());
    output::kv("Excluded", &summary.excluded.to_string());
    output::kv("Duration", &format!("{:.1}s", summary.duration_seconds));

    output::info("Restore with:");
    println!("  mozvault restore {}", summary.archive_path.display());

    Ok(())
}

/// A directory output (or the default ".") gets the conventional
/// `<type>-<name>-<timestamp>` archive name; a file path is munged through
/// the backend so the canonical extension is present.
fn resolve_destination(
    args: &BackupArgs,
    profile_name: &str,
    backend: &dyn mozvault_backup::ArchiveBackend,
) -> PathBuf {
    let output = args.output.as_std_path();
    if output.is_dir() {
        output.join(archive_name(args.app_type, profile_name, backend))
    } else {
        PathBuf::from(backend.munge_location(args.output.as_str()))
    }
}
