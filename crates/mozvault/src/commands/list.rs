//! List command

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Args;
use console::style;
use mozvault_core::AppType;

use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Application type
    #[arg(short = 't', long = "type", default_value = "firefox")]
    pub app_type: AppType,

    /// Profile root directory (skip the locator)
    #[arg(short, long)]
    pub path: Option<Utf8PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs) -> Result<()> {
    let root = super::resolve_root(args.app_type, args.path.as_deref())?;
    let registry = super::load_registry(&root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(registry.profiles())?);
        return Ok(());
    }

    output::header(&format!("{} profiles", args.app_type.capitalized()));
    output::kv("Registry", &registry.file().display().to_string());

    if registry.is_empty() {
        output::info("No profiles registered");
        return Ok(());
    }

    println!();
    for profile in registry.profiles() {
        let marker = if profile.is_default { "*" } else { " " };
        println!(
            "  {} {}  {}  {}",
            style(marker).green().bold(),
            style(&profile.id).dim(),
            profile.name,
            style(registry.resolve(profile).display()).dim()
        );
    }

    Ok(())
}
