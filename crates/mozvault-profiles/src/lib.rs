//! # mozvault-profiles
//!
//! Profile discovery and registry management for mozvault:
//! - Locating an application's profile root from an injected home directory
//!   and environment snapshot
//! - Parsing and rewriting the `profiles.ini` registry
//! - Rewriting profile-relative preference paths after a restore

pub mod locator;
pub mod prefs;
pub mod registry;

pub use locator::{find_profile_root, Environment};
pub use prefs::{rewrite_preferences, RewriteReport, PREFS_FILE};
pub use registry::{Profile, Registry, REGISTRY_FILE};
