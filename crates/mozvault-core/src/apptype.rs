//! Application type definitions.
//!
//! Every profile registry belongs to one application family. The type name
//! drives profile-root discovery (`~/.mozilla/firefox`, `~/Thunderbird`, ...)
//! and the archive naming convention.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Mozilla-family application whose profiles mozvault can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Firefox,
    Thunderbird,
    Seamonkey,
    Sunbird,

    /// Synthetic type for exercising the engine without touching real
    /// application data.
    Pseudo,
}

impl AppType {
    /// Lowercase name, as used in dot-directories and archive names.
    pub fn name(&self) -> &'static str {
        match self {
            AppType::Firefox => "firefox",
            AppType::Thunderbird => "thunderbird",
            AppType::Seamonkey => "seamonkey",
            AppType::Sunbird => "sunbird",
            AppType::Pseudo => "pseudo",
        }
    }

    /// Capitalized name, as used in `~/Mozilla/<Type>` style directories.
    pub fn capitalized(&self) -> &'static str {
        match self {
            AppType::Firefox => "Firefox",
            AppType::Thunderbird => "Thunderbird",
            AppType::Seamonkey => "Seamonkey",
            AppType::Sunbird => "Sunbird",
            AppType::Pseudo => "Pseudo",
        }
    }

    /// Returns all real application types (excludes the test-only pseudo type).
    pub fn all() -> Vec<AppType> {
        vec![
            AppType::Firefox,
            AppType::Thunderbird,
            AppType::Seamonkey,
            AppType::Sunbird,
        ]
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<AppType> {
        match s.to_lowercase().as_str() {
            "firefox" => Some(AppType::Firefox),
            "thunderbird" => Some(AppType::Thunderbird),
            "seamonkey" => Some(AppType::Seamonkey),
            "sunbird" => Some(AppType::Sunbird),
            "pseudo" => Some(AppType::Pseudo),
            _ => None,
        }
    }
}

impl Default for AppType {
    fn default() -> Self {
        AppType::Firefox
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AppType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AppType::parse(s).ok_or_else(|| {
            format!(
                "unknown application type '{}' (expected one of: firefox, thunderbird, seamonkey, sunbird)",
                s
            )
        })
    }
}
