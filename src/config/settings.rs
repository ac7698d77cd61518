// src/config/settings.rs
//! Tunables loaded from TOML: cascade stages/page budget and registration limits.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::selection::cascade::CascadeConfig;

pub const ENV_SETTINGS_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_SETTINGS_PATH: &str = "config/digest.toml";

fn default_max_interests() -> usize {
    20
}
fn default_priority() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// A room holding this many interests accepts no more.
    #[serde(default = "default_max_interests")]
    pub max_interests_per_room: usize,
    #[serde(default = "default_priority")]
    pub default_priority: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_interests_per_room: default_max_interests(),
            default_priority: default_priority(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(s).context("parsing digest settings")?;
        if settings.registration.default_priority == 0 {
            settings.registration.default_priority = default_priority();
        }
        Ok(settings)
    }
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    Settings::from_toml_str(&content)
}

/// Load settings using env var + fallbacks:
/// 1) $DIGEST_CONFIG_PATH
/// 2) config/digest.toml
/// 3) built-in defaults
pub fn load_settings_default() -> Result<Settings> {
    if let Ok(p) = std::env::var(ENV_SETTINGS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_settings_from(&pb);
        }
        return Err(anyhow!("{ENV_SETTINGS_PATH} points to non-existent path"));
    }
    let default_p = PathBuf::from(DEFAULT_SETTINGS_PATH);
    if default_p.exists() {
        return load_settings_from(&default_p);
    }
    Ok(Settings::default())
}
