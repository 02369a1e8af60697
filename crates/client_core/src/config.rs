use std::{fs, path::Path};

use serde::Deserialize;
use shared::{error::ErrorNormalization, signals::SignalNaming};
use url::Url;

use crate::error::SettingsError;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SETTINGS_FILE: &str = "findability.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub signal_naming: SignalNaming,
    pub error_normalization: ErrorNormalization,
    pub reuse_existing_company: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            signal_naming: SignalNaming::Translated,
            error_normalization: ErrorNormalization::Rich,
            reuse_existing_company: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    signal_naming: Option<String>,
    error_detail: Option<String>,
    reuse_existing_company: Option<bool>,
}

pub fn load_settings() -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();
    let default_path = Path::new(DEFAULT_SETTINGS_FILE);
    if default_path.exists() {
        apply_file(&mut settings, default_path)?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

// The explicit file must exist.
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();
    apply_file(&mut settings, path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> Result<(), SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let file_cfg: FileSettings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(v) = file_cfg.api_base {
        settings.api_base = normalize_api_base(&v)?;
    }
    if let Some(v) = file_cfg.signal_naming {
        settings.signal_naming = v.parse()?;
    }
    if let Some(v) = file_cfg.error_detail {
        settings.error_normalization = v.parse()?;
    }
    if let Some(v) = file_cfg.reuse_existing_company {
        settings.reuse_existing_company = v;
    }
    Ok(())
}

pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(v) = lookup("FINDABILITY_API_BASE") {
        settings.api_base = normalize_api_base(&v)?;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = normalize_api_base(&v)?;
    }
    if let Some(v) = lookup("APP__SIGNAL_NAMING") {
        settings.signal_naming = v.parse()?;
    }
    if let Some(v) = lookup("APP__ERROR_DETAIL") {
        settings.error_normalization = v.parse()?;
    }
    if let Some(v) = lookup("APP__REUSE_EXISTING_COMPANY") {
        settings.reuse_existing_company = parse_bool("APP__REUSE_EXISTING_COMPANY", &v)?;
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

pub fn normalize_api_base(raw: &str) -> Result<String, SettingsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_API_BASE.to_string());
    }

    let parsed = Url::parse(raw).map_err(|err| SettingsError::InvalidApiBase {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SettingsError::InvalidApiBase {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(SettingsError::InvalidApiBase {
            value: raw.to_string(),
            reason: "query strings and fragments are not allowed".to_string(),
        });
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
