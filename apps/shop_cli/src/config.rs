use std::{fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::Context;
use client_core::{ApiEndpoints, Profile, DEFAULT_API_BASE};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub stream_checkout: bool,
    pub simulation_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub profile: Profile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE.into(),
            stream_checkout: true,
            simulation_delay_ms: 800,
            request_timeout_secs: 30,
            profile: Profile::default(),
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> anyhow::Result<ApiEndpoints> {
        ApiEndpoints::parse(&self.api_url)
            .with_context(|| format!("invalid api url '{}'", self.api_url))
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_url: Option<String>,
    stream_checkout: Option<bool>,
    simulation_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    profile: Option<Profile>,
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            apply_file(&mut settings, &raw)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.profile = settings.profile.normalized();
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.stream_checkout {
        settings.stream_checkout = v;
    }
    if let Some(v) = file_cfg.simulation_delay_ms {
        settings.simulation_delay_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.profile {
        settings.profile = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SHOP_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP__STREAM_CHECKOUT").and_then(|v| parse_flag(&v)) {
        settings.stream_checkout = v;
    }
    if let Some(v) = lookup("APP__SIMULATION_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.simulation_delay_ms = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }

    if let Some(v) = lookup("APP__CURRENCY") {
        settings.profile.currency = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
