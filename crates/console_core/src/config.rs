use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

use crate::{radar::RadarDisplay, sequencer::CaptureTiming, session::SessionOptions};

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base: String,
    pub poll_interval_ms: u64,
    pub live_view_interval_ms: u64,
    pub photo_delay_ms: u64,
    pub fetch_after_photo_ms: u64,
    pub fetch_after_explicit_photo_ms: u64,
    pub manual_capture_fetch_ms: u64,
    pub radar_size: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/api".into(),
            poll_interval_ms: 2000,
            live_view_interval_ms: 3000,
            photo_delay_ms: 200,
            fetch_after_photo_ms: 600,
            fetch_after_explicit_photo_ms: 800,
            manual_capture_fetch_ms: 1500,
            radar_size: 220.0,
        }
    }
}

impl Settings {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            live_view_interval: Duration::from_millis(self.live_view_interval_ms.max(1)),
            capture: CaptureTiming {
                photo_delay: Duration::from_millis(self.photo_delay_ms),
                fetch_after_photo: Duration::from_millis(self.fetch_after_photo_ms),
                fetch_after_explicit_photo: Duration::from_millis(
                    self.fetch_after_explicit_photo_ms,
                ),
                manual_capture_fetch: Duration::from_millis(self.manual_capture_fetch_ms),
            },
            radar_display: RadarDisplay::new(self.radar_size),
        }
    }

    /// The API base URL without a trailing slash; must be http(s).
    pub fn api_base_url(&self) -> anyhow::Result<String> {
        let parsed = Url::parse(self.api_base.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("api base url '{}' must use http or https", self.api_base);
        }
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }
}

/// Defaults, then the config file, then environment overrides.
///
/// An explicitly named file must exist; the default `console.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match config_path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("OCEAN_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("APP__POLL_INTERVAL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_interval_ms = parsed;
        }
    }
    if let Some(v) = lookup("APP__LIVE_VIEW_INTERVAL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.live_view_interval_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
