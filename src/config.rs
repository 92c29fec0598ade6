// src/config.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::{debug, info};
use url::Url;

use crate::{error::ConfigError, poll::POLL_INTERVAL};

pub const DEFAULT_SETTINGS_FILE: &str = "heatboard.json";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

static SHEET_ID_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("sheet id pattern"));

/// Remembered between runs, like the page's local storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sheet_id: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
}

impl Settings {
    /// A missing file is an empty config, not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        fs::write(path, text).map_err(write_err)?;
        info!(path = %path.display(), "saved settings");
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(POLL_INTERVAL)
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }
}

/// Accepts either a bare sheet id or a pasted sheet URL.
pub fn sheet_id_from_input(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let id = SHEET_ID_IN_URL
        .captures(input)
        .and_then(|c| c.get(1))
        .map_or(input, |m| m.as_str());
    Some(id.to_string())
}

/// CSV export URL for the first tab of a sheet.
pub fn export_url(sheet_id: &str) -> Result<Url, ConfigError> {
    let base = format!("https://docs.google.com/spreadsheets/d/{}/export", sheet_id);
    let mut url = Url::parse(&base).map_err(|e| ConfigError::BadUrl(base.clone(), e))?;
    url.query_pairs_mut()
        .append_pair("format", "csv")
        .append_pair("id", sheet_id)
        .append_pair("gid", "0");
    Ok(url)
}

/// The sheet id worth remembering: only one given on the command line that
/// actually ends up as the live source.
pub fn sheet_to_remember(offline: bool, url: Option<&str>, sheet: Option<&str>) -> Option<String> {
    if offline || url.is_some() {
        return None;
    }
    sheet.and_then(sheet_id_from_input)
}

/// Which source the board runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice {
    Live(Url),
    /// Mock data. `demo` is set when we fell back because nothing was configured.
    Offline { demo: bool },
}

/// Pick the source: `--offline` wins, then an explicit URL, then a sheet
/// given now, then the remembered sheet. Nothing at all means demo mode.
pub fn choose_source(
    offline: bool,
    url: Option<&str>,
    sheet: Option<&str>,
    settings: &Settings,
) -> Result<Choice, ConfigError> {
    if offline {
        return Ok(Choice::Offline { demo: false });
    }
    if let Some(raw) = url {
        let url = Url::parse(raw.trim()).map_err(|e| ConfigError::BadUrl(raw.to_string(), e))?;
        return Ok(Choice::Live(url));
    }
    let id = sheet
        .and_then(sheet_id_from_input)
        .or_else(|| settings.sheet_id.as_deref().and_then(sheet_id_from_input));
    match id {
        Some(id) => Ok(Choice::Live(export_url(&id)?)),
        None => Ok(Choice::Offline { demo: true }),
    }
}
