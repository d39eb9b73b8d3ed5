// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

/// A host the connectivity prober tries to reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    /// Forces a TLS handshake on or off; when omitted, port 443 implies TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
}

impl ProbeTarget {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            tls: None,
        }
    }

    pub fn uses_tls(&self) -> bool {
        self.tls.unwrap_or(self.port == 443)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed_url: String,
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub history_days: usize,
    pub series_concurrency: usize,
    pub currencies: Vec<String>,
    // Kept last: TOML needs plain values ahead of arrays of tables.
    pub probe_targets: Vec<ProbeTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            request_timeout_secs: 10,
            probe_timeout_secs: 5,
            history_days: 10,
            series_concurrency: 1,
            currencies: [
                "USD", "EUR", "GBP", "JPY", "CNY", "RUB", "BRL", "KZT", "PLN", "BYN", "CZK",
                "SEK", "RSD",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            probe_targets: vec![
                ProbeTarget::new("www.google.com", 80),
                ProbeTarget::new("www.google.com", 443),
                ProbeTarget::new("www.yandex.ru", 80),
                ProbeTarget::new("www.microsoft.com", 443),
            ],
        }
    }
}

impl Config {
    /// Feed request timeout. Never zero, so a fetch can not wait forever.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

fn get_config_path() -> PathBuf {
    std::env::var("CBR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Load `config.toml` (or the file named by `CBR_CONFIG`), falling back to the
/// defaults when it does not exist. `CBR_FEED_URL` overrides the feed URL.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = load_config_from(&get_config_path())?;
    if let Ok(url) = std::env::var("CBR_FEED_URL") {
        if !url.trim().is_empty() {
            config.feed_url = url.trim().to_string();
        }
    }
    Ok(config)
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}

pub fn default_config_path() -> PathBuf {
    get_config_path()
}
