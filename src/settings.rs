// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "currency_settings.toml";
pub const LAST_CONVERSION_FILE: &str = "last_conversion.json";

/// Selections restored at startup and saved after a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub from_code: String,
    pub to_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            from_code: "USD".to_string(),
            to_code: "RUB".to_string(),
            amount: None,
        }
    }
}

/// Saved selections, or the defaults when nothing was saved yet. Never writes.
pub fn load_state(path: &Path) -> Result<PersistedState> {
    if !path.exists() {
        return Ok(PersistedState::default());
    }
    confy::load_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn save_state(path: &Path, state: &PersistedState) -> Result<()> {
    confy::store_path(path, state).with_context(|| format!("Failed to write {}", path.display()))
}

/// The most recent successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastConversion {
    pub from_code: String,
    pub to_code: String,
    pub amount: f64,
    pub rate: f64,
    pub converted_amount: f64,
    pub as_of: Option<NaiveDate>,
}

pub fn save_last_conversion(path: &Path, conversion: &LastConversion) -> Result<()> {
    let json = serde_json::to_string_pretty(conversion)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_last_conversion(path: &Path) -> Result<Option<LastConversion>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&json)?))
}
