// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use reqwest::Client;
use std::time::Duration;

use super::{RateFeed, RawFeedResponse};
use crate::config::Config;
use crate::error::RateError;

/// Client for the central bank's daily rates feed.
#[derive(Clone)]
pub struct CbrClient {
    client: Client,
    base_url: String,
}

impl CbrClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RateError> {
        Self::new(&config.feed_url, config.request_timeout())
    }

    /// Feed URL for a date, e.g. `...XML_daily.asp?date_req=02/03/2024`.
    pub fn url_for(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => {
                let separator = if self.base_url.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}date_req={}",
                    self.base_url,
                    separator,
                    date.format("%d/%m/%Y")
                )
            }
            None => self.base_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl RateFeed for CbrClient {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawFeedResponse, RateError> {
        let url = self.url_for(date);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Transport(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RateError::Transport(format!("Failed to read response: {}", e)))?;

        let (body_text, content_encoding) = decode_body(&bytes);
        log::info!(
            "Feed answered {} with {} bytes for {}",
            status.as_u16(),
            bytes.len(),
            date.map(|d| d.to_string()).unwrap_or_else(|| "today".to_string())
        );

        Ok(RawFeedResponse {
            status_code: status.as_u16(),
            body_text,
            content_encoding: content_encoding.to_string(),
        })
    }
}

/// Decode a feed body. The feed publishes windows-1251; a byte order mark wins
/// over that default.
pub fn decode_body(bytes: &[u8]) -> (String, &'static str) {
    let (text, encoding, had_errors) = WINDOWS_1251.decode(bytes);
    if had_errors {
        log::warn!("Feed body had bytes invalid in {}", encoding.name());
    }
    (text.into_owned(), encoding.name())
}
