// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod cbr_client;
pub mod connectivity;

pub use cbr_client::CbrClient;
pub use connectivity::{ProbeAttempt, Prober};

use chrono::NaiveDate;

use crate::error::RateError;

/// Raw answer of the rate feed. Non-success statuses are data, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeedResponse {
    pub status_code: u16,
    pub body_text: String,
    /// Name of the character encoding the body was decoded from.
    pub content_encoding: String,
}

impl RawFeedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[async_trait::async_trait]
pub trait RateFeed: Send + Sync {
    /// One GET against the feed; `None` asks for the current snapshot.
    /// Only transport failures are errors.
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawFeedResponse, RateError>;
}

#[async_trait::async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// `true` as soon as one probe target accepts a connection.
    async fn probe(&self) -> bool;
}
