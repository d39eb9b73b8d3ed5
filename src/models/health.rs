// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    Available,
    /// Network and feed reachable, but the feed did not answer with success.
    Degraded,
    /// No network path, or the feed could not be reached at all.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub availability: Availability,
    pub detail: String,
}

impl HealthStatus {
    pub fn available() -> Self {
        Self {
            availability: Availability::Available,
            detail: "API available".to_string(),
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            availability: Availability::Degraded,
            detail: detail.into(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            availability: Availability::Unavailable,
            detail: detail.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Severity colour for status indicators.
    pub fn color(&self) -> &'static str {
        match self.availability {
            Availability::Available => "green",
            Availability::Degraded => "yellow",
            Availability::Unavailable => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.color(), self.detail)
    }
}
