// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

/// Coarse classification of a [`RateError`], so callers can branch on the kind
/// of failure instead of on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No network path, DNS failure, refused connection, timeout or an upstream
    /// that answered with a non-success status.
    Transport,
    /// The feed body is not well-formed markup.
    Parse,
    /// Well-formed feed with a missing/invalid field, or an absent currency code.
    Data,
    /// Caller-supplied input was rejected before any work was done.
    Validation,
}

#[derive(Error, Debug)]
pub enum RateError {
    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Feed returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("Rate service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed feed: {0}")]
    Parse(String),

    #[error("Record {record} is missing field {field}")]
    MissingField { field: &'static str, record: usize },

    #[error("Invalid {field} value: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Currency {0} is listed more than once")]
    DuplicateCurrency(String),

    #[error("Currency {0} not found in rate table")]
    UnknownCurrency(String),

    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
}

impl RateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RateError::Transport(_) | RateError::HttpStatus(_) | RateError::Unavailable(_) => {
                ErrorKind::Transport
            }
            RateError::Parse(_) => ErrorKind::Parse,
            RateError::MissingField { .. }
            | RateError::InvalidValue { .. }
            | RateError::DuplicateCurrency(_)
            | RateError::UnknownCurrency(_) => ErrorKind::Data,
            RateError::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        RateError::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for RateError {
    fn from(err: quick_xml::Error) -> Self {
        RateError::Parse(err.to_string())
    }
}
