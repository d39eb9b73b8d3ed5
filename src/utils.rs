// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Duration, NaiveDate};

use crate::error::RateError;

/// `days` dates ending at `end`, most recent first.
pub fn trailing_dates(end: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days)
        .filter_map(|i| end.checked_sub_signed(Duration::days(i as i64)))
        .collect()
}

/// Parse an amount typed by the user.
pub fn parse_amount(text: &str) -> Result<f64, RateError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RateError::Validation(vec![
            "enter an amount to convert".to_string(),
        ]));
    }
    let amount: f64 = text
        .parse()
        .map_err(|_| RateError::Validation(vec!["enter a valid number".to_string()]))?;
    if !amount.is_finite() {
        return Err(RateError::Validation(vec!["enter a valid number".to_string()]));
    }
    if amount <= 0.0 {
        return Err(RateError::Validation(vec![
            "amount must be a positive number".to_string(),
        ]));
    }
    Ok(amount)
}

/// Move `amount` by `step`; refuses to go below zero.
pub fn step_amount(amount: f64, step: f64) -> Result<f64, RateError> {
    let next = amount + step;
    if next < 0.0 {
        return Err(RateError::Validation(vec![
            "amount can not be less than zero".to_string(),
        ]));
    }
    Ok(next)
}

/// Two-decimal presentation of an amount.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
