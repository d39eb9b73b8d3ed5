// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RateError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub from_code: String,
    pub to_code: String,
    pub amount: f64,
    /// `None` asks for the feed's current snapshot.
    pub as_of: Option<NaiveDate>,
}

impl ConversionRequest {
    /// Codes are trimmed and upper-cased; nothing is validated until [`validate`](Self::validate).
    pub fn new(from_code: &str, to_code: &str, amount: f64, as_of: Option<NaiveDate>) -> Self {
        Self {
            from_code: from_code.trim().to_ascii_uppercase(),
            to_code: to_code.trim().to_ascii_uppercase(),
            amount,
            as_of,
        }
    }

    pub fn swapped(&self) -> Self {
        Self {
            from_code: self.to_code.clone(),
            to_code: self.from_code.clone(),
            amount: self.amount,
            as_of: self.as_of,
        }
    }

    /// Collects every problem with the request into one `Validation` error.
    pub fn validate(&self) -> Result<(), RateError> {
        let mut problems = Vec::new();
        check_code(&self.from_code, "source", &mut problems);
        check_code(&self.to_code, "target", &mut problems);
        if !self.amount.is_finite() {
            problems.push("amount must be a number".to_string());
        } else if self.amount <= 0.0 {
            problems.push("amount must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RateError::Validation(problems))
        }
    }
}

fn check_code(code: &str, role: &str, problems: &mut Vec<String>) {
    if code.is_empty() {
        problems.push(format!("{} currency is empty", role));
    } else if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        problems.push(format!("{} currency {:?} is not a 3-letter code", role, code));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub rate: f64,
    pub converted_amount: f64,
}

impl ConversionResult {
    pub fn new(amount: f64, rate: f64) -> Self {
        Self {
            rate,
            converted_amount: amount * rate,
        }
    }
}
