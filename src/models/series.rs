// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use serde::Serialize;

/// One sample of a rate series. `rate` is `None` when the date could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub rate: Option<f64>,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, rate: Option<f64>) -> Self {
        Self { date, rate }
    }
}

/// Dates whose rate is missing, in series order.
pub fn missing_dates(points: &[SeriesPoint]) -> Vec<NaiveDate> {
    points
        .iter()
        .filter(|p| p.rate.is_none())
        .map(|p| p.date)
        .collect()
}

/// Lowest and highest known rate, or `None` when every point is missing.
pub fn rate_bounds(points: &[SeriesPoint]) -> Option<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| p.rate)
        .fold(None, |acc, rate| match acc {
            None => Some((rate, rate)),
            Some((lo, hi)) => Some((lo.min(rate), hi.max(rate))),
        })
}
