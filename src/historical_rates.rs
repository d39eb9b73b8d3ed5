// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};

use crate::api::{ConnectivityProbe, RateFeed};
use crate::currencies::RateService;
use crate::models::SeriesPoint;

impl<F, P> RateService<F, P>
where
    F: RateFeed,
    P: ConnectivityProbe,
{
    /// Rate of `from_code` in `to_code` for each date, in the order given.
    ///
    /// A date that can not be priced (transport, status, parse or missing
    /// currency) becomes a point with `rate: None`; the series is never cut short.
    pub async fn build_series(
        &self,
        from_code: &str,
        to_code: &str,
        dates: &[NaiveDate],
    ) -> Vec<SeriesPoint> {
        let mut slots: Vec<Option<f64>> = vec![None; dates.len()];

        let mut pending = stream::iter(dates.iter().copied().enumerate())
            .map(|(idx, date)| async move {
                (idx, date, self.rate_on(from_code, to_code, Some(date)).await)
            })
            .buffer_unordered(self.series_concurrency.max(1));

        while let Some((idx, date, result)) = pending.next().await {
            match result {
                Ok(rate) => {
                    log::debug!("{} {}->{}: {}", date, from_code, to_code, rate);
                    slots[idx] = Some(rate);
                }
                Err(e) => {
                    log::warn!(
                        "No {}->{} rate for {}: {}",
                        from_code,
                        to_code,
                        date.format("%d.%m.%Y"),
                        e
                    );
                }
            }
        }

        dates
            .iter()
            .zip(slots)
            .map(|(date, rate)| SeriesPoint::new(*date, rate))
            .collect()
    }
}
