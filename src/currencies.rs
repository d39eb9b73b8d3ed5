// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;

use crate::api::{CbrClient, ConnectivityProbe, ProbeAttempt, Prober, RateFeed};
use crate::config::Config;
use crate::error::RateError;
use crate::health;
use crate::models::{Availability, ConversionRequest, ConversionResult, HealthStatus, RateTable};

/// Entry point for the shell: health gate, feed fetch, parsing and cross rates.
pub struct RateService<F, P> {
    pub(crate) feed: F,
    pub(crate) prober: P,
    pub(crate) series_concurrency: usize,
}

impl RateService<CbrClient, Prober> {
    pub fn from_config(config: &Config) -> Result<Self, RateError> {
        Ok(Self::new(CbrClient::from_config(config)?, Prober::from_config(config))
            .with_series_concurrency(config.series_concurrency))
    }

    /// Every connection attempt of one probe run, for diagnostics.
    pub async fn probe_attempts(&self) -> Vec<ProbeAttempt> {
        self.prober.probe_detailed().await
    }
}

impl<F, P> RateService<F, P>
where
    F: RateFeed,
    P: ConnectivityProbe,
{
    pub fn new(feed: F, prober: P) -> Self {
        Self {
            feed,
            prober,
            series_concurrency: 1,
        }
    }

    /// How many dates a series build may fetch at once; 1 keeps it sequential.
    pub fn with_series_concurrency(mut self, concurrency: usize) -> Self {
        self.series_concurrency = concurrency.max(1);
        self
    }

    pub async fn probe(&self) -> bool {
        self.prober.probe().await
    }

    pub async fn check_health(&self) -> HealthStatus {
        health::check_health(&self.prober, &self.feed).await
    }

    /// Fetch and parse the table for a date. A non-success status is an error here.
    pub async fn fetch_table(&self, date: Option<NaiveDate>) -> Result<RateTable, RateError> {
        let response = self.feed.fetch(date).await?;
        if !response.is_success() {
            return Err(RateError::HttpStatus(response.status_code));
        }
        RateTable::parse(&response.body_text)
    }

    /// Units of `to_code` per one `from_code` on a date.
    pub async fn rate_on(
        &self,
        from_code: &str,
        to_code: &str,
        date: Option<NaiveDate>,
    ) -> Result<f64, RateError> {
        let table = self.fetch_table(date).await?;
        table.cross_rate(from_code, to_code)
    }

    /// Validate, re-check health, then price the request. Nothing is returned
    /// unless every step succeeds.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, RateError> {
        request.validate()?;

        let health = self.check_health().await;
        if health.availability == Availability::Unavailable {
            return Err(RateError::Unavailable(health.detail));
        }

        let rate = self
            .rate_on(&request.from_code, &request.to_code, request.as_of)
            .await?;
        let result = ConversionResult::new(request.amount, rate);
        log::info!(
            "Converted {} {} -> {} {} at {}",
            request.amount,
            request.from_code,
            result.converted_amount,
            request.to_code,
            rate
        );
        Ok(result)
    }
}

/// Which of `codes` the table can price, in the given order.
pub fn published_in(table: &RateTable, codes: &[String]) -> Vec<(String, bool)> {
    codes
        .iter()
        .map(|code| (code.clone(), table.contains(code)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fakes::{FixedProbe, Reply, ScriptedFeed};
    use crate::error::ErrorKind;
    use crate::models::exchange_rates::fixtures::{SEVERAL, USD_ONLY};
    use approx::assert_relative_eq;

    fn service(feed: ScriptedFeed, online: bool) -> RateService<ScriptedFeed, FixedProbe> {
        RateService::new(feed, FixedProbe::new(online))
    }

    #[tokio::test]
    async fn test_convert_usd_to_rub() -> Result<(), RateError> {
        let service = service(ScriptedFeed::ok(USD_ONLY), true);
        let request = ConversionRequest::new("USD", "RUB", 10.0, None);

        let result = service.convert(&request).await?;
        assert_relative_eq!(result.rate, 100.0);
        assert_relative_eq!(result.converted_amount, 1000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_converted_amount_is_exact_product() -> Result<(), RateError> {
        let service = service(ScriptedFeed::ok(SEVERAL), true);
        let request = ConversionRequest::new("JPY", "EUR", 12345.0, None);

        let table = RateTable::parse(SEVERAL)?;
        let rate = table.cross_rate("JPY", "EUR")?;
        let result = service.convert(&request).await?;
        assert_eq!(result.rate, rate);
        assert_eq!(result.converted_amount, 12345.0 * rate);
        Ok(())
    }

    #[tokio::test]
    async fn test_convert_uses_requested_date() -> Result<(), RateError> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let feed = ScriptedFeed::new(Reply::Refused).with(date, Reply::Body(200, USD_ONLY.into()));
        // Health asks for today's snapshot, which this feed refuses.
        let service = service(feed, true);

        let err = service
            .convert(&ConversionRequest::new("USD", "RUB", 1.0, Some(date)))
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Unavailable(_)));

        let feed = ScriptedFeed::ok("<ValCurs/>").with(date, Reply::Body(200, USD_ONLY.into()));
        let service = RateService::new(feed, FixedProbe::new(true));
        let result = service
            .convert(&ConversionRequest::new("USD", "RUB", 2.0, Some(date)))
            .await?;
        assert_relative_eq!(result.converted_amount, 200.0);
        assert_eq!(
            *service.feed.requested.lock().unwrap(),
            vec![None, Some(date)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_currency_yields_no_result() {
        let service = service(ScriptedFeed::ok(USD_ONLY), true);
        let outcome = service
            .convert(&ConversionRequest::new("XXX", "RUB", 1.0, None))
            .await;
        match outcome {
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::Data);
                assert!(matches!(err, RateError::UnknownCurrency(code) if code == "XXX"));
            }
            Ok(result) => panic!("unexpected result {:?}", result),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_network() {
        let service = service(ScriptedFeed::ok(USD_ONLY), true);
        let err = service
            .convert(&ConversionRequest::new("", "RUB", -1.0, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(service.prober.calls(), 0);
        assert_eq!(service.feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_fails_fast() {
        let service = service(ScriptedFeed::ok(USD_ONLY), false);
        let err = service
            .convert(&ConversionRequest::new("USD", "RUB", 1.0, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(service.feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_degraded_feed_surfaces_status() {
        let service = service(ScriptedFeed::new(Reply::Body(500, "oops".into())), true);
        let err = service
            .convert(&ConversionRequest::new("USD", "RUB", 1.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_malformed_feed_is_parse_error() {
        let service = service(ScriptedFeed::ok("<html><body>maintenance"), true);
        let err = service.fetch_table(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_maintenance_page_fails_conversion_as_parse_error() {
        let service = service(
            ScriptedFeed::ok("<html><body>Service down</body></html>"),
            true,
        );
        let err = service
            .convert(&ConversionRequest::new("USD", "RUB", 1.0, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_probe_asks_the_prober_only() {
        let online = service(ScriptedFeed::ok(USD_ONLY), true);
        assert!(online.probe().await);
        assert_eq!(online.prober.calls(), 1);
        assert_eq!(online.feed.calls(), 0);

        let offline = service(ScriptedFeed::ok(USD_ONLY), false);
        assert!(!offline.probe().await);
    }

    #[test]
    fn test_published_in() {
        let table = RateTable::parse(USD_ONLY).unwrap();
        let codes = vec!["USD".to_string(), "EUR".to_string(), "RUB".to_string()];
        assert_eq!(
            published_in(&table, &codes),
            vec![
                ("USD".to_string(), true),
                ("EUR".to_string(), false),
                ("RUB".to_string(), true),
            ]
        );
    }
}
