// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::api::{ConnectivityProbe, RateFeed};
use crate::models::HealthStatus;

/// Probe the network, then ask the feed for today's snapshot. The feed is not
/// contacted at all when the probe fails.
pub async fn check_health<P, F>(prober: &P, feed: &F) -> HealthStatus
where
    P: ConnectivityProbe + ?Sized,
    F: RateFeed + ?Sized,
{
    if !prober.probe().await {
        return HealthStatus::unavailable("No network path");
    }

    let status = match feed.fetch(None).await {
        Ok(response) if response.status_code == 200 => HealthStatus::available(),
        Ok(response) => HealthStatus::degraded(format!(
            "API returned status code {}",
            response.status_code
        )),
        Err(e) => HealthStatus::unavailable(format!("Network error: {}", e)),
    };

    log::info!("Health check: {}", status);
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fakes::{FixedProbe, Reply, ScriptedFeed};
    use crate::models::Availability;

    #[tokio::test]
    async fn test_offline_skips_feed() {
        let probe = FixedProbe::new(false);
        let feed = ScriptedFeed::ok("<ValCurs/>");

        let status = check_health(&probe, &feed).await;
        assert_eq!(status.availability, Availability::Unavailable);
        assert_eq!(status.detail, "No network path");
        assert_eq!(status.color(), "red");
        assert_eq!(probe.calls(), 1);
        assert_eq!(feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_ok_feed_is_available() {
        let probe = FixedProbe::new(true);
        let feed = ScriptedFeed::ok("<ValCurs/>");

        let status = check_health(&probe, &feed).await;
        assert!(status.is_available());
        assert_eq!(status.color(), "green");
        assert_eq!(feed.calls(), 1);
        assert_eq!(*feed.requested.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_error_status_is_degraded() {
        let probe = FixedProbe::new(true);
        let feed = ScriptedFeed::new(Reply::Body(503, "busy".to_string()));

        let status = check_health(&probe, &feed).await;
        assert_eq!(status.availability, Availability::Degraded);
        assert!(status.detail.contains("503"));
        assert_eq!(status.color(), "yellow");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_unavailable() {
        let probe = FixedProbe::new(true);
        let feed = ScriptedFeed::new(Reply::Refused);

        let status = check_health(&probe, &feed).await;
        assert_eq!(status.availability, Availability::Unavailable);
        assert!(status.detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_each_check_probes_again() {
        let probe = FixedProbe::new(true);
        let feed = ScriptedFeed::ok("<ValCurs/>");

        check_health(&probe, &feed).await;
        check_health(&probe, &feed).await;
        assert_eq!(probe.calls(), 2);
        assert_eq!(feed.calls(), 2);
    }
}
