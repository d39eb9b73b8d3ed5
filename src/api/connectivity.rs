// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::{native_tls, TlsConnector};

use super::ConnectivityProbe;
use crate::config::{Config, ProbeTarget};

/// Outcome of one connection attempt.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    pub target: ProbeTarget,
    pub success: bool,
    pub elapsed: Duration,
    pub error: Option<String>,
}

/// Checks for outbound network access by connecting to well-known hosts in order.
pub struct Prober {
    targets: Vec<ProbeTarget>,
    attempt_timeout: Duration,
}

impl Prober {
    pub fn new(targets: Vec<ProbeTarget>, attempt_timeout: Duration) -> Self {
        Self {
            targets,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.probe_targets.clone(), config.probe_timeout())
    }

    /// Try targets in order until one connects. Returns every attempt made; the
    /// last one is the success, if there was any.
    pub async fn probe_detailed(&self) -> Vec<ProbeAttempt> {
        let mut attempts = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            log::info!(
                "Probing {}:{}{}",
                target.host,
                target.port,
                if target.uses_tls() { " (tls)" } else { "" }
            );
            let started = Instant::now();
            let outcome = match timeout(self.attempt_timeout, connect(target)).await {
                Ok(result) => result,
                Err(_) => Err(format!("timed out after {:?}", self.attempt_timeout)),
            };
            let elapsed = started.elapsed();

            match outcome {
                Ok(()) => {
                    log::info!(
                        "Connected to {}:{} in {:.2}s",
                        target.host,
                        target.port,
                        elapsed.as_secs_f64()
                    );
                    attempts.push(ProbeAttempt {
                        target: target.clone(),
                        success: true,
                        elapsed,
                        error: None,
                    });
                    return attempts;
                }
                Err(e) => {
                    log::warn!("Failed to connect to {}:{}: {}", target.host, target.port, e);
                    attempts.push(ProbeAttempt {
                        target: target.clone(),
                        success: false,
                        elapsed,
                        error: Some(e),
                    });
                }
            }
        }

        log::error!("No probe target reachable, network looks down");
        attempts
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for Prober {
    async fn probe(&self) -> bool {
        self.probe_detailed()
            .await
            .last()
            .map_or(false, |attempt| attempt.success)
    }
}

async fn connect(target: &ProbeTarget) -> Result<(), String> {
    let stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|e| e.to_string())?;

    if target.uses_tls() {
        let connector = native_tls::TlsConnector::new().map_err(|e| e.to_string())?;
        let connector = TlsConnector::from(connector);
        let _tls = connector
            .connect(&target.host, stream)
            .await
            .map_err(|e| format!("TLS handshake failed: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    /// Accepts connections and keeps them open without ever answering.
    async fn silent_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        port
    }

    fn plain(port: u16) -> ProbeTarget {
        ProbeTarget {
            tls: Some(false),
            ..ProbeTarget::new("127.0.0.1", port)
        }
    }

    fn tls(port: u16) -> ProbeTarget {
        ProbeTarget {
            tls: Some(true),
            ..ProbeTarget::new("127.0.0.1", port)
        }
    }

    #[tokio::test]
    async fn test_first_reachable_target_short_circuits() {
        let refused = closed_port().await;
        let open = silent_server().await;
        let never_tried = closed_port().await;

        let prober = Prober::new(
            vec![plain(refused), plain(open), plain(never_tried)],
            Duration::from_secs(2),
        );
        let attempts = prober.probe_detailed().await;
        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].success);
        assert!(attempts[0].error.is_some());
        assert!(attempts[1].success);
        assert_eq!(attempts[1].target.port, open);

        assert!(prober.probe().await);
    }

    #[tokio::test]
    async fn test_all_refused_is_false() {
        let prober = Prober::new(
            vec![plain(closed_port().await), plain(closed_port().await)],
            Duration::from_secs(2),
        );
        let attempts = prober.probe_detailed().await;
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|a| !a.success));
        assert!(!prober.probe().await);
    }

    #[tokio::test]
    async fn test_hanging_handshakes_stay_within_budget() {
        let per_attempt = Duration::from_millis(300);
        let prober = Prober::new(
            vec![tls(silent_server().await), tls(silent_server().await)],
            per_attempt,
        );

        let started = Instant::now();
        assert!(!prober.probe().await);
        let elapsed = started.elapsed();
        assert!(elapsed >= per_attempt);
        assert!(elapsed < per_attempt * 2 + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_no_targets_is_false() {
        let prober = Prober::new(Vec::new(), Duration::from_secs(1));
        assert!(prober.probe_detailed().await.is_empty());
        assert!(!prober.probe().await);
    }
}
