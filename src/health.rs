use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use tracing::{debug, info, warn};

/// Per-attempt HTTP timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// A service endpoint checked for readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTarget {
    pub name: String,
    pub url: String,
}

impl HealthTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn local(name: impl Into<String>, port: &str, path: &str) -> Self {
        Self::new(name, format!("http://localhost:{port}{path}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckResult {
    pub target: HealthTarget,
    pub attempts: u32,
    pub succeeded: bool,
    pub last_error: Option<String>,
}

/// How readiness is polled during `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Unconditional settle time before the first attempt.
    pub grace: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            grace: DEFAULT_GRACE,
        }
    }
}

/// A single readiness check, no retrying.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self, target: &HealthTarget) -> anyhow::Result<()>;
}

/// GET the target URL; any 2xx within the per-attempt timeout is ready.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn check(&self, target: &HealthTarget) -> anyhow::Result<()> {
        let response = self
            .client
            .get(&target.url)
            .send()
            .await
            .context("HTTP health check")?;
        if !response.status().is_success() {
            bail!("HTTP health check returned status {}", response.status());
        }
        Ok(())
    }
}

pub struct HealthPoller {
    probe: Arc<dyn ReadinessProbe>,
}

impl HealthPoller {
    pub fn new(probe: Arc<dyn ReadinessProbe>) -> Self {
        Self { probe }
    }

    /// Probe `target` until it succeeds or `max_attempts` probes have been
    /// made, sleeping `interval` between failures.
    pub async fn poll(
        &self,
        target: &HealthTarget,
        max_attempts: u32,
        interval: Duration,
    ) -> HealthCheckResult {
        if max_attempts == 0 {
            return HealthCheckResult {
                target: target.clone(),
                attempts: 0,
                succeeded: false,
                last_error: None,
            };
        }

        let attempts = AtomicU32::new(0);
        let result = (|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            self.probe.check(target).await
        })
        .retry(
            ConstantBuilder::default()
                .with_delay(interval)
                .with_max_times((max_attempts - 1) as usize),
        )
        .notify(|err: &anyhow::Error, dur: Duration| {
            debug!(service = %target.name, "health check failed: {:#}, retrying in {:?}", err, dur);
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match result {
            Ok(()) => {
                info!(service = %target.name, attempts, "healthy");
                HealthCheckResult {
                    target: target.clone(),
                    attempts,
                    succeeded: true,
                    last_error: None,
                }
            }
            Err(e) => {
                warn!(service = %target.name, attempts, "not healthy: {:#}", e);
                HealthCheckResult {
                    target: target.clone(),
                    attempts,
                    succeeded: false,
                    last_error: Some(format!("{e:#}")),
                }
            }
        }
    }

    /// A single best-effort probe.
    pub async fn probe_once(&self, target: &HealthTarget) -> HealthCheckResult {
        self.poll(target, 1, Duration::ZERO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProbe;

    fn target() -> HealthTarget {
        HealthTarget::local("backend", "8001", "/health")
    }

    #[test]
    fn local_target_url() {
        assert_eq!(target().url, "http://localhost:8001/health");
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_makes_exactly_max_attempts() {
        let probe = Arc::new(ScriptedProbe::failing());
        let poller = HealthPoller::new(probe.clone());

        let result = poller.poll(&target(), 3, Duration::from_secs(5)).await;
        assert!(!result.succeeded);
        assert_eq!(result.attempts, 3);
        assert_eq!(probe.calls(), 3);
        assert!(result.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_success() {
        let probe = Arc::new(ScriptedProbe::ready_after(2));
        let poller = HealthPoller::new(probe.clone());

        let result = poller.poll(&target(), 30, Duration::from_secs(5)).await;
        assert!(result.succeeded);
        assert_eq!(result.attempts, 2);
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_is_slept_between_failures() {
        let probe = Arc::new(ScriptedProbe::failing());
        let poller = HealthPoller::new(probe);

        let start = tokio::time::Instant::now();
        poller.poll(&target(), 4, Duration::from_secs(5)).await;
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn zero_attempts_never_probes() {
        let probe = Arc::new(ScriptedProbe::failing());
        let poller = HealthPoller::new(probe.clone());

        let result = poller.poll(&target(), 0, Duration::from_secs(5)).await;
        assert_eq!(result.attempts, 0);
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn http_probe_fails_on_closed_port() {
        let probe = HttpProbe::new().unwrap();
        let target = HealthTarget::new("nothing", "http://127.0.0.1:1/health");
        assert!(probe.check(&target).await.is_err());
    }
}
