//! TCP readiness probing for the dependency's database port.

use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Deadline offset used when `now + budget` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Host and port a readiness probe connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Polls an endpoint with plain TCP connects until it accepts or the budget runs out.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    interval: Duration,
}

impl Default for ReadinessProber {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ReadinessProber {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether `endpoint` accepted a connection within `budget`.
    ///
    /// Connect attempts and sleeps are clamped to the remaining budget.
    pub async fn wait(&self, endpoint: &ServiceEndpoint, budget: Duration) -> bool {
        let now = Instant::now();
        let deadline = now
            .checked_add(budget)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let address = endpoint.to_string();
        let mut attempts = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            attempts += 1;
            match timeout(remaining, TcpStream::connect(address.as_str())).await {
                Ok(Ok(_)) => {
                    tracing::info!("{} is accepting connections", endpoint);
                    return true;
                }
                Ok(Err(e)) => tracing::debug!("Probe {} of {} failed: {}", attempts, endpoint, e),
                Err(_) => tracing::debug!("Probe {} of {} timed out", attempts, endpoint),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(self.interval.min(remaining)).await;
        }

        tracing::warn!(
            "{} not reachable after {:?} ({} attempts)",
            endpoint,
            budget,
            attempts
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn ready_when_listener_accepts() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let prober = ReadinessProber::new(Duration::from_millis(50));

        assert!(
            prober
                .wait(&ServiceEndpoint::new("127.0.0.1", port), Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn becomes_ready_after_late_bind() {
        // Reserve a port, release it, then bind again shortly after probing starts
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let binder = tokio::spawn(async move {
            sleep(Duration::from_millis(200)).await;
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
            sleep(Duration::from_secs(3)).await;
            drop(listener);
        });

        let prober = ReadinessProber::new(Duration::from_millis(50));
        assert!(
            prober
                .wait(&ServiceEndpoint::new("127.0.0.1", port), Duration::from_secs(3))
                .await
        );
        binder.abort();
    }

    #[tokio::test]
    async fn unreachable_endpoint_returns_within_budget() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let interval = Duration::from_millis(100);
        let budget = Duration::from_millis(400);
        let prober = ReadinessProber::new(interval);

        let start = StdInstant::now();
        let ready = prober
            .wait(&ServiceEndpoint::new("127.0.0.1", port), budget)
            .await;

        assert!(!ready);
        assert!(start.elapsed() < budget + interval + Duration::from_millis(200));
    }

    #[tokio::test]
    async fn zero_budget_never_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(
            !ReadinessProber::default()
                .wait(&ServiceEndpoint::new("127.0.0.1", port), Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn unbounded_budget_still_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let prober = ReadinessProber::new(Duration::from_millis(50));

        assert!(
            prober
                .wait(
                    &ServiceEndpoint::new("127.0.0.1", port),
                    Duration::from_secs(u64::MAX)
                )
                .await
        );
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(ServiceEndpoint::new("127.0.0.1", 54322).to_string(), "127.0.0.1:54322");
    }
}
