// Server loop module
// Accepts connections until shutdown is signalled, then drains them

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;

use super::connection::{accept_connection, ServiceKind};
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for server loop behavior
pub struct ServerLoopConfig {
    pub service: ServiceKind,
    /// Flips to `true` once shutdown starts
    pub shutdown: watch::Receiver<bool>,
}

/// Accept loop shared by the app and metrics listeners
///
/// Returns once shutdown is signalled; the listener is dropped with it so no
/// further connections are accepted.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    mut config: ServerLoopConfig,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            config.service,
                            config.shutdown.clone(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = config.shutdown.changed() => break,
        }
    }
}

/// Wait until every counter reaches zero or `grace` elapses
///
/// Returns the number of connections still open at the end.
pub async fn drain_connections(counters: &[Arc<AtomicUsize>], grace: Duration) -> usize {
    let deadline = Instant::now() + grace;
    loop {
        let active: usize = counters.iter().map(|c| c.load(Ordering::SeqCst)).sum();
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let counters = [Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0))];
        assert_eq!(drain_connections(&counters, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace_period() {
        let counters = [Arc::new(AtomicUsize::new(2))];
        let remaining = drain_connections(&counters, Duration::from_millis(150)).await;
        assert_eq!(remaining, 2);
    }

    #[tokio::test]
    async fn test_drain_waits_for_connections_to_close() {
        let counter = Arc::new(AtomicUsize::new(1));
        let closer = Arc::clone(&counter);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            closer.fetch_sub(1, Ordering::SeqCst);
        });
        let remaining = drain_connections(&[counter], Duration::from_secs(10)).await;
        assert_eq!(remaining, 0);
    }
}
