// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;
use crate::observability;

/// Which service a listener exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Virtual hosts: static assets and the API
    App,
    /// Prometheus exposition
    Metrics,
}

impl ServiceKind {
    const fn name(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Metrics => "metrics",
        }
    }
}

/// Accept a connection, enforcing the connection limit on the app listener.
///
/// The counter is incremented before the limit check so concurrent accepts
/// cannot both slip under the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    service: ServiceKind,
    shutdown: watch::Receiver<bool>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if service == ServiceKind::App {
        if let Some(max_conn) = state.config.performance.max_connections {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                conn_counter.fetch_sub(1, Ordering::SeqCst);
                logger::log_warning(&format!(
                    "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
                ));
                drop(stream);
                return;
            }
        }
        observability::connection_opened();
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        service,
        shutdown,
    );
}

/// Serve one connection on a spawned task.
///
/// The whole connection is bounded by `max(read_timeout, write_timeout)`.
/// When shutdown is signalled the connection finishes its in-flight request
/// and closes instead of waiting for the next one.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    service: ServiceKind,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let timeout_duration =
            Duration::from_secs(std::cmp::max(perf.read_timeout, perf.write_timeout));
        let keep_alive = perf.keep_alive_timeout > 0;

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let svc_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&svc_state);
                async move {
                    match service {
                        ServiceKind::App => handler::handle_request(req, state, peer_addr).await,
                        ServiceKind::Metrics => {
                            observability::handle_metrics_request(req, state).await
                        }
                    }
                }
            }),
        );

        let serve = async {
            tokio::pin!(conn);
            tokio::select! {
                res = conn.as_mut() => res,
                _ = shutdown.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        };

        match tokio::time::timeout(timeout_duration, serve).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} on {} listener timed out after {} seconds",
                    service.name(),
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
        if service == ServiceKind::App {
            observability::connection_closed();
        }
    });
}
