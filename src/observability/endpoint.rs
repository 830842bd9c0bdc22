// Metrics listener request handling

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Method, Request};

use crate::config::AppState;
use crate::http::{self, HttpResponse};

/// Serve the Prometheus exposition on the configured path, 404 elsewhere
pub async fn handle_metrics_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let is_head = req.method() == Method::HEAD;
    let wants_metrics = matches!(*req.method(), Method::GET | Method::HEAD)
        && req.uri().path() == state.config.metrics.path;

    match (&state.metrics, wants_metrics) {
        (Some(handle), true) => Ok(http::build_metrics_response(handle.render())),
        _ => Ok(http::build_404_response(is_head)),
    }
}
