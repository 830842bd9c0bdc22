//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: resolves the virtual host, runs
//! the resolution chain, dispatches to the API or the static responder and
//! records metrics and the access log line for the finished request.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request};

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use crate::observability;
use crate::routing::{self, MatchKind};

/// Request information kept after the request itself has been consumed
pub struct RequestContext {
    pub peer: SocketAddr,
    /// Host as sent by the client, port included
    pub host: String,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub version: hyper::Version,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    fn from_request<B>(req: &Request<B>, peer: SocketAddr) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            peer,
            host: header("host")
                .or_else(|| req.uri().host().map(ToString::to_string))
                .unwrap_or_default(),
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            version: req.version(),
            referer: header("referer"),
            user_agent: header("user-agent"),
        }
    }

    fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let start = Instant::now();
    let ctx = RequestContext::from_request(&req, peer);

    let (mut response, served) = dispatch(req, &state, &ctx).await;

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    let route = served.route_label(&ctx, response.status().as_u16());
    finish(&ctx, &state, &response, route, start.elapsed());
    Ok(response)
}

/// Which branch answered a request
///
/// `kind` is `None` when the host is not configured.
#[derive(Debug, Clone, Copy, Default)]
struct Served {
    kind: Option<MatchKind>,
    is_html: bool,
}

impl Served {
    /// Bounded label shared by the metrics and the access log
    fn route_label(self, ctx: &RequestContext, status: u16) -> String {
        routing::route_label(&ctx.path, status, self.kind, self.is_html)
    }
}

/// Produce the response and the branch that answered it
async fn dispatch<B>(
    req: Request<B>,
    state: &AppState,
    ctx: &RequestContext,
) -> (HttpResponse, Served)
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(domain) = state.domains.resolve(&ctx.host) else {
        logger::log_debug(&format!("[Dispatch] No domain for host '{}'", ctx.host));
        return (unknown_host_response(ctx), Served::default());
    };

    let resolution = state.classifier().classify(domain, &ctx.path, &ctx.method);
    let served = Served {
        kind: Some(resolution.kind),
        is_html: resolution.is_html,
    };
    match resolution.kind {
        MatchKind::ApiPassthrough => {
            let response = api::handle_api(
                req,
                &ctx.host,
                &resolution.path,
                state.config.http.max_body_size,
            )
            .await;
            (response, served)
        }
        _ => (static_files::respond(&resolution), served),
    }
}

fn unknown_host_response(ctx: &RequestContext) -> HttpResponse {
    let path = routing::normalize_path(&ctx.path);
    if path.starts_with("/api/") {
        http::build_text_response(
            hyper::StatusCode::NOT_FOUND,
            api::API_NOT_FOUND,
            ctx.is_head(),
        )
    } else {
        http::build_404_response(ctx.is_head())
    }
}

/// Metrics and access log for a finished request
fn finish(
    ctx: &RequestContext,
    state: &AppState,
    response: &HttpResponse,
    route: String,
    elapsed: Duration,
) {
    let status = response.status().as_u16();
    let metric_host = routing::strip_port(ctx.host.trim()).to_ascii_lowercase();

    observability::record_request(&metric_host, ctx.method.as_str(), status, &route, elapsed);

    if !state.config.logging.access_log {
        return;
    }

    let mut entry = AccessLogEntry::new(
        ctx.peer.ip().to_string(),
        ctx.method.to_string(),
        ctx.path.clone(),
    );
    entry.host.clone_from(&ctx.host);
    entry.query.clone_from(&ctx.query);
    entry.http_version = version_str(ctx.version).to_string();
    entry.status = status;
    entry.body_bytes = body_len(response);
    entry.referer.clone_from(&ctx.referer);
    entry.user_agent.clone_from(&ctx.user_agent);
    entry.route = route;
    entry.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn body_len(response: &HttpResponse) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

const fn version_str(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2.0",
        hyper::Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
