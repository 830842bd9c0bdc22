//! HTTP response building module
//!
//! Builders for every response the edge server produces. Builder failures
//! are logged and degrade to an empty response instead of panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::cache::CacheControl;
use crate::assets::CachedAsset;

pub type HttpResponse = Response<Full<Bytes>>;

const NOT_FOUND_BODY: &str = "Not Found";

/// 200 response for a cached asset; the body is omitted for HEAD
pub fn build_asset_response(
    asset: &CachedAsset,
    cache_control: CacheControl,
    is_head: bool,
) -> HttpResponse {
    let body = if is_head {
        Bytes::new()
    } else {
        asset.bytes.clone()
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", asset.content_type)
        .header("Content-Length", asset.bytes.len())
        .header("Cache-Control", cache_control.header_value())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// 404 Not Found response
pub fn build_404_response(is_head: bool) -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY, is_head)
}

/// 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", false)
}

/// 400 Bad Request response
pub fn build_400_response(message: &str) -> HttpResponse {
    build_text_response(StatusCode::BAD_REQUEST, message, false)
}

/// Plain-text response; HEAD keeps the headers and drops the body
pub fn build_text_response(status: StatusCode, message: &str, is_head: bool) -> HttpResponse {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(message.as_bytes())
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Compact JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                false,
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Prometheus text exposition
pub fn build_metrics_response(rendered: String) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(Full::new(Bytes::from(rendered)))
        .unwrap_or_else(|e| {
            log_build_error("metrics", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Drop the body of an already built response, keeping status and headers
pub fn strip_body(resp: HttpResponse) -> HttpResponse {
    let (parts, _) = resp.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
