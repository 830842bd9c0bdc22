// API module entry
// JSON endpoints under /api/ for domains with the API enabled

mod types;

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, StatusCode};

use crate::http::{self, HttpResponse};
use crate::logger;
use types::{DataResponse, HelloResponse, UsersResponse};

const SAMPLE_USERS: &[&str] = &["John", "Jane", "Bob"];

/// Sent for `/api/` requests on hosts that are not configured
pub const API_NOT_FOUND: &str = "API endpoint not found for this domain";

/// Dispatch an API request
///
/// `host` is the Host header as sent by the client; `path` the normalized
/// request path.
pub async fn handle_api<B>(req: Request<B>, host: &str, path: &str, max_body_size: u64) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    match (&method, path) {
        (&Method::GET | &Method::HEAD, "/api/hello") => head_aware(
            &method,
            http::build_json_response(
                StatusCode::OK,
                &HelloResponse {
                    message: "Hello World!",
                    domain: host,
                    path,
                },
            ),
        ),
        (&Method::GET | &Method::HEAD, "/api/users") => head_aware(
            &method,
            http::build_json_response(
                StatusCode::OK,
                &UsersResponse {
                    users: SAMPLE_USERS,
                    domain: host,
                },
            ),
        ),
        (&Method::POST, "/api/data") => handle_data(req, max_body_size).await,
        _ => {
            logger::log_debug(&format!("[API] {method} {path} - 404"));
            http::build_404_response(method == Method::HEAD)
        }
    }
}

async fn handle_data<B>(req: Request<B>, max_body_size: u64) -> HttpResponse
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!(
                "Request body exceeded {max_body_size} bytes while reading"
            ));
            return http::build_413_response();
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_400_response("Bad Request");
        }
    };

    http::build_json_response(
        StatusCode::OK,
        &DataResponse {
            message: "Data received",
            body: String::from_utf8_lossy(&body).into_owned(),
        },
    )
}

/// Reject declared bodies above `max_body_size` before reading them
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<HttpResponse> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn head_aware(method: &Method, resp: HttpResponse) -> HttpResponse {
    if *method == Method::HEAD {
        http::response::strip_body(resp)
    } else {
        resp
    }
}
