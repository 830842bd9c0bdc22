//! HTTP protocol layer module
//!
//! Content types, cache policies and response builders, independent of how
//! a request was routed.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_404_response, build_413_response, build_asset_response,
    build_json_response, build_metrics_response, build_text_response, HttpResponse,
};
