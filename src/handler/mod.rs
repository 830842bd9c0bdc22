//! Request handler module
//!
//! Host resolution, dispatch to the API or the static chain, and the
//! per-request bookkeeping (metrics and access log).

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
