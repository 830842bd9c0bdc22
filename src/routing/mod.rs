//! Routing module
//!
//! Decides what answers a request before any response is built:
//! - Virtual host resolution from the Host header
//! - Path resolution against the asset cache
//! - Bounded route labels for metrics

mod host;
mod label;
mod resolve;

pub use host::{strip_port, DomainRoute, DomainTable};
pub use label::route_label;
pub use resolve::{normalize_path, Classifier, MatchKind, Resolution};
