//! Route labels for metrics
//!
//! Request paths are client controlled, so using them directly as a metric
//! label would create one time series per distinct URL. Everything except
//! API routes is folded into a handful of fixed tokens.

use super::resolve::MatchKind;

pub const HTML_LABEL: &str = "<html>";
pub const STATIC_LABEL: &str = "<static>";
pub const SPA_LABEL: &str = "<spa fallback>";
pub const NOT_FOUND_LABEL: &str = "<404>";

/// Label for a finished request
///
/// `kind` is `None` when the request never reached the resolver, e.g. for
/// hosts that are not configured. `is_html` is the resolver's flag for the
/// served document. A missing file with an extension is reported as `<404>`
/// like any other miss, not as `<static>`.
pub fn route_label(raw_path: &str, status: u16, kind: Option<MatchKind>, is_html: bool) -> String {
    let path = collapse_slashes(raw_path);
    match kind {
        Some(MatchKind::ApiPassthrough) => path,
        Some(MatchKind::StaticExact) if is_html => HTML_LABEL.to_string(),
        Some(MatchKind::DirectoryIndex | MatchKind::ExtensionlessHtml) => HTML_LABEL.to_string(),
        Some(MatchKind::StaticExact) => STATIC_LABEL.to_string(),
        Some(MatchKind::SpaFallback) => SPA_LABEL.to_string(),
        _ if status == 404 => NOT_FOUND_LABEL.to_string(),
        _ => path,
    }
}

fn collapse_slashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
