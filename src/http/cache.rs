//! HTTP cache control module
//!
//! Two fixed `Cache-Control` policies: documents that change between
//! deploys get a short max-age, fingerprinted assets are cached for a year.

/// Cache-Control class attached to every served asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    /// Five minutes, for entries in the no-cache extension set
    ShortLived,
    /// One year, marked immutable
    Immutable,
}

impl CacheControl {
    /// Cache-Control header value
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::ShortLived => "public, max-age=300",
            Self::Immutable => "public, max-age=31536000, immutable",
        }
    }
}

/// Chooses a [`CacheControl`] class from the served file's extension
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Lowercased extensions including the dot, e.g. `.html`
    no_cache_extensions: Vec<String>,
}

impl CachePolicy {
    pub fn new(no_cache_extensions: &[String]) -> Self {
        let no_cache_extensions = no_cache_extensions
            .iter()
            .map(|e| {
                let e = e.trim().to_ascii_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{e}")
                }
            })
            .collect();
        Self {
            no_cache_extensions,
        }
    }

    /// Class for the cache key or path of the asset actually served
    pub fn classify(&self, served_path: &str) -> CacheControl {
        match extension_of(served_path) {
            Some(ext)
                if self
                    .no_cache_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext)) =>
            {
                CacheControl::ShortLived
            }
            _ => CacheControl::Immutable,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(&[".html".to_string()])
    }
}

/// Extension of the last path segment including the dot
fn extension_of(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(idx) if idx > 0 => Some(&segment[idx..]),
        _ => None,
    }
}
