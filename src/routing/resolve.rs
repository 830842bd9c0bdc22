//! Request path resolution
//!
//! Decides, for a resolved domain and a request path, whether the request
//! goes to the API, which cached asset answers it, or that nothing does.
//! The decision is an ordered list of rules; the first rule that produces
//! a result wins.
//!
//! | Order | Rule                 | Applies to                      | On miss        |
//! |-------|----------------------|---------------------------------|----------------|
//! | 1     | `api-passthrough`    | API-enabled domain, `/api/...`  | -              |
//! | 2     | `explicit-asset`     | last segment has an extension   | 404, stop      |
//! | 3     | `directory-index`    | path ends with `/`              | continue       |
//! | 4     | `extensionless-html` | path without trailing `/`       | continue       |
//! | 5     | `spa-fallback`       | everything left                 | 404            |
//!
//! Extension misses stop early so a missing image or script is reported as
//! missing instead of being answered with the application shell.

use hyper::Method;

use super::host::DomainRoute;
use crate::assets::{AssetCache, CachedAsset};
use crate::http::cache::{CacheControl, CachePolicy};
use crate::logger;

/// Which branch of the resolution chain answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    ApiPassthrough,
    StaticExact,
    DirectoryIndex,
    ExtensionlessHtml,
    SpaFallback,
    NotFound,
}

impl MatchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiPassthrough => "api-passthrough",
            Self::StaticExact => "static-exact",
            Self::DirectoryIndex => "directory-index",
            Self::ExtensionlessHtml => "extensionless-html",
            Self::SpaFallback => "spa-fallback",
            Self::NotFound => "not-found",
        }
    }
}

/// Per-request outcome of [`Classifier::classify`]
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub kind: MatchKind,
    /// Normalized request path
    pub path: String,
    /// Cached asset to serve, present for every static hit
    pub asset: Option<&'a CachedAsset>,
    pub cache_control: Option<CacheControl>,
    /// The served document is an HTML page
    pub is_html: bool,
    /// Send status and headers only
    pub head_only: bool,
}

impl Resolution<'_> {
    /// HTTP status the dispatcher answers with; `None` for API passthrough
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            MatchKind::ApiPassthrough => None,
            MatchKind::NotFound => Some(404),
            _ => Some(200),
        }
    }
}

/// Resolution policy over one asset cache
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    assets: &'a AssetCache,
    policy: &'a CachePolicy,
}

impl<'a> Classifier<'a> {
    pub const fn new(assets: &'a AssetCache, policy: &'a CachePolicy) -> Self {
        Self { assets, policy }
    }

    /// Run the resolution chain for `raw_path` on `domain`
    pub fn classify(&self, domain: &DomainRoute, raw_path: &str, method: &Method) -> Resolution<'a> {
        let path = normalize_path(raw_path);
        let probe = Probe {
            assets: self.assets,
            policy: self.policy,
            domain,
            path: &path,
        };

        let (rule, outcome) = RESOLUTION_CHAIN
            .iter()
            .find_map(|(name, rule)| match rule(&probe) {
                Step::Resolved(outcome) => Some((*name, outcome)),
                Step::Continue => None,
            })
            .unwrap_or(("exhausted", Outcome::not_found()));

        if logger::debug_enabled() {
            logger::log_debug(&format!(
                "[Resolve] {}{} -> {} ({rule})",
                domain.host,
                path,
                outcome.kind.as_str()
            ));
        }

        Resolution {
            kind: outcome.kind,
            path,
            asset: outcome.asset,
            cache_control: outcome.cache_control,
            is_html: outcome.is_html,
            head_only: *method == Method::HEAD,
        }
    }
}

/// Collapse runs of `/` and make sure the path is absolute
pub fn normalize_path(raw: &str) -> String {
    let mut path = String::with_capacity(raw.len() + 1);
    path.push('/');
    for c in raw.chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    path
}

/// The last segment contains a dot that is not its first character
pub fn has_extension(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rfind('.').is_some_and(|idx| idx > 0)
}

fn is_html_path(path: &str) -> bool {
    path.len() >= 5
        && path
            .get(path.len() - 5..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".html"))
}

struct Probe<'a, 'p> {
    assets: &'a AssetCache,
    policy: &'p CachePolicy,
    domain: &'p DomainRoute,
    path: &'p str,
}

impl<'a> Probe<'a, '_> {
    /// Look `key` up in this domain's assets and wrap a hit as `kind`
    fn serve(&self, kind: MatchKind, key: &str) -> Option<Outcome<'a>> {
        let asset = self.assets.get(&self.domain.host, key)?;
        Some(Outcome {
            kind,
            asset: Some(asset),
            cache_control: Some(self.policy.classify(key)),
            is_html: is_html_path(key),
        })
    }
}

struct Outcome<'a> {
    kind: MatchKind,
    asset: Option<&'a CachedAsset>,
    cache_control: Option<CacheControl>,
    is_html: bool,
}

impl Outcome<'_> {
    const fn bare(kind: MatchKind) -> Self {
        Self {
            kind,
            asset: None,
            cache_control: None,
            is_html: false,
        }
    }

    const fn not_found() -> Self {
        Self::bare(MatchKind::NotFound)
    }
}

enum Step<'a> {
    Resolved(Outcome<'a>),
    Continue,
}

type Rule = for<'a, 'p> fn(&Probe<'a, 'p>) -> Step<'a>;

const RESOLUTION_CHAIN: &[(&str, Rule)] = &[
    ("api-passthrough", api_passthrough),
    ("explicit-asset", explicit_asset),
    ("directory-index", directory_index),
    ("extensionless-html", extensionless_html),
    ("spa-fallback", spa_fallback),
];

fn api_passthrough<'a>(probe: &Probe<'a, '_>) -> Step<'a> {
    if probe.domain.api_enabled && probe.path.starts_with("/api/") {
        Step::Resolved(Outcome::bare(MatchKind::ApiPassthrough))
    } else {
        Step::Continue
    }
}

fn explicit_asset<'a>(probe: &Probe<'a, '_>) -> Step<'a> {
    if !has_extension(probe.path) {
        return Step::Continue;
    }
    Step::Resolved(
        probe
            .serve(MatchKind::StaticExact, probe.path)
            .unwrap_or_else(Outcome::not_found),
    )
}

fn directory_index<'a>(probe: &Probe<'a, '_>) -> Step<'a> {
    if !probe.path.ends_with('/') {
        return Step::Continue;
    }
    let key = format!("{}index.html", probe.path);
    probe
        .serve(MatchKind::DirectoryIndex, &key)
        .map_or(Step::Continue, Step::Resolved)
}

fn extensionless_html<'a>(probe: &Probe<'a, '_>) -> Step<'a> {
    if probe.path.ends_with('/') {
        return Step::Continue;
    }
    let key = format!("{}.html", probe.path);
    probe
        .serve(MatchKind::ExtensionlessHtml, &key)
        .map_or(Step::Continue, Step::Resolved)
}

fn spa_fallback<'a>(probe: &Probe<'a, '_>) -> Step<'a> {
    Step::Resolved(
        probe
            .serve(MatchKind::SpaFallback, "/index.html")
            .unwrap_or_else(Outcome::not_found),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn domain(host: &str, api_enabled: bool) -> DomainRoute {
        DomainRoute {
            host: host.to_string(),
            static_root: PathBuf::from("."),
            api_enabled,
        }
    }

    fn example_cache() -> AssetCache {
        let mut cache = AssetCache::default();
        cache.insert("example.com", "/index.html", b"<h1>home</h1>");
        cache.insert("example.com", "/about.html", b"<h1>about</h1>");
        cache.insert("example.com", "/css/app.css", b"body{}");
        cache.insert("example.com", "/docs/index.html", b"<h1>docs</h1>");
        cache.insert("example.com", "/Guide.HTML", b"<h1>guide</h1>");
        cache.insert("bare.test", "/logo.png", b"png");
        cache.insert("bare.test", "/blog.html", b"<h1>blog</h1>");
        cache
    }

    fn classify<'a>(
        cache: &'a AssetCache,
        policy: &'a CachePolicy,
        domain: &DomainRoute,
        path: &str,
    ) -> Resolution<'a> {
        Classifier::new(cache, policy).classify(domain, path, &Method::GET)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("about"), "/about");
        assert_eq!(normalize_path("//css///app.css"), "/css/app.css");
        assert_eq!(normalize_path("/docs//"), "/docs/");
    }

    #[test]
    fn test_normalize_path_idempotent() {
        for raw in ["", "/", "////", "a//b", "//x//y//", "/a/b/c", "no/leading", "/./x//.."] {
            let once = normalize_path(raw);
            assert_eq!(normalize_path(&once), once, "not idempotent for {raw:?}");
            assert!(once.starts_with('/'));
            assert!(!once.contains("//"));
        }
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("/css/app.css"));
        assert!(has_extension("/archive.tar.gz"));
        assert!(!has_extension("/about"));
        assert!(!has_extension("/"));
        assert!(!has_extension("/.well-known"));
        assert!(!has_extension("/v1.2/users"));
        assert!(!has_extension("/docs/"));
    }

    #[test]
    fn test_root_serves_directory_index() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/");
        assert_eq!(res.kind, MatchKind::DirectoryIndex);
        assert_eq!(res.status(), Some(200));
        assert_eq!(&res.asset.unwrap().bytes[..], b"<h1>home</h1>");
        assert!(res.asset.unwrap().content_type.starts_with("text/html"));
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));
        assert!(res.is_html);
    }

    #[test]
    fn test_nested_directory_index() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/docs/");
        assert_eq!(res.kind, MatchKind::DirectoryIndex);
        assert_eq!(&res.asset.unwrap().bytes[..], b"<h1>docs</h1>");
    }

    #[test]
    fn test_extensionless_html() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/about");
        assert_eq!(res.kind, MatchKind::ExtensionlessHtml);
        assert_eq!(&res.asset.unwrap().bytes[..], b"<h1>about</h1>");
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));
    }

    #[test]
    fn test_static_exact_is_immutable() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/css/app.css");
        assert_eq!(res.kind, MatchKind::StaticExact);
        assert_eq!(res.asset.unwrap().content_type, "text/css");
        assert_eq!(res.cache_control, Some(CacheControl::Immutable));
        assert!(!res.is_html);
    }

    #[test]
    fn test_static_exact_html_is_short_lived() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/about.html");
        assert_eq!(res.kind, MatchKind::StaticExact);
        assert!(res.is_html);
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));

        let res = classify(&cache, &policy, &domain("example.com", false), "/Guide.HTML");
        assert_eq!(res.kind, MatchKind::StaticExact);
        assert!(res.is_html);
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));
    }

    #[test]
    fn test_missing_extension_asset_never_falls_back() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        for path in ["/css/missing.css", "/img/logo.png", "/missing.html", "/a/b/c.js"] {
            let res = classify(&cache, &policy, &domain("example.com", false), path);
            assert_eq!(res.kind, MatchKind::NotFound, "{path}");
            assert_eq!(res.status(), Some(404));
            assert!(res.asset.is_none());
        }
    }

    #[test]
    fn test_spa_fallback_for_unknown_routes() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "/dashboard/settings");
        assert_eq!(res.kind, MatchKind::SpaFallback);
        assert_eq!(&res.asset.unwrap().bytes[..], b"<h1>home</h1>");
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));

        let res = classify(&cache, &policy, &domain("example.com", false), "/missing/dir/");
        assert_eq!(res.kind, MatchKind::SpaFallback);
    }

    #[test]
    fn test_not_found_without_spa_shell() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let bare = domain("bare.test", false);
        assert_eq!(classify(&cache, &policy, &bare, "/dashboard").kind, MatchKind::NotFound);
        assert_eq!(classify(&cache, &policy, &bare, "/").kind, MatchKind::NotFound);
        assert_eq!(classify(&cache, &policy, &bare, "/blog").kind, MatchKind::ExtensionlessHtml);
    }

    #[test]
    fn test_api_passthrough_only_when_enabled() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", true), "/api/hello");
        assert_eq!(res.kind, MatchKind::ApiPassthrough);
        assert_eq!(res.status(), None);
        assert!(res.asset.is_none());

        let res = classify(&cache, &policy, &domain("example.com", false), "/api/hello");
        assert_ne!(res.kind, MatchKind::ApiPassthrough);
        assert_eq!(res.kind, MatchKind::SpaFallback);
    }

    #[test]
    fn test_api_prefix_beats_static_lookup() {
        let mut cache = example_cache();
        cache.insert("example.com", "/api/schema.json", b"{}");
        let policy = CachePolicy::default();
        let res = classify(&cache, &policy, &domain("example.com", true), "//api//schema.json");
        assert_eq!(res.kind, MatchKind::ApiPassthrough);
        assert_eq!(res.path, "/api/schema.json");
    }

    #[test]
    fn test_api_requires_trailing_slash_after_prefix() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", true), "/api");
        assert_eq!(res.kind, MatchKind::SpaFallback);
        let res = classify(&cache, &policy, &domain("example.com", true), "/apis/x");
        assert_eq!(res.kind, MatchKind::SpaFallback);
    }

    #[test]
    fn test_repeated_slashes_resolve_like_clean_path() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let res = classify(&cache, &policy, &domain("example.com", false), "//css//app.css");
        assert_eq!(res.kind, MatchKind::StaticExact);
        assert_eq!(res.path, "/css/app.css");
    }

    #[test]
    fn test_head_only_flag() {
        let (cache, policy) = (example_cache(), CachePolicy::default());
        let classifier = Classifier::new(&cache, &policy);
        let d = domain("example.com", false);
        assert!(classifier.classify(&d, "/", &Method::HEAD).head_only);
        assert!(classifier.classify(&d, "/nope.css", &Method::HEAD).head_only);
        assert!(!classifier.classify(&d, "/", &Method::POST).head_only);
    }

    #[test]
    fn test_custom_no_cache_extensions() {
        let cache = example_cache();
        let policy = CachePolicy::new(&[".css".to_string()]);
        let d = domain("example.com", false);
        let res = classify(&cache, &policy, &d, "/css/app.css");
        assert_eq!(res.cache_control, Some(CacheControl::ShortLived));
        let res = classify(&cache, &policy, &d, "/about");
        assert_eq!(res.cache_control, Some(CacheControl::Immutable));
        assert!(res.is_html);
    }
}
