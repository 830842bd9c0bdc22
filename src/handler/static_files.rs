//! Static file responses
//!
//! Turns a [`Resolution`] into a response. Everything was loaded into memory
//! at startup, so no filesystem access happens here.

use crate::http::{self, HttpResponse};
use crate::routing::Resolution;

/// Respond with the resolved asset, or 404 when the chain found nothing
pub fn respond(resolution: &Resolution<'_>) -> HttpResponse {
    match (resolution.status(), resolution.asset, resolution.cache_control) {
        (Some(200), Some(asset), Some(cache_control)) => {
            http::build_asset_response(asset, cache_control, resolution.head_only)
        }
        _ => http::build_404_response(resolution.head_only),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::CachedAsset;
    use crate::http::cache::CacheControl;
    use crate::routing::MatchKind;
    use hyper::body::Bytes;

    fn resolution(kind: MatchKind, asset: Option<&CachedAsset>) -> Resolution<'_> {
        Resolution {
            kind,
            path: "/app.js".to_string(),
            asset,
            cache_control: asset.map(|_| CacheControl::Immutable),
            is_html: false,
            head_only: false,
        }
    }

    #[test]
    fn test_hit_serves_asset() {
        let asset = CachedAsset {
            bytes: Bytes::from_static(b"console.log(1)"),
            content_type: "text/javascript; charset=utf-8",
        };
        let resp = respond(&resolution(MatchKind::StaticExact, Some(&asset)));
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "14");
    }

    #[test]
    fn test_not_found_and_passthrough_are_404() {
        let resp = respond(&resolution(MatchKind::NotFound, None));
        assert_eq!(resp.status(), 404);

        let resp = respond(&resolution(MatchKind::ApiPassthrough, None));
        assert_eq!(resp.status(), 404);
    }
}
