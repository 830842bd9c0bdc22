//! MIME type detection module
//!
//! Maps a file name's extension to the Content-Type sent with it. The table
//! is consulted once per asset while the cache is built, never per request.

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content-Type for a file path, matched on its lowercased extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    content_type_for_extension(extension.as_deref())
}

/// Content-Type for an extension given without the leading dot
pub fn content_type_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        // Documents and text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("xml") => "text/xml; charset=utf-8",
        Some("rss") => "application/rss+xml",
        Some("atom") => "application/atom+xml",

        // Scripts, data and build artefacts
        Some("js" | "mjs" | "cjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("jsonld") => "application/ld+json",
        Some("webmanifest") => "application/manifest+json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Downloads
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",

        _ => OCTET_STREAM,
    }
}
