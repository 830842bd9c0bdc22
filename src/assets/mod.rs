//! In-memory asset cache
//!
//! Every regular file under each domain's static root is read once at
//! startup. Afterwards the cache is only ever read, so request tasks share
//! it without locking.

use std::collections::HashMap;
use std::path::Path;

use hyper::body::Bytes;
use walkdir::WalkDir;

use crate::http::mime;
use crate::logger;
use crate::routing::DomainRoute;

/// One pre-loaded static file
#[derive(Debug, Clone)]
pub struct CachedAsset {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// File count and byte total for one domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    pub files: usize,
    pub bytes: u64,
}

/// Assets keyed by domain host, then by `/`-prefixed relative path
#[derive(Debug, Default)]
pub struct AssetCache {
    sites: HashMap<String, HashMap<String, CachedAsset>>,
}

impl AssetCache {
    /// Walk every domain's static root and load all regular files
    ///
    /// Unreadable entries are logged and skipped, so a single bad file
    /// never prevents the rest of the site from loading.
    pub fn build(domains: &[DomainRoute]) -> Self {
        let mut cache = Self::default();
        for domain in domains {
            let files = load_domain(domain);
            cache.sites.insert(domain.host.clone(), files);
        }
        cache
    }

    pub fn get(&self, host: &str, relative_path: &str) -> Option<&CachedAsset> {
        self.sites.get(host)?.get(relative_path)
    }

    /// Total number of cached files across all domains
    pub fn len(&self) -> usize {
        self.sites.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.sites.keys().map(|h| self.domain_stats(h).bytes).sum()
    }

    pub fn domain_stats(&self, host: &str) -> DomainStats {
        self.sites.get(host).map_or_else(DomainStats::default, |files| DomainStats {
            files: files.len(),
            bytes: files.values().map(|a| a.bytes.len() as u64).sum(),
        })
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, host: &str, relative_path: &str, bytes: &'static [u8]) {
        self.sites.entry(host.to_string()).or_default().insert(
            relative_path.to_string(),
            CachedAsset {
                bytes: Bytes::from_static(bytes),
                content_type: mime::content_type_for(Path::new(relative_path)),
            },
        );
    }
}

fn load_domain(domain: &DomainRoute) -> HashMap<String, CachedAsset> {
    let root = domain.static_root.as_path();
    let mut files = HashMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::log_warning(&format!(
                    "Skipping unreadable entry under '{}' for {}: {e}",
                    root.display(),
                    domain.host
                ));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(key) = relative_key(root, path) else {
            continue;
        };

        match std::fs::read(path) {
            Ok(data) => {
                files.insert(
                    key,
                    CachedAsset {
                        bytes: Bytes::from(data),
                        content_type: mime::content_type_for(path),
                    },
                );
            }
            Err(e) => {
                logger::log_warning(&format!("Error reading {}: {e}", path.display()));
            }
        }
    }

    files
}

/// Slash-separated path of `path` below `root`, prefixed with `/`
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut key = String::new();
    for component in rel.components() {
        key.push('/');
        key.push_str(&component.as_os_str().to_string_lossy());
    }
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
