//! Virtual host resolution
//!
//! Maps an inbound `Host` value onto one configured domain. Matching is
//! exact after the port is stripped and local aliases are substituted;
//! there is no wildcard or subdomain matching.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// One virtual host's serving configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRoute {
    /// Canonical lowercase hostname, unique across the table
    pub host: String,
    /// Root directory of the domain's static files
    pub static_root: PathBuf,
    pub api_enabled: bool,
}

/// Immutable host → domain lookup table
#[derive(Debug)]
pub struct DomainTable {
    routes: HashMap<String, DomainRoute>,
    /// Domain substituted for local aliases
    test_domain: String,
    local_aliases: HashSet<String>,
}

impl DomainTable {
    /// Later duplicates of a host replace earlier ones; configuration
    /// validation rejects duplicates before this point.
    pub fn new(routes: Vec<DomainRoute>, test_domain: &str, local_aliases: &[String]) -> Self {
        let routes = routes
            .into_iter()
            .map(|route| (route.host.to_ascii_lowercase(), route))
            .collect();
        Self {
            routes,
            test_domain: test_domain.to_ascii_lowercase(),
            local_aliases: local_aliases
                .iter()
                .map(|a| a.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Domain serving `raw_host`, or `None` when the host is not ours
    pub fn resolve(&self, raw_host: &str) -> Option<&DomainRoute> {
        self.routes.get(&self.canonical_host(raw_host))
    }

    /// Lowercased host with the port removed and aliases substituted
    pub fn canonical_host(&self, raw_host: &str) -> String {
        let host = strip_port(raw_host.trim()).to_ascii_lowercase();
        if self.local_aliases.contains(&host) {
            self.test_domain.clone()
        } else {
            host
        }
    }
}

/// Remove a trailing `:port`; bracketed IPv6 literals keep their brackets
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DomainTable {
        let routes = vec![
            DomainRoute {
                host: "tmdev.pl".to_string(),
                static_root: PathBuf::from("./public/tmdev"),
                api_enabled: true,
            },
            DomainRoute {
                host: "novi-tech.net".to_string(),
                static_root: PathBuf::from("./public/novi-tech"),
                api_enabled: false,
            },
        ];
        DomainTable::new(
            routes,
            "novi-tech.net",
            &["localhost".to_string(), "remu".to_string()],
        )
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:3000"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn test_exact_match_only() {
        let table = table();
        assert_eq!(table.resolve("tmdev.pl").unwrap().host, "tmdev.pl");
        assert!(table.resolve("www.tmdev.pl").is_none());
        assert!(table.resolve("pl").is_none());
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_port_and_case_ignored() {
        let table = table();
        assert_eq!(table.resolve("TMDEV.pl:443").unwrap().host, "tmdev.pl");
    }

    #[test]
    fn test_local_alias_maps_to_test_domain() {
        let table = table();
        let via_alias = table.resolve("localhost:3000").unwrap();
        let direct = table.resolve("novi-tech.net").unwrap();
        assert_eq!(via_alias, direct);
        assert_eq!(table.resolve("remu").unwrap(), direct);
    }

    #[test]
    fn test_alias_to_unconfigured_domain_is_not_ours() {
        let table = DomainTable::new(
            vec![DomainRoute {
                host: "example.com".to_string(),
                static_root: PathBuf::from("."),
                api_enabled: false,
            }],
            "missing.test",
            &["localhost".to_string()],
        );
        assert!(table.resolve("localhost").is_none());
    }
}
