// Configuration module entry point
// Loads, validates and exposes the static server configuration

mod state;
mod types;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::routing::DomainRoute;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Prefix for environment overrides, e.g. `EDGE__SERVER__PORT=8080`
const ENV_PREFIX: &str = "EDGE";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));
        Self::from_builder(builder)
    }

    /// Parse configuration from an inline TOML document
    #[cfg(test)]
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.host", "0.0.0.0")?
            .set_default("metrics.port", 3001)?
            .set_default("metrics.path", "/metrics")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_grace_period", 10)?
            .set_default("http.server_name", "edge-server")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("site.localhost_test_domain", "localhost")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn get_metrics_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.metrics.host, self.metrics.port)
            .parse()
            .map_err(|e| format!("Invalid metrics address: {e}"))
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.site.domains.is_empty() {
            return Err("No domains configured under [[site.domains]]".to_string());
        }

        let mut seen = HashSet::new();
        for domain in &self.site.domains {
            let host = domain.host.trim().to_ascii_lowercase();
            if host.is_empty() {
                return Err(format!(
                    "Domain with static path '{}' has an empty host",
                    domain.static_path
                ));
            }
            if !seen.insert(host) {
                return Err(format!("Duplicate domain host '{}'", domain.host));
            }
        }

        let app_addr = self.get_socket_addr()?;
        if self.metrics.enabled {
            let metrics_addr = self.get_metrics_socket_addr()?;
            if metrics_addr.port() == app_addr.port()
                && (metrics_addr.ip() == app_addr.ip()
                    || metrics_addr.ip().is_unspecified()
                    || app_addr.ip().is_unspecified())
            {
                return Err(format!(
                    "Metrics listener {metrics_addr} collides with application listener {app_addr}"
                ));
            }
            if !self.metrics.path.starts_with('/') {
                return Err(format!(
                    "Metrics path '{}' must start with '/'",
                    self.metrics.path
                ));
            }
        }

        Ok(())
    }

    /// Domain table entries in configuration order
    pub fn domain_routes(&self) -> Vec<DomainRoute> {
        self.site
            .domains
            .iter()
            .map(|d| DomainRoute {
                host: d.host.trim().to_ascii_lowercase(),
                static_root: PathBuf::from(&d.static_path),
                api_enabled: d.api_enabled,
            })
            .collect()
    }

    /// Whether the canonical test domain is one of the configured hosts
    pub fn test_domain_is_configured(&self) -> bool {
        let canonical = self.site.localhost_test_domain.to_ascii_lowercase();
        self.site
            .domains
            .iter()
            .any(|d| d.host.trim().eq_ignore_ascii_case(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        port = 3000

        [site]
        localhost_test_domain = "novi-tech.net"

        [[site.domains]]
        host = "tmdev.pl"
        static_path = "./public/tmdev"
        api_enabled = true

        [[site.domains]]
        host = "Novi-Tech.net"
        static_path = "./public/novi-tech"
    "#;

    #[test]
    fn test_defaults_applied() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.metrics.port, 3001);
        assert_eq!(cfg.metrics.path, "/metrics");
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.site.local_aliases, vec!["localhost", "remu"]);
        assert_eq!(cfg.site.no_cache_extensions, vec![".html"]);
        assert_eq!(cfg.performance.shutdown_grace_period, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_domain_routes_preserve_order_and_flags() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        let routes = cfg.domain_routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].host, "tmdev.pl");
        assert!(routes[0].api_enabled);
        assert_eq!(routes[1].host, "novi-tech.net");
        assert!(!routes[1].api_enabled);
        assert_eq!(routes[1].static_root, PathBuf::from("./public/novi-tech"));
        assert!(cfg.test_domain_is_configured());
    }

    #[test]
    fn test_duplicate_hosts_rejected() {
        let cfg = Config::from_toml(
            r#"
            [[site.domains]]
            host = "example.com"
            static_path = "a"

            [[site.domains]]
            host = "EXAMPLE.com"
            static_path = "b"
            "#,
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("Duplicate"), "unexpected error: {err}");
    }

    #[test]
    fn test_empty_domain_list_rejected() {
        let cfg = Config::from_toml("[server]\nport = 8080\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_metrics_port_collision_rejected() {
        let cfg = Config::from_toml(
            r#"
            [server]
            port = 3000

            [metrics]
            port = 3000

            [[site.domains]]
            host = "example.com"
            static_path = "a"
            "#,
        )
        .unwrap();
        assert!(cfg.validate().is_err());
    }
}
