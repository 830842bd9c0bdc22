// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Prometheus exposition listener
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_grace_period: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Virtual hosts served by this process
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Domain that local aliases are mapped onto
    pub localhost_test_domain: String,
    #[serde(default = "default_local_aliases")]
    pub local_aliases: Vec<String>,
    /// Extensions served with the short-lived cache policy
    #[serde(default = "default_no_cache_extensions")]
    pub no_cache_extensions: Vec<String>,
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

fn default_local_aliases() -> Vec<String> {
    vec!["localhost".to_string(), "remu".to_string()]
}

fn default_no_cache_extensions() -> Vec<String> {
    vec![".html".to_string()]
}

/// One `[[site.domains]]` entry
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub host: String,
    pub static_path: String,
    #[serde(default)]
    pub api_enabled: bool,
}
