//! Logger module
//!
//! Provides logging utilities for the edge server including:
//! - Startup summaries (listeners, domain table, asset cache)
//! - Access logging with multiple formats
//! - Leveled error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::assets::AssetCache;
use crate::config::Config;
use std::net::SocketAddr;
use std::str::FromStr;

/// Severity threshold from `logging.level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("Unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level: Level = config.logging.level.parse()?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;
    Ok(())
}

fn enabled(level: Level) -> bool {
    writer::get().map_or(Level::Info, writer::LogWriter::level) >= level
}

pub fn debug_enabled() -> bool {
    enabled(Level::Debug)
}

/// Write to info/access log
fn write_info(message: &str) {
    if !enabled(Level::Info) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Edge server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

/// Domain table and cache contents, one line per domain
pub fn log_site_summary(config: &Config, assets: &AssetCache) {
    write_info("[CONFIG] Domain mappings:");
    for domain in &config.site.domains {
        let api = if domain.api_enabled { "API enabled" } else { "no API" };
        let stats = assets.domain_stats(&domain.host.trim().to_ascii_lowercase());
        write_info(&format!(
            "  - {} -> {} ({api}, {} files, {} bytes)",
            domain.host, domain.static_path, stats.files, stats.bytes
        ));
    }
    write_info(&format!(
        "[CONFIG] Local aliases {:?} -> {}",
        config.site.local_aliases, config.site.localhost_test_domain
    ));
    write_info(&format!(
        "[CONFIG] Short-lived cache extensions: {:?}",
        config.site.no_cache_extensions
    ));
    write_info(&format!(
        "[CACHE] {} assets loaded, {} bytes in memory",
        assets.len(),
        assets.total_bytes()
    ));
}

pub fn log_metrics_start(addr: &SocketAddr, path: &str) {
    write_info(&format!("[METRICS] Prometheus endpoint: http://{addr}{path}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if debug_enabled() {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(Level::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    if debug_enabled() {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    if !enabled(Level::Info) {
        return;
    }
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_shutdown_signal(signal: &str) {
    write_info(&format!("\n[SIGNAL] {signal} received, shutting down gracefully"));
}

pub fn log_shutdown_started(active: usize) {
    write_info(&format!(
        "[SHUTDOWN] Listeners closed, {active} connection(s) still active"
    ));
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write_info("[SHUTDOWN] All connections drained");
    } else {
        log_warning(&format!(
            "[SHUTDOWN] Grace period elapsed with {remaining} connection(s) still open"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" debug ".parse::<Level>().unwrap(), Level::Debug);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug > Level::Info);
        assert!(Level::Warn > Level::Error);
    }
}
