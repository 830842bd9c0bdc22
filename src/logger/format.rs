//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format, prefixed with the virtual host)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with variables

use chrono::Local;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Custom pattern variables; `request_*` names precede `request`
const VARIABLES: &[&str] = &[
    "remote_addr",
    "host",
    "route",
    "time_local",
    "time_iso8601",
    "request_time",
    "request_method",
    "request_uri",
    "request",
    "status",
    "body_bytes_sent",
    "http_referer",
    "http_user_agent",
];

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    /// Host header as sent by the client
    pub host: String,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Bounded route label, the same value used for metrics
    pub route: String,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            host: String::new(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            route: String::new(),
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version)
    }

    /// `$host $remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} {} - - [{}] \"{}\" {} {} \"{}\" \"{}\"",
            or_dash(&self.host),
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "host": self.host,
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "route": self.route,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$host` - Host header
    /// - `$route` - Route label
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/version")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$http_referer` - Referer header
    /// - `$http_user_agent` - User-Agent header
    /// - `$request_time` - Request processing time in seconds (3 decimal places)
    ///
    /// The pattern is scanned once, so `$` sequences inside substituted
    /// values (e.g. a client-supplied Host) are copied verbatim.
    fn format_custom(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;
        while let Some(idx) = rest.find('$') {
            out.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            match VARIABLES.iter().find(|name| after.starts_with(**name)) {
                Some(name) => {
                    out.push_str(&self.variable(name));
                    rest = &after[name.len()..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn variable(&self, name: &str) -> String {
        match name {
            "remote_addr" => self.remote_addr.clone(),
            "host" => or_dash(&self.host).to_string(),
            "route" => self.route.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let request_time = self.request_time_us as f64 / 1_000_000.0;
                format!("{request_time:.3}")
            }
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "request" => self.request_line(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => self.referer.as_deref().unwrap_or("-").to_string(),
            "http_user_agent" => self.user_agent.as_deref().unwrap_or("-").to_string(),
            _ => String::new(),
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/dashboard/settings".to_string(),
        );
        entry.host = "example.com".to_string();
        entry.query = Some("tab=1".to_string());
        entry.status = 200;
        entry.body_bytes = 1234;
        entry.referer = Some("https://example.com/".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.route = "<spa fallback>".to_string();
        entry.request_time_us = 12_345;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.starts_with("example.com 192.168.1.1 - - ["));
        assert!(log.contains("\"GET /dashboard/settings?tab=1 HTTP/1.1\""));
        assert!(log.contains("200 1234"));
        assert!(log.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.starts_with("192.168.1.1"));
        assert!(log.contains("GET /dashboard/settings?tab=1 HTTP/1.1"));
        assert!(log.ends_with("200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["host"], "example.com");
        assert_eq!(value["status"], 200);
        assert_eq!(value["route"], "<spa fallback>");
        assert_eq!(value["query"], "tab=1");
    }

    #[test]
    fn test_format_json_null_fields() {
        let entry = AccessLogEntry::new("10.0.0.1".into(), "HEAD".into(), "/".into());
        let value: serde_json::Value = serde_json::from_str(&entry.format("json")).unwrap();
        assert!(value["referer"].is_null());
        assert!(value["query"].is_null());
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$host $route $status $request_time \"$request\"");
        assert_eq!(
            log,
            "example.com <spa fallback> 200 0.012 \"GET /dashboard/settings?tab=1 HTTP/1.1\""
        );
    }

    #[test]
    fn test_format_custom_does_not_expand_values() {
        let mut entry = create_test_entry();
        entry.host = "evil$status$http_user_agent".to_string();
        entry.path = "/$remote_addr".to_string();
        entry.query = None;

        assert_eq!(entry.format("$host"), "evil$status$http_user_agent");
        assert_eq!(entry.format("$request_uri $status"), "/$remote_addr 200");
    }

    #[test]
    fn test_format_custom_keeps_unknown_variables() {
        let log = create_test_entry().format("$status $nope $$");
        assert_eq!(log, "200 $nope $$");
    }
}
