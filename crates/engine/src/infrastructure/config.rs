//! Engine configuration

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Engine configuration loaded from environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Protocol server bind host
    pub host: String,
    /// Protocol server port (0 picks a free port)
    pub port: u16,

    /// How long a bridge request waits for its reply
    pub bridge_timeout: Duration,

    /// Longest accepted protocol line, in bytes
    pub max_line_bytes: usize,

    /// Outbound reply queue per connection
    pub connection_buffer: usize,

    /// Speak the message bridge on stdin/stdout
    pub stdio_bridge: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            bridge_timeout: Duration::from_millis(5000),
            max_line_bytes: 1024 * 1024,
            connection_buffer: 256,
            stdio_bridge: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("WIDGETRY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            port: env::var("WIDGETRY_PORT")
                .unwrap_or_else(|_| "7777".to_string())
                .parse()
                .context("WIDGETRY_PORT must be a valid port number")?,

            bridge_timeout: Duration::from_millis(
                env::var("WIDGETRY_BRIDGE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .context("WIDGETRY_BRIDGE_TIMEOUT_MS must be a number of milliseconds")?,
            ),

            max_line_bytes: env::var("WIDGETRY_MAX_LINE_BYTES")
                .unwrap_or_else(|_| "1048576".to_string())
                .parse()
                .context("WIDGETRY_MAX_LINE_BYTES must be a byte count")?,

            connection_buffer: env::var("WIDGETRY_CONNECTION_BUFFER")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .unwrap_or(256),

            stdio_bridge: env::var("WIDGETRY_STDIO_BRIDGE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Socket address to bind the protocol server to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
