//! Environment-driven configuration
//!
//! Every knob has a default so a bare `cargo run` works against the
//! in-memory store; `DATABASE_URL` switches persistence to Postgres.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    /// Order intake listener (conceptually port A)
    pub intake_port: u16,
    /// Trade/query listener (conceptually port B)
    pub query_port: u16,
    /// Streaming listener (conceptually port C)
    pub stream_port: u16,
    /// Postgres connection string; in-memory storage when absent
    pub database_url: Option<String>,
    /// Feed emit interval
    pub snapshot_interval: Duration,
    /// Price levels per side in published snapshots
    pub snapshot_depth: usize,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_string("API_HOST", "0.0.0.0"),
            intake_port: env_u16("INTAKE_PORT", 8000),
            query_port: env_u16("QUERY_PORT", 8001),
            stream_port: env_u16("STREAM_PORT", 8002),
            database_url: std::env::var("DATABASE_URL").ok(),
            snapshot_interval: Duration::from_millis(env_u64("SNAPSHOT_INTERVAL_MS", 1000)),
            snapshot_depth: env_u64("SNAPSHOT_DEPTH", 5) as usize,
        }
    }

    pub fn intake_addr(&self) -> String {
        format!("{}:{}", self.host, self.intake_port)
    }

    pub fn query_addr(&self) -> String {
        format!("{}:{}", self.host, self.query_port)
    }

    pub fn stream_addr(&self) -> String {
        format!("{}:{}", self.host, self.stream_port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            intake_port: 8000,
            query_port: 8001,
            stream_port: 8002,
            database_url: None,
            snapshot_interval: Duration::from_secs(1),
            snapshot_depth: 5,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
