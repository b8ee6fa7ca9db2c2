//! Configuration Module
//!
//! Handles loading cache provider and server configuration from environment variables.

use std::env;

/// Default Redis endpoint used when `REDIS_URL` is not set.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Cache provider configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection URL of the network cache
    pub redis_url: String,
    /// HTTP server port for the health/stats surface
    pub server_port: u16,
    /// Skip the network cache entirely and start in fallback mode
    pub force_memory: bool,
    /// Interval in seconds between `temp:*` flushes, 0 disables the task
    pub temp_flush_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Network cache URL (default: redis://127.0.0.1:6379)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_FORCE_MEMORY` - `true`/`1` to use only the in-process cache (default: false)
    /// - `TEMP_FLUSH_INTERVAL` - Temporary namespace flush frequency in seconds (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.redis_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            force_memory: env::var("CACHE_FORCE_MEMORY")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.force_memory),
            temp_flush_interval: env::var("TEMP_FLUSH_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temp_flush_interval),
        }
    }

    /// Configuration that never touches the network, used by tests and
    /// single-process deployments.
    pub fn memory_only() -> Self {
        Self {
            force_memory: true,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            server_port: 3000,
            force_memory: false,
            temp_flush_interval: 3600,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.server_port, 3000);
        assert!(!config.force_memory);
        assert_eq!(config.temp_flush_interval, 3600);
    }

    #[test]
    fn test_config_memory_only() {
        let config = Config::memory_only();
        assert!(config.force_memory);
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("REDIS_URL");
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_FORCE_MEMORY");
        env::remove_var("TEMP_FLUSH_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.server_port, 3000);
        assert!(!config.force_memory);
        assert_eq!(config.temp_flush_interval, 3600);
    }
}
