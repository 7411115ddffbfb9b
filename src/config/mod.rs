//! Configuration module for the Mensa sync service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default base URL of the remote Mensa API.
pub const DEFAULT_API_BASE_URL: &str = "https://mensa.gregorflachs.de/api/v1";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote Mensa REST API
    pub api_base_url: String,
    /// API key sent to the remote API in the `X-API-KEY` header
    pub api_key: Option<String>,
    /// Path to the SQLite chat database
    pub db_path: PathBuf,
    /// Whether the chat store is enabled for this runtime
    pub chat_enabled: bool,
    /// Pre-shared key protecting the local HTTP adapter
    pub local_psk: Option<String>,
    /// Address to bind the local HTTP adapter to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("MENSA_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_key = env::var("MENSA_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("MENSA_DB_PATH")
            .unwrap_or_else(|_| "./data/chat.db".to_string())
            .into();

        let chat_enabled = match env::var("MENSA_CHAT_ENABLED") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| format!("Invalid MENSA_CHAT_ENABLED value: {}", value))?,
            Err(_) => true,
        };

        let local_psk = env::var("MENSA_LOCAL_PSK").ok().filter(|k| !k.is_empty());

        let bind_addr = env::var("MENSA_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid MENSA_BIND_ADDR format: {}", e))?;

        let log_level = env::var("MENSA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_base_url,
            api_key,
            db_path,
            chat_enabled,
            local_psk,
            bind_addr,
            log_level,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MENSA_API_BASE_URL");
        env::remove_var("MENSA_API_KEY");
        env::remove_var("MENSA_DB_PATH");
        env::remove_var("MENSA_CHAT_ENABLED");
        env::remove_var("MENSA_LOCAL_PSK");
        env::remove_var("MENSA_BIND_ADDR");
        env::remove_var("MENSA_LOG_LEVEL");

        let config = Config::from_env().unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/chat.db"));
        assert!(config.chat_enabled);
        assert!(config.local_psk.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
