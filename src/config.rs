use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated. Any origin when unset.
    pub cors_origins: Option<String>,

    /// Shared secret every client must enter
    #[serde(default = "default_chat_password")]
    pub chat_password: String,

    /// Client page served at `/`
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Outbound broadcast queue capacity
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// How long one recipient may take to accept a broadcast before it is dropped
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    // Geolocation
    #[serde(default = "default_true")]
    pub geo_enabled: bool,
    #[serde(default = "default_geo_api_url")]
    pub geo_api_url: String,
    #[serde(default = "default_geo_timeout_secs")]
    pub geo_timeout_secs: u64,
    #[serde(default = "default_geo_cache_ttl_secs")]
    pub geo_cache_ttl_secs: u64,

    /// Time given to the dispatcher to flush the final shutdown notice
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "prod" || self.environment.to_lowercase() == "production"
    }

    pub fn uses_default_password(&self) -> bool {
        self.chat_password == default_chat_password()
    }

    /// Configured CORS origins, or `None` for any origin.
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        self.cors_origins.as_ref().map(|origins| {
            origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            chat_password: default_chat_password(),
            index_path: default_index_path(),
            broadcast_capacity: default_broadcast_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
            geo_enabled: true,
            geo_api_url: default_geo_api_url(),
            geo_timeout_secs: default_geo_timeout_secs(),
            geo_cache_ttl_secs: default_geo_cache_ttl_secs(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_chat_password() -> String {
    "123".to_string()
}

fn default_index_path() -> String {
    "static/index.html".to_string()
}

fn default_broadcast_capacity() -> usize {
    200
}

fn default_send_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_geo_api_url() -> String {
    "http://whois.pconline.com.cn/ipJson.jsp".to_string()
}

fn default_geo_timeout_secs() -> u64 {
    5
}

fn default_geo_cache_ttl_secs() -> u64 {
    3600
}

fn default_shutdown_grace_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:18080");
        assert_eq!(config.broadcast_capacity, 200);
        assert_eq!(config.send_timeout_ms, 5000);
        assert!(config.uses_default_password());
        assert!(!config.is_production());
        assert!(config.cors_origin_list().is_none());
    }

    #[test]
    fn reads_values_from_pairs() {
        let vars = vec![
            ("CHAT_PASSWORD".to_string(), "Secret".to_string()),
            ("PORT".to_string(), "9000".to_string()),
            ("SEND_TIMEOUT_MS".to_string(), "250".to_string()),
            ("ENVIRONMENT".to_string(), "Production".to_string()),
            ("CORS_ORIGINS".to_string(), "https://a.example, https://b.example,".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.chat_password, "Secret");
        assert_eq!(config.port, 9000);
        assert_eq!(config.send_timeout_ms, 250);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.is_production());
        assert!(config.geo_enabled);
        assert_eq!(
            config.cors_origin_list().unwrap(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        let vars = vec![("PORT".to_string(), "not-a-port".to_string())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
