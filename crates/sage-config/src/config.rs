use serde::{Deserialize, Serialize};

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
    #[error("missing required setting: {0}")]
    Missing(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub quota: QuotaConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            quota: QuotaConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            quota: QuotaConfig::from_env()?,
            retrieval: RetrievalConfig::from_env(),
            generation: GenerationConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.quota.limit == 0 {
            return Err(ConfigError::Invalid {
                key: "quota.limit".to_string(),
                value: "0".to_string(),
            });
        }
        if self.quota.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "quota.window_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> ConfigResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// HTTP/WebSocket server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed for cross-origin access; empty means permissive
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        let allowed_origins = std::env::var("SAGE_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: std::env::var("SAGE_HOST").unwrap_or(defaults.host),
            port: env_parsed("SAGE_PORT")?.unwrap_or(defaults.port),
            allowed_origins,
        })
    }
}

/// Admission-control settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaConfig {
    /// Requests admitted per identity per window
    pub limit: u64,
    /// Fixed window length in seconds
    pub window_secs: u64,
    /// Per-connection pause after a throttling notice
    pub cooldown_secs: u64,
    /// Redis connection URL; unset selects the in-memory store
    pub redis_url: Option<String>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            window_secs: 20,
            cooldown_secs: 5,
            redis_url: None,
        }
    }
}

impl QuotaConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            limit: env_parsed("SAGE_QUOTA_LIMIT")?.unwrap_or(defaults.limit),
            window_secs: env_parsed("SAGE_QUOTA_WINDOW_SECS")?.unwrap_or(defaults.window_secs),
            cooldown_secs: env_parsed("SAGE_QUOTA_COOLDOWN_SECS")?
                .unwrap_or(defaults.cooldown_secs),
            redis_url: std::env::var("SAGE_REDIS_URL").ok(),
        })
    }
}

/// Retrieval backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub namespace: String,
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6333".to_string(),
            api_key: None,
            namespace: "default".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RetrievalConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SAGE_RETRIEVAL_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("SAGE_RETRIEVAL_API_KEY").ok(),
            namespace: std::env::var("SAGE_RETRIEVAL_NAMESPACE").unwrap_or(defaults.namespace),
            timeout_secs: std::env::var("SAGE_RETRIEVAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Most recent turns kept in the generation context; 0 = unlimited
    pub max_history_turns: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            max_history_turns: 20,
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SAGE_LLM_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("SAGE_LLM_API_KEY").ok(),
            model: std::env::var("SAGE_LLM_MODEL").unwrap_or(defaults.model),
            timeout_secs: std::env::var("SAGE_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_history_turns: std::env::var("SAGE_LLM_MAX_HISTORY_TURNS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_history_turns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.quota.limit, 5);
        assert_eq!(config.quota.window_secs, 20);
        assert_eq!(config.server.port, 8000);
        assert!(config.quota.redis_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("SAGE_QUOTA_LIMIT", "10");
        std::env::set_var("SAGE_ALLOWED_ORIGINS", "http://localhost:3000, https://example.com");

        let config = Config::from_env().unwrap();
        assert_eq!(config.quota.limit, 10);
        assert_eq!(
            config.server.allowed_origins,
            vec!["http://localhost:3000", "https://example.com"]
        );

        std::env::remove_var("SAGE_QUOTA_LIMIT");
        std::env::remove_var("SAGE_ALLOWED_ORIGINS");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = Config::default();
        config.quota.limit = 0;
        assert!(config.validate().is_err());
    }
}
