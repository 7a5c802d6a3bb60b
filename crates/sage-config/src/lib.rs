//! Sage configuration - environment-driven settings for the gateway.

mod config;

pub use config::{
    Config, ConfigError, ConfigResult, GenerationConfig, QuotaConfig, RetrievalConfig,
    ServerConfig,
};
