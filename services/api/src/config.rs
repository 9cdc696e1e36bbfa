//! Service configuration from `APP_`-prefixed environment variables

use anyhow::{Context, Result, bail};
use config::{Config, Environment, Map};
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// HS256 secret shared with the auth service
    pub jwt_secret: Option<String>,
    /// RS256 public key, PEM text or a path to a PEM file
    pub jwt_public_key: Option<String>,
    /// S3 bucket holding uploaded images; assets are kept when unset
    pub asset_bucket: Option<String>,
    /// Redis for the suggestion cache; caching is off when unset
    pub redis_url: Option<String>,
    /// Lifetime of cached suggestions in seconds
    pub suggestion_cache_ttl: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Cron expression (with seconds) for the reconciliation job
    pub reconcile_schedule: String,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from `vars` instead of the process environment
    pub fn from_vars(vars: Map<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<Map<String, String>>) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("suggestion_cache_ttl", 300)?
            .set_default("default_page_size", 10)?
            .set_default("max_page_size", 100)?
            .set_default("reconcile_schedule", "0 0 3 * * *")?
            .add_source(
                Environment::with_prefix("APP")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.max_page_size == 0 {
            bail!("APP_MAX_PAGE_SIZE must be at least 1");
        }
        if config.default_page_size == 0 || config.default_page_size > config.max_page_size {
            bail!("APP_DEFAULT_PAGE_SIZE must be between 1 and APP_MAX_PAGE_SIZE");
        }

        Ok(config)
    }

    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
