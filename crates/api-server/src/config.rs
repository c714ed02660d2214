use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on one data provider call.
    pub provider_timeout: Duration,
    pub max_batch_size: usize,
    /// Serve fixtures from this JSON file instead of Yahoo Finance.
    pub fixtures_path: Option<String>,
    pub yahoo_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            provider_timeout: Duration::from_secs(30),
            max_batch_size: 50,
            fixtures_path: None,
            yahoo_base_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            provider_timeout: Duration::from_secs(
                env::var("PROVIDER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_batch_size: env::var("MAX_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("MAX_BATCH_SIZE must be a positive integer")?,
            fixtures_path: non_empty_var("CREDIT_FIXTURES_PATH"),
            yahoo_base_url: non_empty_var("YAHOO_BASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider_timeout.is_zero() {
            anyhow::bail!("PROVIDER_TIMEOUT_SECS must be greater than zero");
        }
        if self.max_batch_size == 0 {
            anyhow::bail!("MAX_BATCH_SIZE must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_rejects_zero_limits() {
        let config = ServerConfig {
            max_batch_size: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            provider_timeout: Duration::ZERO,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
