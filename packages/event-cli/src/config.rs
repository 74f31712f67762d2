use anyhow::{Context, Result};
use dotenvy::dotenv;
use event_extraction::{OracleCredentials, SecretString};
use std::env;
use std::time::Duration;

/// Oracle configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub openai_api_key: SecretString,
    pub openai_base_url: Option<String>,
    pub small_model: Option<String>,
    pub large_model: Option<String>,
    pub timeout: Option<Duration>,
}

impl CliConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            openai_api_key: var("OPENAI_API_KEY")
                .map(SecretString::new)
                .context("OPENAI_API_KEY must be set")?,
            openai_base_url: var("OPENAI_BASE_URL"),
            small_model: var("EVENTS_SMALL_MODEL"),
            large_model: var("EVENTS_LARGE_MODEL"),
            timeout: var("OPENAI_TIMEOUT_SECS")
                .map(|secs| secs.trim().parse::<u64>())
                .transpose()
                .context("OPENAI_TIMEOUT_SECS must be a whole number of seconds")?
                .map(Duration::from_secs),
        })
    }

    /// Credentials for the OpenAI oracle.
    pub fn credentials(&self) -> OracleCredentials {
        let mut credentials = OracleCredentials::new(self.openai_api_key.expose());

        if let Some(small) = &self.small_model {
            credentials.small_model = small.clone();
        }
        if let Some(large) = &self.large_model {
            credentials.large_model = large.clone();
        }
        if let Some(url) = &self.openai_base_url {
            credentials = credentials.with_base_url(url.clone());
        }
        if let Some(timeout) = self.timeout {
            credentials = credentials.with_timeout(timeout);
        }

        credentials
    }
}
