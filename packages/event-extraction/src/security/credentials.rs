//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretBox};

/// Model used for single-record enrichment calls.
pub const DEFAULT_SMALL_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Model used for list-shaped calls (time extraction, filter, dedup).
pub const DEFAULT_LARGE_MODEL: &str = "gpt-4o-2024-08-06";

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Everything an oracle needs to reach its backend.
///
/// Built by the caller and injected; the library never reads the
/// environment itself.
#[derive(Clone)]
pub struct OracleCredentials {
    /// API key (secret)
    pub api_key: SecretString,

    /// Model for single-record enrichment
    pub small_model: String,

    /// Model for list-shaped answers
    pub large_model: String,

    /// API base URL (optional)
    pub base_url: Option<String>,

    /// Transport timeout per call (optional)
    pub timeout: Option<Duration>,
}

impl OracleCredentials {
    /// Credentials with the default model pair.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            small_model: DEFAULT_SMALL_MODEL.to_string(),
            large_model: DEFAULT_LARGE_MODEL.to_string(),
            base_url: None,
            timeout: None,
        }
    }

    /// Override both models.
    pub fn with_models(mut self, small: impl Into<String>, large: impl Into<String>) -> Self {
        self.small_model = small.into();
        self.large_model = large.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for OracleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleCredentials")
            .field("api_key", &"[REDACTED]")
            .field("small_model", &self.small_model)
            .field("large_model", &self.large_model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("sk-super-secret-key");

        assert!(!format!("{:?}", secret).contains("sk-super"));
        assert!(!format!("{}", secret).contains("sk-super"));
        assert_eq!(secret.expose(), "sk-super-secret-key");
    }

    #[test]
    fn test_blank_secret_is_empty() {
        assert!(SecretString::new("  ").is_empty());
        assert!(!SecretString::new("sk-1").is_empty());
    }

    #[test]
    fn test_credentials_defaults_and_debug() {
        let creds = OracleCredentials::new("sk-secret").with_timeout(Duration::from_secs(30));
        let debug = format!("{:?}", creds);

        assert_eq!(creds.small_model, DEFAULT_SMALL_MODEL);
        assert_eq!(creds.large_model, DEFAULT_LARGE_MODEL);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains(DEFAULT_LARGE_MODEL));
    }

    #[test]
    fn test_with_models() {
        let creds = OracleCredentials::new("k").with_models("small-x", "large-y");
        assert_eq!(creds.small_model, "small-x");
        assert_eq!(creds.large_model, "large-y");
    }
}
