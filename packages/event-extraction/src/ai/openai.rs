//! OpenAI implementation of the Oracle trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use event_extraction::{OpenAIOracle, OracleCredentials};
//!
//! let oracle = OpenAIOracle::new(OracleCredentials::new(api_key))?;
//! let extractor = EventExtractor::new(oracle);
//! ```

use async_trait::async_trait;
use openai_client::{strip_code_blocks, OpenAIClient, OpenAIError, StructuredRequest};
use tracing::debug;

use crate::error::{OracleError, OracleResult};
use crate::security::OracleCredentials;
use crate::traits::oracle::{ModelTier, Oracle, OracleRequest};

/// Oracle backed by OpenAI structured outputs.
#[derive(Debug, Clone)]
pub struct OpenAIOracle {
    client: OpenAIClient,
    small_model: String,
    large_model: String,
}

impl OpenAIOracle {
    /// Build the oracle from injected credentials.
    pub fn new(credentials: OracleCredentials) -> OracleResult<Self> {
        if credentials.api_key.is_empty() {
            return Err(OracleError::Config("API key is empty".into()));
        }

        let mut client = OpenAIClient::new(credentials.api_key.expose());
        if let Some(url) = credentials.base_url {
            client = client.with_base_url(url);
        }
        if let Some(timeout) = credentials.timeout {
            client = client.with_timeout(timeout)?;
        }

        Ok(Self {
            client,
            small_model: credentials.small_model,
            large_model: credentials.large_model,
        })
    }

    /// Model identifier used for `tier`.
    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Small => &self.small_model,
            ModelTier::Large => &self.large_model,
        }
    }
}

#[async_trait]
impl Oracle for OpenAIOracle {
    async fn call(&self, request: OracleRequest) -> OracleResult<serde_json::Value> {
        let model = self.model(request.model).to_string();
        let schema_name = request.schema.name.clone();

        debug!(
            operation = %request.operation,
            model = %model,
            schema = %schema_name,
            text_len = request.text.len(),
            "Calling OpenAI oracle"
        );

        let structured = StructuredRequest::new(
            model,
            request.instruction,
            request.text,
            request.schema.definition,
        )
        .with_schema_name(&schema_name);

        let raw = self
            .client
            .structured_output(structured)
            .await
            .map_err(|err| match err {
                OpenAIError::Parse(reason) => OracleError::Parse {
                    schema: schema_name.clone(),
                    reason,
                },
                other => other.into(),
            })?;

        serde_json::from_str(strip_code_blocks(&raw)).map_err(|e| OracleError::Parse {
            schema: schema_name,
            reason: e.to_string(),
        })
    }
}
