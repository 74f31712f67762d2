//! Oracle trait for structured-output LLM calls.
//!
//! The oracle is the only non-deterministic collaborator of the pipeline:
//! it takes a system instruction, a user payload and a JSON schema, and
//! returns a value that is supposed to conform to the schema. Everything the
//! pipeline knows about the LLM goes through this trait, so tests substitute
//! a deterministic implementation (see [`crate::testing::MockOracle`]).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use openai_client::StructuredOutput;
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, OracleResult};

/// Structured-output LLM capability.
///
/// Implementations wrap a specific provider and must not keep state between
/// calls. Temperature is always 0.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send `request.instruction` (system) and `request.text` (user) and
    /// return the parsed JSON answer.
    async fn call(&self, request: OracleRequest) -> OracleResult<serde_json::Value>;
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for Arc<O> {
    async fn call(&self, request: OracleRequest) -> OracleResult<serde_json::Value> {
        (**self).call(request).await
    }
}

/// Which pipeline operation issued a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ExtractTime,
    AddLocation,
    AddDescription,
    AddTitle,
    Filter,
    Deduplicate,
}

impl Operation {
    /// Operations whose answer is a list use the larger model.
    pub fn model_tier(self) -> ModelTier {
        match self {
            Self::ExtractTime | Self::Filter | Self::Deduplicate => ModelTier::Large,
            Self::AddLocation | Self::AddDescription | Self::AddTitle => ModelTier::Small,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtractTime => "extract_time",
            Self::AddLocation => "add_location",
            Self::AddDescription => "add_description",
            Self::AddTitle => "add_title",
            Self::Filter => "filter",
            Self::Deduplicate => "deduplicate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model size selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Small, fast model for single-record enrichment
    #[default]
    Small,

    /// Larger model for list-shaped answers
    Large,
}

/// A named JSON schema the answer must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub definition: serde_json::Value,
}

impl ResponseSchema {
    /// Strict-mode schema generated from `T`.
    pub fn of<T: StructuredOutput>() -> Self {
        Self {
            name: T::type_name(),
            definition: T::openai_schema(),
        }
    }
}

/// One structured-output call.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// Operation that built this request
    pub operation: Operation,

    /// System-role instruction
    pub instruction: String,

    /// User-role payload (chunk text or serialized event list)
    pub text: String,

    /// Schema the answer must match
    pub schema: ResponseSchema,

    /// Which model to use
    pub model: ModelTier,

    /// The partial record the instruction was built around.
    ///
    /// Already rendered into `instruction`; text-only providers ignore it.
    pub subject: Option<serde_json::Value>,
}

impl OracleRequest {
    /// Build a request for `operation` answered with a `T`.
    pub fn new<T: StructuredOutput>(
        operation: Operation,
        instruction: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            instruction: instruction.into(),
            text: text.into(),
            schema: ResponseSchema::of::<T>(),
            model: operation.model_tier(),
            subject: None,
        }
    }

    /// Attach the partial record being enriched.
    pub fn with_subject(mut self, subject: serde_json::Value) -> Self {
        self.subject = Some(subject);
        self
    }
}

/// Send `request` and deserialize the answer into `T`.
pub async fn ask<T, O>(oracle: &O, request: OracleRequest) -> OracleResult<T>
where
    T: StructuredOutput,
    O: Oracle + ?Sized,
{
    let value = oracle.call(request).await?;

    serde_json::from_value(value).map_err(|e| OracleError::Parse {
        schema: T::type_name(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::{EventList, EventTime, EventTimeList};

    #[test]
    fn test_list_operations_use_large_model() {
        assert_eq!(Operation::ExtractTime.model_tier(), ModelTier::Large);
        assert_eq!(Operation::Filter.model_tier(), ModelTier::Large);
        assert_eq!(Operation::Deduplicate.model_tier(), ModelTier::Large);
        assert_eq!(Operation::AddLocation.model_tier(), ModelTier::Small);
        assert_eq!(Operation::AddDescription.model_tier(), ModelTier::Small);
        assert_eq!(Operation::AddTitle.model_tier(), ModelTier::Small);
    }

    #[test]
    fn test_request_carries_schema_of_answer_type() {
        let request = OracleRequest::new::<EventTimeList>(Operation::ExtractTime, "sys", "text");

        assert_eq!(request.schema.name, "EventTimeList");
        assert_eq!(request.model, ModelTier::Large);
        assert!(request.subject.is_none());

        let items = &request.schema.definition["properties"]["events"]["items"];
        assert_eq!(items["type"], "object");
    }

    #[test]
    fn test_schema_names() {
        assert_eq!(ResponseSchema::of::<EventList>().name, "EventList");
        assert_eq!(ResponseSchema::of::<EventTime>().name, "EventTime");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::AddTitle.to_string(), "add_title");
    }
}
