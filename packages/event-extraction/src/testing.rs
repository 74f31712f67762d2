//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making real LLM calls.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{DocumentReadError, OracleError, OracleResult};
use crate::traits::{
    document::DocumentReader,
    oracle::{Operation, Oracle, OracleRequest},
};
use crate::types::event::{EventList, EventTime, EventTimeList};

/// Custom answer for one operation.
pub type MockHandler = Arc<dyn Fn(&OracleRequest) -> OracleResult<Value> + Send + Sync>;

/// A deterministic oracle for testing.
///
/// Without configuration it behaves like an oracle that finds nothing new:
/// - time extraction returns an empty list
/// - enrichment returns the partial event with the new field empty
/// - filter and deduplication return the events they were sent
///
/// Builders override these per operation, and every request is recorded.
#[derive(Clone, Default)]
pub struct MockOracle {
    /// Time ranges returned for chunks containing a marker ("" = any chunk)
    time_rules: Arc<RwLock<Vec<(String, Vec<EventTime>)>>>,

    /// Values for the enriched fields
    location: Arc<RwLock<Option<String>>>,
    description: Arc<RwLock<Option<String>>>,
    title: Arc<RwLock<Option<String>>>,

    /// Full overrides by operation
    handlers: Arc<RwLock<HashMap<Operation, MockHandler>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<OracleRequest>>>,
}

impl MockOracle {
    /// Create a new mock oracle with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `events` for every chunk.
    pub fn with_time_events(self, events: Vec<EventTime>) -> Self {
        self.with_time_events_for("", events)
    }

    /// Return `events` for chunks containing `marker`.
    ///
    /// Rules are tried in insertion order; the first match wins.
    pub fn with_time_events_for(self, marker: impl Into<String>, events: Vec<EventTime>) -> Self {
        self.time_rules
            .write()
            .unwrap()
            .push((marker.into(), events));
        self
    }

    /// Location returned by every location call.
    pub fn with_location(self, location: impl Into<String>) -> Self {
        *self.location.write().unwrap() = Some(location.into());
        self
    }

    /// Description returned by every description call.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        *self.description.write().unwrap() = Some(description.into());
        self
    }

    /// Title returned by every title call.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        *self.title.write().unwrap() = Some(title.into());
        self
    }

    /// Answer `operation` with a custom handler.
    pub fn on<F>(self, operation: Operation, handler: F) -> Self
    where
        F: Fn(&OracleRequest) -> OracleResult<Value> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap()
            .insert(operation, Arc::new(handler));
        self
    }

    /// Make every call for `operation` fail with a transport error.
    pub fn failing(self, operation: Operation) -> Self {
        self.on(operation, move |_| {
            Err(OracleError::Transport(format!("mock {operation} failure")))
        })
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<OracleRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Get the calls made for one operation.
    pub fn calls_for(&self, operation: Operation) -> Vec<OracleRequest> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of calls made for one operation.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn default_answer(&self, request: &OracleRequest) -> OracleResult<Value> {
        match request.operation {
            Operation::ExtractTime => {
                let events = self
                    .time_rules
                    .read()
                    .unwrap()
                    .iter()
                    .find(|(marker, _)| request.text.contains(marker.as_str()))
                    .map(|(_, events)| events.clone())
                    .unwrap_or_default();
                to_value(&EventTimeList { events })
            }
            Operation::AddLocation => enrich(request, "location", &self.location),
            Operation::AddDescription => enrich(request, "description", &self.description),
            Operation::AddTitle => enrich(request, "title", &self.title),
            Operation::Filter | Operation::Deduplicate => to_value(&events_in(request)?),
        }
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn call(&self, request: OracleRequest) -> OracleResult<Value> {
        self.calls.write().unwrap().push(request.clone());

        let handler = self
            .handlers
            .read()
            .unwrap()
            .get(&request.operation)
            .cloned();

        match handler {
            Some(handler) => handler(&request),
            None => self.default_answer(&request),
        }
    }
}

/// Parse the event list a filter or deduplication request carries.
pub fn events_in(request: &OracleRequest) -> OracleResult<EventList> {
    serde_json::from_str(&request.text).map_err(|e| OracleError::Parse {
        schema: "EventList".into(),
        reason: e.to_string(),
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> OracleResult<Value> {
    serde_json::to_value(value).map_err(|e| OracleError::Parse {
        schema: std::any::type_name::<T>().into(),
        reason: e.to_string(),
    })
}

/// The request's subject with `field` set.
fn enrich(
    request: &OracleRequest,
    field: &str,
    value: &RwLock<Option<String>>,
) -> OracleResult<Value> {
    let mut subject = request.subject.clone().ok_or_else(|| OracleError::Parse {
        schema: request.schema.name.clone(),
        reason: "request has no subject".into(),
    })?;

    if let Some(object) = subject.as_object_mut() {
        let value = value.read().unwrap().clone().unwrap_or_default();
        object.insert(field.to_string(), Value::String(value));
    }

    Ok(subject)
}

/// A document reader returning fixed pages.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentReader {
    pages: Vec<String>,
    error: Option<String>,
}

impl MockDocumentReader {
    /// Reader returning `pages` for any input.
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Reader failing with a parse error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            error: Some(message.into()),
        }
    }
}

impl DocumentReader for MockDocumentReader {
    fn read_pages(&self, _document: &[u8]) -> Result<Vec<String>, DocumentReadError> {
        match &self.error {
            Some(message) => Err(DocumentReadError::Parse(message.clone())),
            None => Ok(self.pages.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::{Event, EventTimeLocation};
    use serde_json::json;

    fn request(operation: Operation, text: &str) -> OracleRequest {
        OracleRequest::new::<EventList>(operation, "instruction", text)
    }

    #[tokio::test]
    async fn test_time_rules_match_by_marker() {
        let oracle = MockOracle::new()
            .with_time_events_for(
                "Tuesday",
                vec![EventTime::new("2025-04-22T09:00:00", "2025-04-22T10:00:00")],
            )
            .with_time_events(vec![]);

        let hit = oracle
            .call(request(Operation::ExtractTime, "on Tuesday"))
            .await
            .unwrap();
        let miss = oracle
            .call(request(Operation::ExtractTime, "nothing here"))
            .await
            .unwrap();

        assert_eq!(hit["events"].as_array().unwrap().len(), 1);
        assert_eq!(miss, json!({"events": []}));
    }

    #[tokio::test]
    async fn test_enrichment_defaults_to_empty_field() {
        let oracle = MockOracle::new();
        let subject = json!({"start": "2025-04-20T14:00:00", "end": "2025-04-20T15:00:00"});

        let answer = oracle
            .call(
                OracleRequest::new::<EventTimeLocation>(Operation::AddLocation, "i", "t")
                    .with_subject(subject),
            )
            .await
            .unwrap();

        assert_eq!(answer["location"], "");
        assert_eq!(answer["start"], "2025-04-20T14:00:00");
    }

    #[tokio::test]
    async fn test_list_operations_pass_events_through() {
        let oracle = MockOracle::new();
        let list = EventList {
            events: vec![Event::new("2025-04-20T14:00:00", "2025-04-20T15:00:00")],
        };
        let text = serde_json::to_string(&list).unwrap();

        let answer = oracle
            .call(request(Operation::Deduplicate, &text))
            .await
            .unwrap();

        assert_eq!(serde_json::from_value::<EventList>(answer).unwrap(), list);
    }

    #[tokio::test]
    async fn test_failing_and_call_tracking() {
        let oracle = MockOracle::new().failing(Operation::Filter);

        let err = oracle
            .call(request(Operation::Filter, "{}"))
            .await
            .unwrap_err();

        assert!(matches!(err, OracleError::Transport(_)));
        assert_eq!(oracle.call_count(Operation::Filter), 1);
        assert_eq!(oracle.calls().len(), 1);

        oracle.clear_calls();
        assert!(oracle.calls().is_empty());
    }

    #[test]
    fn test_mock_document_reader() {
        let reader = MockDocumentReader::new(["one", "two"]);
        assert_eq!(reader.read_pages(b"").unwrap(), vec!["one", "two"]);

        let failing = MockDocumentReader::failing("corrupt");
        assert!(failing.read_pages(b"").is_err());
    }
}
