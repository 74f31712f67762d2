//! Event records and their partial enrichment stages.
//!
//! Each partial type is what one pass of the pipeline produces; the next
//! pass consumes it and emits the next stage. The list wrappers exist because
//! a structured-output response must have a single object at its root.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A fully enriched calendar event.
///
/// `start` and `end` are ISO-8601 timestamps (`yyyy-mm-ddThh:mm:ss`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// Stage 1: only the time range is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventTime {
    pub start: String,
    pub end: String,
}

/// Stage 2: time range plus location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventTimeLocation {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: String,
}

/// Stage 3: time range, location and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventTimeLocationDescription {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// Root object for time-extraction responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventTimeList {
    pub events: Vec<EventTime>,
}

/// Root object for filter and deduplication responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventList {
    pub events: Vec<Event>,
}

impl EventTime {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Event {
    /// Create an event with only a time range; other fields empty.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            start: start.into(),
            end: end.into(),
            location: String::new(),
            description: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// Degraded promotions: used when an enrichment call fails and the pipeline
// keeps the event with the new field left empty.

impl From<EventTime> for EventTimeLocation {
    fn from(event: EventTime) -> Self {
        Self {
            start: event.start,
            end: event.end,
            location: String::new(),
        }
    }
}

impl From<EventTimeLocation> for EventTimeLocationDescription {
    fn from(event: EventTimeLocation) -> Self {
        Self {
            start: event.start,
            end: event.end,
            location: event.location,
            description: String::new(),
        }
    }
}

impl From<EventTimeLocationDescription> for Event {
    fn from(event: EventTimeLocationDescription) -> Self {
        Self {
            title: String::new(),
            start: event.start,
            end: event.end,
            location: event.location,
            description: event.description,
        }
    }
}

/// Records carrying a `start`/`end` pair.
pub trait TimeRange {
    fn start(&self) -> &str;
    fn end(&self) -> &str;
    fn set_range(&mut self, start: String, end: String);
}

macro_rules! impl_time_range {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TimeRange for $ty {
                fn start(&self) -> &str {
                    &self.start
                }

                fn end(&self) -> &str {
                    &self.end
                }

                fn set_range(&mut self, start: String, end: String) {
                    self.start = start;
                    self.end = end;
                }
            }
        )*
    };
}

impl_time_range!(
    Event,
    EventTime,
    EventTimeLocation,
    EventTimeLocationDescription
);
