//! LLM prompts for the extraction pipeline.
//!
//! Every instruction is anchored to "today" so relative dates ("next
//! Tuesday", "tomorrow at 2pm") resolve against the caller's clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Prompt for pulling time ranges out of a chunk of text.
pub const EXTRACT_TIME_PROMPT: &str = r#"You extract calendar events from natural language. Today is {now}, {weekday}.

Find every event mentioned in the text and return its start and end time.
- Return all times in yyyy-mm-ddThh:mm:ss format.
- The start of an event must be strictly before its end. If no duration is stated, make a reasonable estimate.
- An event that happens on several dates is one entry per date.

Return structured JSON as: {"events": [ ... ]}.
If nothing can be parsed, return an empty list inside: {"events": []}."#;

/// Prompt for adding a location to one event.
pub const ADD_LOCATION_PROMPT: &str = r#"Add location information to the following event:
{event}

Today is {now}, {weekday}.
Return structured JSON as: {"start": ... , "end": ... , "location": ... }.
Return all times in yyyy-mm-ddThh:mm:ss format and keep the start and end of the event unchanged.
If location information cannot be found, return an empty string for the "location" field."#;

/// Prompt for adding a description to one event.
pub const ADD_DESCRIPTION_PROMPT: &str = r#"Add description information to the following event:
{event}

Today is {now}, {weekday}.
Return structured JSON as: {"start": ... , "end": ... , "location": ... , "description": ... }.
Return all times in yyyy-mm-ddThh:mm:ss format and keep the other fields of the event unchanged.
If description information cannot be found, return an empty string for the "description" field."#;

/// Prompt for adding a title to one event.
pub const ADD_TITLE_PROMPT: &str = r#"Add title information to the following event:
{event}

Today is {now}, {weekday}.
Return structured JSON as: {"title": ... , "start": ... , "end": ... , "location": ... , "description": ... }.
Return all times in yyyy-mm-ddThh:mm:ss format and keep the other fields of the event unchanged.
If title information cannot be found, create a short title based on the start time, end time, location and description."#;

/// Prompt for keeping only events that match a user instruction.
pub const FILTER_PROMPT: &str = r#"Filter events according to the following instruction: {instruction}

Keep the events that satisfy the instruction and drop the rest. Do not modify the events you keep.
Return structured JSON as: {"events": [ ... ]}."#;

/// Prompt for removing duplicated events.
pub const DEDUPLICATE_PROMPT: &str = r#"Remove duplicated events.

Two events are duplicates when they describe the same occurrence, even if their wording differs slightly. Keep the most complete copy of each.
Do not modify the events you keep.
Return structured JSON as: {"events": [ ... ]}."#;

/// The "today" anchor rendered into every enrichment instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptContext {
    now: DateTime<Tz>,
}

impl PromptContext {
    /// Anchor at the current instant in `timezone`.
    pub fn now(timezone: Tz) -> Self {
        Self::at(Utc::now().with_timezone(&timezone))
    }

    /// Anchor at a fixed instant.
    pub fn at(now: DateTime<Tz>) -> Self {
        Self { now }
    }

    /// e.g. `2025-04-18T09:30:00-04:00`
    pub fn timestamp(&self) -> String {
        self.now.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    }

    /// e.g. `Friday`
    pub fn weekday(&self) -> String {
        self.now.format("%A").to_string()
    }

    fn render(&self, template: &str) -> String {
        template
            .replace("{now}", &self.timestamp())
            .replace("{weekday}", &self.weekday())
    }
}

/// Format the time extraction prompt.
pub fn format_extract_time_prompt(context: &PromptContext) -> String {
    context.render(EXTRACT_TIME_PROMPT)
}

/// Format the location prompt around a partial event (pretty JSON).
pub fn format_add_location_prompt(context: &PromptContext, event: &str) -> String {
    context.render(ADD_LOCATION_PROMPT).replace("{event}", event)
}

/// Format the description prompt around a partial event (pretty JSON).
pub fn format_add_description_prompt(context: &PromptContext, event: &str) -> String {
    context
        .render(ADD_DESCRIPTION_PROMPT)
        .replace("{event}", event)
}

/// Format the title prompt around a partial event (pretty JSON).
pub fn format_add_title_prompt(context: &PromptContext, event: &str) -> String {
    context.render(ADD_TITLE_PROMPT).replace("{event}", event)
}

/// Format the filter prompt with the caller's instruction.
pub fn format_filter_prompt(instruction: &str) -> String {
    FILTER_PROMPT.replace("{instruction}", instruction.trim())
}

/// The deduplication prompt takes no parameters.
pub fn format_deduplicate_prompt() -> String {
    DEDUPLICATE_PROMPT.to_string()
}
