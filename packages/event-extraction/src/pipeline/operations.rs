//! Single-call extraction operations.
//!
//! Each function builds one instruction, sends one request and returns the
//! typed answer. None of them retries or recovers: failure handling belongs
//! to the orchestrator, which knows the configured policy.

use std::collections::HashSet;

use openai_client::StructuredOutput;
use serde::Serialize;
use tracing::debug;

use crate::error::{OracleError, OracleResult};
use crate::pipeline::prompts::{
    format_add_description_prompt, format_add_location_prompt, format_add_title_prompt,
    format_deduplicate_prompt, format_extract_time_prompt, format_filter_prompt, PromptContext,
};
use crate::traits::oracle::{ask, Operation, Oracle, OracleRequest};
use crate::types::chunk::Chunk;
use crate::types::event::{
    Event, EventList, EventTime, EventTimeList, EventTimeLocation, EventTimeLocationDescription,
};

/// Find every event's time range in one chunk.
pub async fn extract_time<O: Oracle + ?Sized>(
    oracle: &O,
    context: &PromptContext,
    chunk: &Chunk,
) -> OracleResult<Vec<EventTime>> {
    let request = OracleRequest::new::<EventTimeList>(
        Operation::ExtractTime,
        format_extract_time_prompt(context),
        chunk.text(),
    );

    let list: EventTimeList = ask(oracle, request).await?;

    debug!(
        chunk_start = chunk.start,
        events = list.events.len(),
        "Extracted time ranges"
    );

    Ok(list.events)
}

/// Add a location to one event, reading the chunk it came from.
pub async fn add_location<O: Oracle + ?Sized>(
    oracle: &O,
    context: &PromptContext,
    text: &str,
    event: &EventTime,
) -> OracleResult<EventTimeLocation> {
    let (subject, rendered) = render_subject(event)?;
    let request = OracleRequest::new::<EventTimeLocation>(
        Operation::AddLocation,
        format_add_location_prompt(context, &rendered),
        text,
    )
    .with_subject(subject);

    ask(oracle, request).await
}

/// Add a description to one event.
pub async fn add_description<O: Oracle + ?Sized>(
    oracle: &O,
    context: &PromptContext,
    text: &str,
    event: &EventTimeLocation,
) -> OracleResult<EventTimeLocationDescription> {
    let (subject, rendered) = render_subject(event)?;
    let request = OracleRequest::new::<EventTimeLocationDescription>(
        Operation::AddDescription,
        format_add_description_prompt(context, &rendered),
        text,
    )
    .with_subject(subject);

    ask(oracle, request).await
}

/// Add a title to one event, synthesizing one if the text has none.
pub async fn add_title<O: Oracle + ?Sized>(
    oracle: &O,
    context: &PromptContext,
    text: &str,
    event: &EventTimeLocationDescription,
) -> OracleResult<Event> {
    let (subject, rendered) = render_subject(event)?;
    let request = OracleRequest::new::<Event>(
        Operation::AddTitle,
        format_add_title_prompt(context, &rendered),
        text,
    )
    .with_subject(subject);

    ask(oracle, request).await
}

/// Keep only the events matching a natural-language instruction.
pub async fn filter_by_instruction<O: Oracle + ?Sized>(
    oracle: &O,
    events: &[Event],
    instruction: &str,
) -> OracleResult<Vec<Event>> {
    let request = OracleRequest::new::<EventList>(
        Operation::Filter,
        format_filter_prompt(instruction),
        render_event_list(events)?,
    );

    let list: EventList = ask(oracle, request).await?;
    Ok(list.events)
}

/// Remove events the oracle judges to be duplicates.
pub async fn deduplicate<O: Oracle + ?Sized>(
    oracle: &O,
    events: &[Event],
) -> OracleResult<Vec<Event>> {
    let request = OracleRequest::new::<EventList>(
        Operation::Deduplicate,
        format_deduplicate_prompt(),
        render_event_list(events)?,
    );

    let list: EventList = ask(oracle, request).await?;
    Ok(list.events)
}

/// Drop events identical in every field, keeping the first occurrence.
pub fn remove_exact_duplicates(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(event.clone()))
        .collect()
}

/// Serialize an event list the way every list-shaped call sends it.
pub fn render_event_list(events: &[Event]) -> OracleResult<String> {
    #[derive(Serialize)]
    struct Events<'a> {
        events: &'a [Event],
    }

    serde_json::to_string_pretty(&Events { events }).map_err(|e| OracleError::Parse {
        schema: EventList::type_name(),
        reason: e.to_string(),
    })
}

/// A partial event as a JSON value plus its pretty rendering.
fn render_subject<T: StructuredOutput + Serialize>(
    event: &T,
) -> OracleResult<(serde_json::Value, String)> {
    let to_parse_error = |e: serde_json::Error| OracleError::Parse {
        schema: T::type_name(),
        reason: e.to_string(),
    };

    let subject = serde_json::to_value(event).map_err(to_parse_error)?;
    let rendered = serde_json::to_string_pretty(&subject).map_err(to_parse_error)?;
    Ok((subject, rendered))
}
