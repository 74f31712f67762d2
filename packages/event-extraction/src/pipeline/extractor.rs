//! The extraction pipeline.
//!
//! ```text
//! text ─► chunks ─► time ─► location ─► description ─► title ─► flatten
//!                                                                  │
//!                      events ◄─ validate ◄─ deduplicate ◄─ filter ┘
//! ```
//!
//! Every pass consumes the previous pass's sequence and produces a new one.
//! Calls inside a pass may run concurrently, but results are always put
//! back in chunk order, then event order, before the next pass starts.

use std::future::Future;
use std::path::Path;
use std::pin::pin;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::documents::PdfDocumentReader;
use crate::error::{DocumentReadError, ExtractionError, OracleError, OracleResult, Result};
use crate::pipeline::chunk::split_text;
use crate::pipeline::operations;
use crate::pipeline::prompts::PromptContext;
use crate::pipeline::validate::apply_time_policy;
use crate::traits::document::{join_pages, DocumentReader};
use crate::traits::oracle::{Operation, Oracle};
use crate::types::chunk::Chunk;
use crate::types::config::{ExtractionConfig, FailurePolicy};
use crate::types::event::{Event, EventTime, TimeRange};

/// Counters collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Windows submitted to time extraction
    pub chunks: usize,

    /// Oracle calls issued, failed or not
    pub oracle_calls: usize,

    /// Oracle calls that failed and were absorbed by the failure policy
    pub failed_calls: usize,

    /// Time ranges returned by the time pass
    pub events_extracted: usize,

    /// Events dropped for empty, unparseable or reversed timestamps
    pub invalid_dropped: usize,

    /// Time ranges swapped or stretched
    pub ranges_repaired: usize,

    /// Events removed by the caller's instruction
    pub filtered_out: usize,

    /// Events removed as duplicates
    pub duplicates_removed: usize,

    /// Events returned
    pub events_returned: usize,
}

/// Result of [`EventExtractor::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub events: Vec<Event>,
    pub stats: PipelineStats,
}

/// A partial event and the chunk it was found in.
#[derive(Debug, Clone)]
struct Located<'c, E> {
    chunk: &'c Chunk,
    event: E,
}

impl<E: TimeRange> TimeRange for Located<'_, E> {
    fn start(&self) -> &str {
        self.event.start()
    }

    fn end(&self) -> &str {
        self.event.end()
    }

    fn set_range(&mut self, start: String, end: String) {
        self.event.set_range(start, end);
    }
}

/// Turns free text into calendar events.
///
/// Holds only immutable configuration and the oracle, so one extractor can
/// serve concurrent invocations (wrap it in an `Arc` to share it across
/// spawned tasks).
///
/// # Example
///
/// ```rust,ignore
/// use event_extraction::{EventExtractor, OpenAIOracle, OracleCredentials};
///
/// let oracle = OpenAIOracle::new(OracleCredentials::new(api_key))?;
/// let extractor = EventExtractor::new(oracle);
///
/// let events = extractor
///     .extract(None, "Meeting on 2025-04-20 from 2pm to 3pm at Starbucks")
///     .await?;
/// ```
pub struct EventExtractor<O> {
    oracle: O,
    config: ExtractionConfig,
}

impl<O: Oracle> EventExtractor<O> {
    /// Create an extractor with the default configuration.
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            config: ExtractionConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(oracle: O, config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { oracle, config })
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract events from `text`.
    ///
    /// When `instruction` is non-blank, only events matching it are kept.
    pub async fn extract(&self, instruction: Option<&str>, text: &str) -> Result<Vec<Event>> {
        Ok(self.run(instruction, text).await?.events)
    }

    /// Extract events from a document, one string per page.
    pub async fn extract_from_document<R>(
        &self,
        instruction: Option<&str>,
        reader: &R,
        document: &[u8],
    ) -> Result<Vec<Event>>
    where
        R: DocumentReader + ?Sized,
    {
        let pages = reader.read_pages(document)?;
        debug!(pages = pages.len(), "Read document");

        let text = join_pages(&pages);
        self.extract(instruction, &text).await
    }

    /// Extract events from a PDF file.
    pub async fn extract_from_pdf(
        &self,
        instruction: Option<&str>,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Event>> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentReadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        self.extract_from_document(instruction, &PdfDocumentReader, &bytes)
            .await
    }

    /// Run the whole pipeline and report what each stage did.
    pub async fn run(&self, instruction: Option<&str>, text: &str) -> Result<ExtractionReport> {
        let chunks = split_text(text, self.config.chunk_length()?);
        let mut stats = PipelineStats {
            chunks: chunks.len(),
            ..Default::default()
        };

        info!(
            text_len = text.len(),
            chunks = chunks.len(),
            has_instruction = instruction.is_some(),
            "Starting event extraction"
        );

        if chunks.is_empty() {
            return Ok(ExtractionReport {
                events: Vec::new(),
                stats,
            });
        }

        let context = PromptContext::now(self.config.timezone);
        let oracle = &self.oracle;
        let ctx = &context;

        let timed = self.time_pass(ctx, &chunks, &mut stats).await?;

        let located = self
            .enrich_pass(
                Operation::AddLocation,
                timed,
                &mut stats,
                move |chunk, event| async move {
                    operations::add_location(oracle, ctx, chunk.text(), &event).await
                },
            )
            .await?;

        let described = self
            .enrich_pass(
                Operation::AddDescription,
                located,
                &mut stats,
                move |chunk, event| async move {
                    operations::add_description(oracle, ctx, chunk.text(), &event).await
                },
            )
            .await?;

        let titled = self
            .enrich_pass(
                Operation::AddTitle,
                described,
                &mut stats,
                move |chunk, event| async move {
                    operations::add_title(oracle, ctx, chunk.text(), &event).await
                },
            )
            .await?;

        let events: Vec<Event> = titled.into_iter().map(|l| l.event).collect();

        let events = match filter_instruction(instruction) {
            Some(instruction) => self.filter(events, instruction, &mut stats).await?,
            None => events,
        };

        let events = if events.is_empty() {
            events
        } else {
            self.deduplicate(events, &mut stats).await?
        };

        let (events, outcome) = apply_time_policy(events, self.config.time_range_policy);
        stats.invalid_dropped += outcome.dropped;
        stats.ranges_repaired += outcome.repaired;
        stats.events_returned = events.len();

        info!(
            events = events.len(),
            oracle_calls = stats.oracle_calls,
            failed_calls = stats.failed_calls,
            "Event extraction complete"
        );

        Ok(ExtractionReport { events, stats })
    }

    /// Extract time ranges chunk by chunk and validate them.
    async fn time_pass<'c>(
        &self,
        context: &PromptContext,
        chunks: &'c [Chunk],
        stats: &mut PipelineStats,
    ) -> Result<Vec<Located<'c, EventTime>>> {
        let oracle = &self.oracle;
        let calls: Vec<_> = chunks
            .iter()
            .map(|chunk| async move {
                (chunk, operations::extract_time(oracle, context, chunk).await)
            })
            .collect();

        let mut results = pin!(stream::iter(calls).buffered(self.config.concurrency));
        let mut timed = Vec::new();

        while let Some((chunk, result)) = results.next().await {
            stats.oracle_calls += 1;
            match result {
                Ok(events) => {
                    timed.extend(events.into_iter().map(|event| Located { chunk, event }));
                }
                Err(e) => {
                    self.absorb(Operation::ExtractTime, e, stats)?;
                }
            }
        }

        stats.events_extracted = timed.len();

        let (timed, outcome) = apply_time_policy(timed, self.config.time_range_policy);
        stats.invalid_dropped += outcome.dropped;
        stats.ranges_repaired += outcome.repaired;

        info!(
            chunks = chunks.len(),
            events = timed.len(),
            dropped = outcome.dropped,
            "Time pass complete"
        );

        Ok(timed)
    }

    /// Run one enrichment operation over every partial event.
    ///
    /// A failed call degrades to the previous stage with the new field empty
    /// unless the failure policy is strict.
    async fn enrich_pass<'c, I, T, F, Fut>(
        &self,
        operation: Operation,
        items: Vec<Located<'c, I>>,
        stats: &mut PipelineStats,
        enrich: F,
    ) -> Result<Vec<Located<'c, T>>>
    where
        I: Clone + Into<T>,
        F: Fn(&'c Chunk, I) -> Fut,
        Fut: Future<Output = OracleResult<T>>,
    {
        let calls: Vec<_> = items
            .into_iter()
            .map(|Located { chunk, event }| {
                let fallback = event.clone();
                let call = enrich(chunk, event);
                async move { (chunk, fallback, call.await) }
            })
            .collect();

        let mut results = pin!(stream::iter(calls).buffered(self.config.concurrency));
        let mut enriched = Vec::new();

        while let Some((chunk, fallback, result)) = results.next().await {
            stats.oracle_calls += 1;
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    self.absorb(operation, e, stats)?;
                    fallback.into()
                }
            };
            enriched.push(Located { chunk, event });
        }

        debug!(
            operation = %operation,
            events = enriched.len(),
            "Enrichment pass complete"
        );

        Ok(enriched)
    }

    /// Keep only events matching `instruction`, batch by batch.
    ///
    /// Filter failures always abort: returning unfiltered events would
    /// silently ignore the caller's instruction.
    async fn filter(
        &self,
        events: Vec<Event>,
        instruction: &str,
        stats: &mut PipelineStats,
    ) -> Result<Vec<Event>> {
        if events.is_empty() {
            return Ok(events);
        }

        let before = events.len();
        let oracle = &self.oracle;
        let calls: Vec<_> = events
            .chunks(self.config.max_events_per_call)
            .map(|batch| operations::filter_by_instruction(oracle, batch, instruction))
            .collect();

        let mut results = pin!(stream::iter(calls).buffered(self.config.concurrency));
        let mut kept = Vec::with_capacity(before);

        while let Some(result) = results.next().await {
            stats.oracle_calls += 1;
            match result {
                Ok(batch) => kept.extend(batch),
                Err(e) => {
                    stats.failed_calls += 1;
                    warn!(error = %e, "Filter call failed");
                    return Err(ExtractionError::oracle(Operation::Filter, e));
                }
            }
        }

        stats.filtered_out += before.saturating_sub(kept.len());
        info!(before, after = kept.len(), "Filter applied");

        Ok(kept)
    }

    /// Remove duplicates, in rounds of batches while the list is too long
    /// for one call, then once over the whole list.
    async fn deduplicate(
        &self,
        events: Vec<Event>,
        stats: &mut PipelineStats,
    ) -> Result<Vec<Event>> {
        let max = self.config.max_events_per_call;
        let before = events.len();
        let mut events = events;

        while events.len() > max {
            let round_start = events.len();
            events = self.deduplicate_batches(events, stats).await?;

            debug!(before = round_start, after = events.len(), "Deduplication round");

            if events.len() >= round_start {
                break;
            }
        }

        let events = if events.len() <= max {
            self.deduplicate_once(events, stats).await?
        } else {
            // Rounds stopped shrinking the list; catch exact copies that
            // landed in different batches.
            operations::remove_exact_duplicates(events)
        };

        stats.duplicates_removed += before.saturating_sub(events.len());
        info!(before, after = events.len(), "Deduplication complete");

        Ok(events)
    }

    async fn deduplicate_batches(
        &self,
        events: Vec<Event>,
        stats: &mut PipelineStats,
    ) -> Result<Vec<Event>> {
        let oracle = &self.oracle;
        let calls: Vec<_> = events
            .chunks(self.config.max_events_per_call)
            .map(|batch| async move { (batch, operations::deduplicate(oracle, batch).await) })
            .collect();

        let mut results = pin!(stream::iter(calls).buffered(self.config.concurrency));
        let mut unique = Vec::with_capacity(events.len());

        while let Some((batch, result)) = results.next().await {
            stats.oracle_calls += 1;
            match result {
                Ok(batch) => unique.extend(batch),
                Err(e) => {
                    self.absorb(Operation::Deduplicate, e, stats)?;
                    unique.extend(operations::remove_exact_duplicates(batch.to_vec()));
                }
            }
        }

        Ok(unique)
    }

    async fn deduplicate_once(
        &self,
        events: Vec<Event>,
        stats: &mut PipelineStats,
    ) -> Result<Vec<Event>> {
        stats.oracle_calls += 1;
        match operations::deduplicate(&self.oracle, &events).await {
            Ok(unique) => Ok(unique),
            Err(e) => {
                self.absorb(Operation::Deduplicate, e, stats)?;
                Ok(operations::remove_exact_duplicates(events))
            }
        }
    }

    /// Record a failed call; abort unless the failure policy allows degrading.
    fn absorb(
        &self,
        operation: Operation,
        error: OracleError,
        stats: &mut PipelineStats,
    ) -> Result<()> {
        stats.failed_calls += 1;

        match self.config.failure_policy {
            FailurePolicy::Strict => {
                warn!(operation = %operation, error = %error, "Oracle call failed, aborting");
                Err(ExtractionError::oracle(operation, error))
            }
            FailurePolicy::Lenient => {
                warn!(operation = %operation, error = %error, "Oracle call failed, degrading");
                Ok(())
            }
        }
    }
}

/// The caller's instruction, if it says anything.
fn filter_instruction(instruction: Option<&str>) -> Option<&str> {
    instruction.map(str::trim).filter(|i| !i.is_empty())
}
