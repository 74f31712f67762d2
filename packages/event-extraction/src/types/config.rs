//! Configuration types for the extraction pipeline.

use std::num::NonZeroUsize;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Length (in characters) of the small chunks the text is cut into.
    ///
    /// Adjacent small chunks are paired, so each oracle call sees up to
    /// twice this many characters. Default: 500.
    pub chunk_length: usize,

    /// Timezone used for the "today is ..." context in every instruction.
    ///
    /// Default: America/New_York.
    pub timezone: Tz,

    /// Maximum oracle calls in flight within one pass.
    ///
    /// Output order is preserved regardless. Default: 1 (sequential).
    pub concurrency: usize,

    /// Maximum events serialized into one filter or deduplication call.
    ///
    /// Default: 50.
    pub max_events_per_call: usize,

    /// What to do when a single oracle call fails.
    pub failure_policy: FailurePolicy,

    /// What to do with events whose start is not before their end.
    pub time_range_policy: TimeRangePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_length: 500,
            timezone: chrono_tz::America::New_York,
            concurrency: 1,
            max_events_per_call: 50,
            failure_policy: FailurePolicy::default(),
            time_range_policy: TimeRangePolicy::default(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the small-chunk length.
    pub fn with_chunk_length(mut self, chunk_length: usize) -> Self {
        self.chunk_length = chunk_length;
        self
    }

    /// Set the instruction timezone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the instruction timezone from an IANA name (e.g. "Europe/Paris").
    pub fn with_timezone_name(self, name: &str) -> Result<Self, ConfigError> {
        let timezone = name
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))?;
        Ok(self.with_timezone(timezone))
    }

    /// Set per-pass concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the filter/dedup batch size.
    pub fn with_max_events_per_call(mut self, max: usize) -> Self {
        self.max_events_per_call = max;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the time range policy.
    pub fn with_time_range_policy(mut self, policy: TimeRangePolicy) -> Self {
        self.time_range_policy = policy;
        self
    }

    /// Check every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunk_length()?;
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_events_per_call == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    pub(crate) fn chunk_length(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.chunk_length).ok_or(ConfigError::ZeroChunkLength)
    }
}

/// How the pipeline reacts to a failed oracle call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Degrade per call: a failed chunk yields no events, a failed
    /// enrichment leaves its field empty, a failed deduplication falls back
    /// to removing exact duplicates. Filter failures still abort.
    #[default]
    Lenient,

    /// Abort the whole run on the first failed call.
    Strict,
}

/// How the pipeline treats events whose `start` is not strictly before `end`.
///
/// Events with an empty or unparseable timestamp are dropped under
/// `Repair` and `Drop`; `PassThrough` only drops empty ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangePolicy {
    /// Swap reversed ranges; extend zero-length ranges by one second.
    #[default]
    Repair,

    /// Drop the event.
    Drop,

    /// Return the event unchanged.
    PassThrough,
}
