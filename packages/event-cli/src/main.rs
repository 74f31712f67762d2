//! Extract calendar events from text or a PDF.
//!
//! Events go to stdout; logs go to stderr (`RUST_LOG` controls verbosity).

mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use event_extraction::{
    join_pages, DocumentReader, EventExtractor, ExtractionConfig, FailurePolicy, OpenAIOracle,
    PdfDocumentReader, TimeRangePolicy,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "extract-events")]
#[command(about = "Extract calendar events from text or a PDF using an LLM")]
#[command(group(ArgGroup::new("input").args(["text", "file", "pdf"])))]
struct Cli {
    /// Text to extract events from
    #[arg(long)]
    text: Option<String>,

    /// Plain-text file to extract events from
    #[arg(long)]
    file: Option<PathBuf>,

    /// PDF file to extract events from
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Keep only events matching this instruction
    #[arg(long, short)]
    instruction: Option<String>,

    /// Small-chunk length in characters
    #[arg(long, default_value_t = 500)]
    chunk_length: usize,

    /// Maximum oracle calls in flight per pass
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// IANA timezone used for "today" in every prompt
    #[arg(long, default_value = "America/New_York")]
    timezone: String,

    /// Maximum events per filter or deduplication call
    #[arg(long, default_value_t = 50)]
    max_events_per_call: usize,

    /// Abort on the first failed oracle call
    #[arg(long)]
    strict: bool,

    /// What to do with events whose start is not before their end
    #[arg(long, value_enum, default_value_t = TimePolicy::Repair)]
    time_policy: TimePolicy,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Include pipeline statistics in the output
    #[arg(long)]
    stats: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TimePolicy {
    Repair,
    Drop,
    PassThrough,
}

impl From<TimePolicy> for TimeRangePolicy {
    fn from(policy: TimePolicy) -> Self {
        match policy {
            TimePolicy::Repair => Self::Repair,
            TimePolicy::Drop => Self::Drop,
            TimePolicy::PassThrough => Self::PassThrough,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Pretty,
}

impl Cli {
    fn extraction_config(&self) -> Result<ExtractionConfig> {
        let failure_policy = if self.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Lenient
        };

        let config = ExtractionConfig::new()
            .with_chunk_length(self.chunk_length)
            .with_concurrency(self.concurrency)
            .with_max_events_per_call(self.max_events_per_call)
            .with_failure_policy(failure_policy)
            .with_time_range_policy(self.time_policy.into())
            .with_timezone_name(&self.timezone)?;

        config.validate()?;
        Ok(config)
    }

    /// The source text, from whichever input was given (stdin otherwise).
    async fn read_input(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        if let Some(path) = &self.file {
            return tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()));
        }

        if let Some(path) = &self.pdf {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let pages = PdfDocumentReader
                .read_pages(&bytes)
                .with_context(|| format!("Failed to extract text from {}", path.display()))?;
            return Ok(join_pages(&pages));
        }

        read_stream(tokio::io::stdin()).await
    }
}

/// Drain a piped input stream into a string.
async fn read_stream(mut input: impl AsyncRead + Unpin) -> Result<String> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .await
        .context("Failed to read stdin")?;
    Ok(text)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, stdout carries the events)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,event_extraction=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();
    let extraction_config = cli.extraction_config()?;
    let config = CliConfig::from_env()?;

    let oracle =
        OpenAIOracle::new(config.credentials()).context("Failed to create OpenAI oracle")?;
    let extractor = EventExtractor::with_config(oracle, extraction_config)?;

    let text = cli.read_input().await?;
    tracing::debug!(chars = text.chars().count(), "Read input");

    let report = extractor
        .run(cli.instruction.as_deref(), &text)
        .await
        .context("Event extraction failed")?;

    let rendered = match cli.format {
        Format::Json => output::render_json(&report, cli.stats)?,
        Format::Pretty => output::render_pretty(&report, cli.stats),
    };
    println!("{}", rendered.trim_end());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["extract-events", "--text", "Lunch at noon"]).unwrap();
        let config = cli.extraction_config().unwrap();

        assert_eq!(config, ExtractionConfig::default());
        assert_eq!(cli.format, Format::Json);
        assert!(!cli.stats);
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "extract-events",
            "--pdf",
            "syllabus.pdf",
            "-i",
            "Get me events on graphs",
            "--chunk-length",
            "200",
            "--concurrency",
            "4",
            "--timezone",
            "Europe/Paris",
            "--max-events-per-call",
            "10",
            "--strict",
            "--time-policy",
            "pass-through",
            "--format",
            "pretty",
        ])
        .unwrap();
        let config = cli.extraction_config().unwrap();

        assert_eq!(config.chunk_length, 200);
        assert_eq!(config.concurrency, 4);
        assert_eq!(
            config.timezone,
            ExtractionConfig::new()
                .with_timezone_name("Europe/Paris")
                .unwrap()
                .timezone
        );
        assert_eq!(config.max_events_per_call, 10);
        assert_eq!(config.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.time_range_policy, TimeRangePolicy::PassThrough);
        assert_eq!(cli.instruction.as_deref(), Some("Get me events on graphs"));
        assert_eq!(cli.format, Format::Pretty);
    }

    #[test]
    fn test_inputs_are_exclusive() {
        let result = Cli::try_parse_from(["extract-events", "--text", "a", "--pdf", "b.pdf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let cli = Cli::try_parse_from(["extract-events", "--chunk-length", "0"]).unwrap();
        assert!(cli.extraction_config().is_err());

        let cli = Cli::try_parse_from(["extract-events", "--timezone", "Mars/Olympus"]).unwrap();
        assert!(cli.extraction_config().is_err());
    }

    #[tokio::test]
    async fn test_stream_input_is_read_async() {
        let text = read_stream(&b"Standup at 9am"[..]).await.unwrap();
        assert_eq!(text, "Standup at 9am");

        assert!(read_stream(&b"\xff\xfe"[..]).await.is_err());
    }

    #[tokio::test]
    async fn test_text_input_wins() {
        let cli = Cli::try_parse_from(["extract-events", "--text", "Lunch at noon"]).unwrap();
        assert_eq!(cli.read_input().await.unwrap(), "Lunch at noon");
    }
}
