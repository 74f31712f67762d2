//! Rendering of extraction results for the terminal.

use anyhow::Result;
use colored::Colorize;
use event_extraction::{Event, ExtractionReport, PipelineStats};

/// Events as a JSON array, or the whole report when stats are requested.
pub fn render_json(report: &ExtractionReport, with_stats: bool) -> Result<String> {
    let rendered = if with_stats {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string_pretty(&report.events)?
    };
    Ok(rendered)
}

/// Human-readable listing.
pub fn render_pretty(report: &ExtractionReport, with_stats: bool) -> String {
    let mut out = String::new();

    if report.events.is_empty() {
        out.push_str(&format!("{}\n", "No events found.".dimmed()));
    }

    for (i, event) in report.events.iter().enumerate() {
        out.push_str(&render_event(i + 1, event));
    }

    if with_stats {
        out.push_str(&render_stats(&report.stats));
    }

    out
}

fn render_event(index: usize, event: &Event) -> String {
    let title = if event.title.is_empty() {
        "(untitled)"
    } else {
        event.title.as_str()
    };

    let mut out = format!(
        "{} {}\n   {} → {}\n",
        format!("{index}.").dimmed(),
        title.bold(),
        event.start.cyan(),
        event.end.cyan()
    );

    if !event.location.is_empty() {
        out.push_str(&format!("   📍 {}\n", event.location));
    }
    if !event.description.is_empty() {
        out.push_str(&format!("   {}\n", event.description));
    }
    out.push('\n');

    out
}

fn render_stats(stats: &PipelineStats) -> String {
    format!(
        "{}\n   chunks: {}  oracle calls: {} ({} failed)\n   extracted: {}  invalid: {}  repaired: {}  filtered out: {}  duplicates: {}  returned: {}\n",
        "Stats".bold(),
        stats.chunks,
        stats.oracle_calls,
        stats.failed_calls,
        stats.events_extracted,
        stats.invalid_dropped,
        stats.ranges_repaired,
        stats.filtered_out,
        stats.duplicates_removed,
        stats.events_returned,
    )
}
