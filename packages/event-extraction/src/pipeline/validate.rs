//! Timestamp validation and time-range repair.
//!
//! The oracle is asked for `start < end`, but nothing forces it. Ranges are
//! checked twice: right after time extraction (so enrichment never works on
//! garbage) and on the final list (enrichment may rewrite the times).

use std::cmp::Ordering;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, SecondsFormat, Timelike};
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::types::config::TimeRangePolicy;
use crate::types::event::TimeRange;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// A parsed timestamp that remembers whether it carried an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Timestamp {
    Naive(NaiveDateTime),
    Offset {
        value: DateTime<FixedOffset>,
        zulu: bool,
    },
}

impl Timestamp {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            let zulu = raw.ends_with('Z') || raw.ends_with('z');
            return Some(Self::Offset { value, zulu });
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Self::Naive)
    }

    /// Wall-clock time, used to compare mixed naive/offset pairs.
    fn local(&self) -> NaiveDateTime {
        match self {
            Self::Naive(value) => *value,
            Self::Offset { value, .. } => value.naive_local(),
        }
    }

    /// Instants when both sides carry an offset, wall-clock otherwise.
    fn chronological_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Offset { value: a, .. }, Self::Offset { value: b, .. }) => a.cmp(b),
            _ => self.local().cmp(&other.local()),
        }
    }

    /// `None` when the result falls outside chrono's range.
    fn plus_one_second(self) -> Option<String> {
        let step = Duration::seconds(1);
        match self {
            Self::Naive(value) => {
                let next = value.checked_add_signed(step)?;
                Some(if next.nanosecond() == 0 {
                    next.format("%Y-%m-%dT%H:%M:%S").to_string()
                } else {
                    next.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
                })
            }
            Self::Offset { value, zulu } => Some(
                value
                    .checked_add_signed(step)?
                    .to_rfc3339_opts(SecondsFormat::AutoSi, zulu),
            ),
        }
    }
}

fn parse_field(field: &'static str, raw: &str) -> Result<Timestamp, ValidationError> {
    Timestamp::parse(raw).ok_or_else(|| ValidationError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

/// Emptiness of either side is reported before any parse error.
fn parse_range(start: &str, end: &str) -> Result<(Timestamp, Timestamp), ValidationError> {
    for (field, raw) in [("start", start), ("end", end)] {
        if raw.trim().is_empty() {
            return Err(ValidationError::MissingTimestamp { field });
        }
    }
    Ok((parse_field("start", start)?, parse_field("end", end)?))
}

/// Check that both timestamps parse and `start` is strictly before `end`.
pub fn validate_range(start: &str, end: &str) -> Result<(), ValidationError> {
    let (s, e) = parse_range(start, end)?;
    if s.chronological_cmp(&e) == Ordering::Less {
        Ok(())
    } else {
        Err(ValidationError::NotChronological {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// What applying a [`TimeRangePolicy`] did to a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub dropped: usize,
    pub repaired: usize,
}

/// Apply `policy` to every record, preserving order.
pub fn apply_time_policy<E: TimeRange>(
    events: Vec<E>,
    policy: TimeRangePolicy,
) -> (Vec<E>, PolicyOutcome) {
    let mut outcome = PolicyOutcome::default();
    let mut kept = Vec::with_capacity(events.len());

    for mut event in events {
        let verdict = match parse_range(event.start(), event.end()) {
            Ok((s, e)) if s.chronological_cmp(&e) == Ordering::Less => Verdict::Keep,
            Ok((s, e)) => match policy {
                TimeRangePolicy::Repair => match repair(event.start(), event.end(), s, e) {
                    Some((start, end)) => Verdict::Repair(start, end),
                    None => Verdict::Drop(ValidationError::OutOfRange {
                        value: event.start().to_string(),
                    }),
                },
                TimeRangePolicy::Drop => Verdict::Drop(ValidationError::NotChronological {
                    start: event.start().to_string(),
                    end: event.end().to_string(),
                }),
                TimeRangePolicy::PassThrough => Verdict::Keep,
            },
            Err(err @ ValidationError::InvalidTimestamp { .. })
                if policy == TimeRangePolicy::PassThrough =>
            {
                debug!(error = %err, "Passing through unparseable timestamp");
                Verdict::Keep
            }
            Err(err) => Verdict::Drop(err),
        };

        match verdict {
            Verdict::Keep => kept.push(event),
            Verdict::Repair(start, end) => {
                debug!(
                    from_start = %event.start(),
                    from_end = %event.end(),
                    to_start = %start,
                    to_end = %end,
                    "Repaired time range"
                );
                event.set_range(start, end);
                outcome.repaired += 1;
                kept.push(event);
            }
            Verdict::Drop(err) => {
                warn!(error = %err, "Dropping event with unusable time range");
                outcome.dropped += 1;
            }
        }
    }

    (kept, outcome)
}

enum Verdict {
    Keep,
    Repair(String, String),
    Drop(ValidationError),
}

/// Swap a reversed range; stretch a zero-length one by a second.
fn repair(start: &str, end: &str, s: Timestamp, e: Timestamp) -> Option<(String, String)> {
    if e.chronological_cmp(&s) == Ordering::Less {
        Some((end.to_string(), start.to_string()))
    } else {
        Some((start.to_string(), s.plus_one_second()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::{Event, EventTime};

    fn time(start: &str, end: &str) -> EventTime {
        EventTime::new(start, end)
    }

    #[test]
    fn test_accepted_formats() {
        for (start, end) in [
            ("2025-04-20T14:00:00", "2025-04-20T15:00:00"),
            ("2025-04-20T14:00", "2025-04-20T15:00"),
            ("2025-04-20T14:00:00.250", "2025-04-20T14:00:00.500"),
            ("2025-04-20T14:00:00-04:00", "2025-04-20T15:00:00-04:00"),
            ("2025-04-20T18:00:00Z", "2025-04-20T19:00:00Z"),
        ] {
            assert_eq!(validate_range(start, end), Ok(()), "{start} .. {end}");
        }
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            validate_range("", "2025-04-20T15:00:00"),
            Err(ValidationError::MissingTimestamp { field: "start" })
        );
        assert_eq!(
            validate_range("2025-04-20T15:00:00", "tomorrow"),
            Err(ValidationError::InvalidTimestamp {
                field: "end",
                value: "tomorrow".into()
            })
        );
        assert!(matches!(
            validate_range("2025-04-20T15:00:00", "2025-04-20T15:00:00"),
            Err(ValidationError::NotChronological { .. })
        ));
    }

    #[test]
    fn test_repair_swaps_reversed_range() {
        let (events, outcome) = apply_time_policy(
            vec![time("2025-04-20T15:00:00", "2025-04-20T14:00:00")],
            TimeRangePolicy::Repair,
        );

        assert_eq!(events, vec![time("2025-04-20T14:00:00", "2025-04-20T15:00:00")]);
        assert_eq!(outcome, PolicyOutcome { dropped: 0, repaired: 1 });
    }

    #[test]
    fn test_repair_extends_zero_length_range() {
        let (events, _) = apply_time_policy(
            vec![
                time("2025-04-20T14:00:00", "2025-04-20T14:00:00"),
                time("2025-04-20T23:59", "2025-04-20T23:59"),
                time("2025-04-20T14:00:00-04:00", "2025-04-20T14:00:00-04:00"),
                time("2025-04-20T14:00:00Z", "2025-04-20T14:00:00Z"),
            ],
            TimeRangePolicy::Repair,
        );

        let ends: Vec<&str> = events.iter().map(|e| e.end.as_str()).collect();
        assert_eq!(
            ends,
            vec![
                "2025-04-20T14:00:01",
                "2025-04-20T23:59:01",
                "2025-04-20T14:00:01-04:00",
                "2025-04-20T14:00:01Z",
            ]
        );
    }

    #[test]
    fn test_drop_policy_removes_bad_ranges() {
        let good = time("2025-04-20T14:00:00", "2025-04-20T15:00:00");
        let (events, outcome) = apply_time_policy(
            vec![
                time("2025-04-20T15:00:00", "2025-04-20T14:00:00"),
                good.clone(),
                time("2025-04-20T14:00:00", "2025-04-20T14:00:00"),
            ],
            TimeRangePolicy::Drop,
        );

        assert_eq!(events, vec![good]);
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn test_pass_through_keeps_all_but_empty() {
        let (events, outcome) = apply_time_policy(
            vec![
                time("2025-04-20T15:00:00", "2025-04-20T14:00:00"),
                time("next week", "2025-04-20T14:00:00"),
                time("2025-04-20T15:00:00", " "),
            ],
            TimeRangePolicy::PassThrough,
        );

        assert_eq!(events.len(), 2);
        assert_eq!(outcome, PolicyOutcome { dropped: 1, repaired: 0 });
    }

    #[test]
    fn test_unparseable_dropped_under_repair() {
        let (events, outcome) = apply_time_policy(
            vec![Event::new("soon", "2025-04-20T14:00:00").with_title("x")],
            TimeRangePolicy::Repair,
        );

        assert!(events.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_pass_through_drops_empty_end_behind_bad_start() {
        let (events, outcome) = apply_time_policy(
            vec![time("soon", ""), time("", "later")],
            TimeRangePolicy::PassThrough,
        );

        assert!(events.is_empty());
        assert_eq!(outcome.dropped, 2);
        assert_eq!(
            validate_range("soon", ""),
            Err(ValidationError::MissingTimestamp { field: "end" })
        );
    }

    #[test]
    fn test_repair_at_calendar_edge_drops_instead_of_panicking() {
        let edge = "+262142-12-31T23:59:59";
        let (events, outcome) =
            apply_time_policy(vec![time(edge, edge)], TimeRangePolicy::Repair);

        assert!(events.is_empty());
        assert_eq!(outcome, PolicyOutcome { dropped: 1, repaired: 0 });
    }

    #[test]
    fn test_offsets_compare_as_instants() {
        // 18:00Z vs 10:00Z
        let start = "2025-04-20T14:00:00-04:00";
        let end = "2025-04-20T15:00:00+05:00";
        assert!(matches!(
            validate_range(start, end),
            Err(ValidationError::NotChronological { .. })
        ));

        let (events, outcome) = apply_time_policy(vec![time(start, end)], TimeRangePolicy::Drop);
        assert!(events.is_empty());
        assert_eq!(outcome.dropped, 1);

        let (events, _) = apply_time_policy(vec![time(start, end)], TimeRangePolicy::Repair);
        assert_eq!(events, vec![time(end, start)]);

        // Same wall clock, different instants: 14:00Z is before 18:00Z
        assert_eq!(
            validate_range("2025-04-20T14:00:00Z", "2025-04-20T14:00:00-04:00"),
            Ok(())
        );
    }

    #[test]
    fn test_mixed_naive_and_offset_compare_wall_clock() {
        assert_eq!(
            validate_range("2025-04-20T14:00:00", "2025-04-20T15:00:00+05:00"),
            Ok(())
        );
    }
}
