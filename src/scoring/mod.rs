//! Reduces a finished session to a [`ResultRecord`].

use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::models::{ResultRecord, Session};

/// Sortable and filesystem-safe: no `:` and zero-padded fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// Scores `session` stamped with the current local time.
pub fn summarize(session: Session) -> ResultRecord {
    summarize_at(session, Local::now().naive_local())
}

/// Pure scoring core.
pub fn summarize_at(session: Session, at: NaiveDateTime) -> ResultRecord {
    let total = session.len();
    let hits: Vec<u32> = session.hit_times().collect();
    let hit_count = hits.len();

    let (min_ms, max_ms, avg_ms) = if hits.is_empty() {
        (None, None, None)
    } else {
        let sum: u64 = hits.iter().map(|&ms| u64::from(ms)).sum();
        (
            hits.iter().copied().min(),
            hits.iter().copied().max(),
            Some(sum as f64 / hit_count as f64),
        )
    };

    let score = if total == 0 {
        0.0
    } else {
        hit_count as f64 / total as f64
    };

    ResultRecord {
        timestamp: format_timestamp(at),
        hit_count: count_u32(hit_count),
        miss_count: count_u32(total - hit_count),
        min_ms,
        max_ms,
        avg_ms,
        score,
    }
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Human-readable report of a session and its record.
pub struct SessionSummary<'a> {
    pub record: &'a ResultRecord,
    pub reaction_times: &'a [u32],
}

impl fmt::Display for SessionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        writeln!(
            f,
            "You missed the light {} / {} times",
            record.miss_count,
            record.trial_count()
        )?;
        writeln!(f, "Reaction times: {:?}", self.reaction_times)?;
        match (record.min_ms, record.max_ms, record.avg_ms) {
            (Some(min), Some(max), Some(avg)) => {
                writeln!(f, "Min response time: {min} ms")?;
                writeln!(f, "Max response time: {max} ms")?;
                writeln!(f, "Average response time: {avg:.1} ms")?;
            }
            _ => writeln!(f, "No responses recorded")?,
        }
        write!(f, "Score: {:.0}%", record.score * 100.0)
    }
}
