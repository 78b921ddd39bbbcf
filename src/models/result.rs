//! Scored summary of a session, the unit that gets persisted and synced.

use serde::{Deserialize, Serialize};

/// Prefix shared by local backup filenames and remote session keys.
pub const SESSION_KEY_PREFIX: &str = "score-";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// Local wall-clock time, `%Y-%m-%dT%H_%M_%S`, no offset.
    pub timestamp: String,
    pub hit_count: u32,
    pub miss_count: u32,
    /// `None` when there were no hits; never defaulted to zero.
    pub min_ms: Option<u32>,
    pub max_ms: Option<u32>,
    pub avg_ms: Option<f64>,
    /// Fraction of trials that were hits, in `[0, 1]`.
    pub score: f64,
}

impl ResultRecord {
    pub fn trial_count(&self) -> u32 {
        self.hit_count + self.miss_count
    }

    /// Key under which this record is stored locally and remotely.
    pub fn session_key(&self) -> String {
        format!("{SESSION_KEY_PREFIX}{}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_stats_serialize_as_null() {
        let record = ResultRecord {
            timestamp: "2026-10-19T09_05_03".into(),
            hit_count: 0,
            miss_count: 3,
            min_ms: None,
            max_ms: None,
            avg_ms: None,
            score: 0.0,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["min_ms"].is_null());
        assert!(json["avg_ms"].is_null());
        assert_eq!(record.session_key(), "score-2026-10-19T09_05_03");
        assert_eq!(record.trial_count(), 3);
    }
}
