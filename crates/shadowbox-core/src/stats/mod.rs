//! Completed-workout log and streaks.
//!
//! The log is a set of calendar dates stored under a single key as a JSON
//! array of `YYYY-MM-DD` strings. A date is recorded at most once.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::PersistenceStore;

pub const COMPLETION_LOG_KEY: &str = "completion_log";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionLog {
    dates: BTreeSet<NaiveDate>,
}

/// Summary shown by front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_workouts: usize,
    pub last_workout: Option<NaiveDate>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the log from `store`. Unreadable data yields an empty log and a
    /// warning; malformed entries are skipped.
    pub fn load(store: &dyn PersistenceStore) -> Self {
        let raw = match store.get(COMPLETION_LOG_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read completion log");
                return Self::default();
            }
        };
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Self {
        let entries: Vec<String> = match serde_json::from_str(raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "completion log is not a JSON array of strings");
                return Self::default();
            }
        };
        let dates = entries
            .iter()
            .filter_map(|s| match NaiveDate::parse_from_str(s, DATE_FORMAT) {
                Ok(d) => Some(d),
                Err(_) => {
                    tracing::warn!(entry = %s, "skipping malformed completion date");
                    None
                }
            })
            .collect();
        Self { dates }
    }

    pub fn to_json(&self) -> String {
        let entries: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        serde_json::Value::from(entries).to_string()
    }

    pub fn save(&self, store: &mut dyn PersistenceStore) -> Result<()> {
        store.set(COMPLETION_LOG_KEY, &self.to_json())?;
        Ok(())
    }

    /// Add `date`. Returns `false` if it was already logged.
    pub fn record(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn total_workouts(&self) -> usize {
        self.dates.len()
    }

    pub fn last_workout(&self) -> Option<NaiveDate> {
        self.dates.iter().next_back().copied()
    }

    /// Consecutive logged days ending today, or yesterday if today has no
    /// workout yet.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let yesterday = today - Duration::days(1);
        let mut day = if self.contains(today) {
            today
        } else if self.contains(yesterday) {
            yesterday
        } else {
            return 0;
        };
        let mut streak = 0;
        while self.contains(day) {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }

    pub fn longest_streak(&self) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;
        for &date in &self.dates {
            run = match previous {
                Some(p) if date - p == Duration::days(1) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(date);
        }
        longest
    }

    pub fn stats(&self, today: NaiveDate) -> CompletionStats {
        CompletionStats {
            current_streak: self.current_streak(today),
            longest_streak: self.longest_streak(),
            total_workouts: self.total_workouts(),
            last_workout: self.last_workout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn record_is_append_only_and_deduplicated() {
        let mut log = CompletionLog::new();
        assert!(log.record(d("2026-10-14")));
        assert!(!log.record(d("2026-10-14")));
        assert_eq!(log.total_workouts(), 1);
    }

    #[test]
    fn streak_counts_from_today_or_yesterday() {
        let mut log = CompletionLog::new();
        for s in ["2026-10-12", "2026-10-13", "2026-10-14", "2026-10-15"] {
            log.record(d(s));
        }
        assert_eq!(log.current_streak(d("2026-10-15")), 4);
        assert_eq!(log.current_streak(d("2026-10-16")), 4);
        assert_eq!(log.current_streak(d("2026-10-17")), 0);
        log.record(d("2026-10-16"));
        assert_eq!(log.current_streak(d("2026-10-16")), 5);
    }

    #[test]
    fn longest_streak_spans_gaps() {
        let mut log = CompletionLog::new();
        for s in ["2026-01-01", "2026-01-02", "2026-01-03", "2026-02-10", "2026-02-11"] {
            log.record(d(s));
        }
        assert_eq!(log.longest_streak(), 3);
        assert_eq!(log.last_workout(), Some(d("2026-02-11")));
    }

    #[test]
    fn persists_as_sorted_date_strings() {
        let mut store = MemoryStore::new();
        let mut log = CompletionLog::new();
        log.record(d("2026-10-16"));
        log.record(d("2026-10-02"));
        log.save(&mut store).unwrap();
        assert_eq!(
            store.get(COMPLETION_LOG_KEY).unwrap().as_deref(),
            Some(r#"["2026-10-02","2026-10-16"]"#)
        );
        assert_eq!(CompletionLog::load(&store), log);
    }

    #[test]
    fn malformed_data_is_tolerated() {
        assert_eq!(CompletionLog::from_json("not json").total_workouts(), 0);
        let log = CompletionLog::from_json(r#"["2026-10-16","yesterday"]"#);
        assert_eq!(log.total_workouts(), 1);
    }
}
