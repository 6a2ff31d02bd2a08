//! Wall-clock sources.
//!
//! Everything time-related in the core reads "now" through [`Clock`] so that
//! tests can step time by hand instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and hand another to a controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert epoch milliseconds to a UTC timestamp for event payloads.
pub fn to_datetime(ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Local calendar date of an epoch-millisecond instant.
pub fn local_date(ms: u64) -> NaiveDate {
    to_datetime(ms).with_timezone(&Local).date_naive()
}

/// Format milliseconds as `MM:SS`, rounding partial seconds up so a countdown
/// shows `00:01` until it actually reaches zero.
pub fn format_mm_ss(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Format milliseconds as `MM:SS`, truncating partial seconds (count-up style).
pub fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 1_250);
        other.set(5_000);
        assert_eq!(clock.now_ms(), 5_000);
    }

    #[test]
    fn countdown_format_rounds_up() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(1), "00:01");
        assert_eq!(format_mm_ss(9_990), "00:10");
        assert_eq!(format_mm_ss(180_000), "03:00");
        assert_eq!(format_mm_ss(179_001), "03:00");
    }

    #[test]
    fn elapsed_format_truncates() {
        assert_eq!(format_elapsed(999), "00:00");
        assert_eq!(format_elapsed(61_500), "01:01");
    }
}
