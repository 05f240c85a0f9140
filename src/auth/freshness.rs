//! Time-window freshness check for claimed request timestamps.
//!
//! A claim is fresh when its timestamp lies within `[now - window, now + window]`.
//! Both bounds are inclusive, and timestamps in the future are held to the
//! same window as timestamps in the past.
//!
//! ## Limitation
//! This is the only replay defence: no nonce is remembered, so a captured
//! credential can be replayed for as long as its timestamp stays in the window.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Utc};
use std::time::Duration;

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Expired,
}

/// Pure window check, configured once at construction.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessChecker {
    window: ChronoDuration,
}

impl FreshnessChecker {
    pub fn new(window: Duration) -> Self {
        Self {
            window: ChronoDuration::from_std(window).unwrap_or(ChronoDuration::MAX),
        }
    }

    pub fn from_secs(window_secs: u64) -> Self {
        Self::new(Duration::from_secs(window_secs))
    }

    /// Check a claimed timestamp against the wall clock.
    pub fn check(&self, claimed: &str) -> Freshness {
        self.check_at(claimed, Utc::now())
    }

    /// Check a claimed timestamp against an explicit `now`.
    ///
    /// Unparseable timestamps are `Expired`.
    pub fn check_at(&self, claimed: &str, now: DateTime<Utc>) -> Freshness {
        let Some(instant) = parse_timestamp(claimed) else {
            return Freshness::Expired;
        };
        // A window wider than the representable range saturates at its ends.
        let from = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = now
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if instant < from || instant > to {
            Freshness::Expired
        } else {
            Freshness::Fresh
        }
    }
}

/// Parse a claimed timestamp into a UTC instant.
///
/// Accepts RFC 3339, RFC 2822, ISO-8601 without an offset (read as UTC),
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
