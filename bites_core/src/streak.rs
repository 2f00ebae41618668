//! Day-based streak statistics.
//!
//! Pure functions over a subject's distinct logged dates. The current
//! streak is anchored at today (or yesterday, if today has no entry yet);
//! the longest streak is a scan for the longest run of day-over-day
//! increments.

use crate::types::StreakData;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Compute streak statistics from a subject's logged dates.
///
/// `dates` may contain duplicates and be in any order.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> StreakData {
    let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    if unique.is_empty() {
        return StreakData {
            current: 0,
            longest: 0,
            last_active_date: None,
            is_active_today: false,
        };
    }

    let last_active = *unique.iter().next_back().unwrap_or(&today);
    let is_active_today = last_active == today;

    let yesterday = today - Duration::days(1);
    let mut current = 0u32;
    if last_active == today || last_active == yesterday {
        // Walk backward from the anchor day counting consecutive entries
        let mut check = last_active;
        while unique.contains(&check) {
            current += 1;
            check -= Duration::days(1);
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &date in &unique {
        run = match prev {
            Some(p) if (date - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    StreakData {
        current,
        longest,
        last_active_date: Some(last_active),
        is_active_today,
    }
}
