use chrono::{NaiveDate, NaiveTime, TimeDelta, Timelike};

use crate::model::*;

// ── Candidate generation ──────────────────────────────────────────

/// Every candidate slot for `window_days` consecutive days from `base_date`,
/// stepping by the window's granularity from `day_start` up to (excluding)
/// `day_end`. Output is ordered by date, then time.
///
/// No base date means nothing to suggest yet; that is not an error.
pub fn generate_slots(
    base_date: Option<NaiveDate>,
    window_days: u32,
    window: &AvailabilityWindow,
) -> Vec<TimeSlot> {
    let Some(base) = base_date else {
        return Vec::new();
    };
    if window.granularity_minutes == 0 || window.day_start >= window.day_end {
        return Vec::new();
    }

    let step = window.granularity_minutes;
    let first = first_whole_minute(window.day_start);
    let last = minute_of_day(window.day_end);
    if first >= last {
        return Vec::new();
    }
    let per_day = ((last - first).div_ceil(step)) as usize;
    let days = window_days.min(crate::limits::MAX_WINDOW_DAYS) as usize;

    let mut slots = Vec::with_capacity(per_day * days);
    for offset in 0..window_days {
        let Some(date) = base.checked_add_signed(TimeDelta::days(i64::from(offset))) else {
            break;
        };
        for minute in (first..last).step_by(step as usize) {
            slots.push(TimeSlot::new(date, hm(0, minute), step));
        }
    }
    slots
}

/// Minute of day of the first whole minute at or after `t`.
fn first_whole_minute(t: NaiveTime) -> u32 {
    let partial = t.second() != 0 || t.nanosecond() != 0;
    minute_of_day(t) + u32::from(partial)
}
