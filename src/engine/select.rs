use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::*;

// ── Distribution heuristic ────────────────────────────────────────

/// Pick a small spread of slots: the first `days` dates that have anything
/// free, and per date the earliest morning and earliest afternoon slot.
///
/// A date with no morning or afternoon candidate falls back to its first
/// `per_day` slots. Never more than `per_day` picks per date, and sparse
/// availability simply yields fewer entries.
pub fn select_suggestions(available: &[TimeSlot], days: usize, per_day: usize) -> SuggestionSet {
    if days == 0 || per_day == 0 {
        return SuggestionSet::default();
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();
    for slot in available {
        by_date.entry(slot.date).or_default().push(*slot);
    }

    let mut picks = Vec::with_capacity(days.saturating_mul(per_day).min(available.len()));
    for (_, mut slots) in by_date.into_iter().take(days) {
        slots.sort();
        slots.dedup_by_key(|s| s.key());
        picks.extend(pick_for_day(&slots, per_day));
    }
    SuggestionSet::from_sorted(picks)
}

/// `slots` is one date's availability, sorted by time.
fn pick_for_day(slots: &[TimeSlot], per_day: usize) -> Vec<TimeSlot> {
    let earliest = |part: DayPart| slots.iter().find(|s| DayPart::of(s.start_time) == Some(part));

    let spread: Vec<TimeSlot> = [DayPart::Morning, DayPart::Afternoon]
        .into_iter()
        .filter_map(earliest)
        .copied()
        .collect();

    let mut picks = if spread.is_empty() {
        slots.iter().take(per_day).copied().collect()
    } else {
        spread
    };
    picks.truncate(per_day);
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::availability::generate_slots;
    use crate::engine::conflict::filter_available;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        monday() + chrono::Days::new(offset)
    }

    fn slot(date: NaiveDate, h: u32, m: u32) -> TimeSlot {
        TimeSlot::new(date, hm(h, m), 30)
    }

    fn week() -> Vec<TimeSlot> {
        generate_slots(Some(monday()), 7, &AvailabilityWindow::default())
    }

    #[test]
    fn empty_input_empty_set() {
        let set = select_suggestions(&[], 3, 2);
        assert!(set.is_empty());
    }

    #[test]
    fn oversized_bounds_do_not_overflow() {
        assert!(select_suggestions(&[], usize::MAX, 2).is_empty());
        let set = select_suggestions(&week(), usize::MAX, usize::MAX);
        assert_eq!(set.len(), 14);
    }

    #[test]
    fn zero_bounds_empty_set() {
        assert!(select_suggestions(&week(), 0, 2).is_empty());
        assert!(select_suggestions(&week(), 3, 0).is_empty());
    }

    #[test]
    fn open_week_morning_and_afternoon_for_three_days() {
        let set = select_suggestions(&week(), 3, 2);
        let expected = vec![
            slot(day(0), 9, 0),
            slot(day(0), 13, 0),
            slot(day(1), 9, 0),
            slot(day(1), 13, 0),
            slot(day(2), 9, 0),
            slot(day(2), 13, 0),
        ];
        assert_eq!(set.slots(), expected.as_slice());
    }

    #[test]
    fn monday_nine_booked_moves_to_nine_thirty() {
        let bookings = vec![BookingRecord::at(monday(), "9:00 AM")];
        let free = filter_available(week(), Some(bookings.as_slice()));
        let set = select_suggestions(&free, 3, 2);
        assert_eq!(set.get(0), Some(&slot(day(0), 9, 30)));
        assert_eq!(set.get(1), Some(&slot(day(0), 13, 0)));
        assert_eq!(set.get(2), Some(&slot(day(1), 9, 0)));
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn monday_morning_fully_booked_keeps_afternoon_only() {
        let bookings: Vec<BookingRecord> = ["9:00 AM", "9:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM"]
            .into_iter()
            .map(|t| BookingRecord::at(monday(), t))
            .collect();
        let free = filter_available(week(), Some(bookings.as_slice()));
        let set = select_suggestions(&free, 3, 2);
        assert_eq!(set.len(), 5);
        assert_eq!(set.get(0), Some(&slot(day(0), 13, 0)));
        assert_eq!(set.get(1), Some(&slot(day(1), 9, 0)));
    }

    #[test]
    fn fully_booked_day_is_skipped() {
        let free: Vec<TimeSlot> = week().into_iter().filter(|s| s.date != monday()).collect();
        let set = select_suggestions(&free, 3, 2);
        let dates: Vec<NaiveDate> = set.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(1), day(1), day(2), day(2), day(3), day(3)]);
    }

    #[test]
    fn only_lunch_gap_falls_back_to_first_slots() {
        let free = vec![slot(monday(), 12, 0), slot(monday(), 12, 30)];
        let set = select_suggestions(&free, 3, 2);
        assert_eq!(set.slots(), free.as_slice());
    }

    #[test]
    fn fallback_honours_per_day() {
        let free = vec![
            slot(monday(), 7, 0),
            slot(monday(), 7, 30),
            slot(monday(), 8, 0),
        ];
        let set = select_suggestions(&free, 3, 2);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(&slot(monday(), 7, 30)));
    }

    #[test]
    fn per_day_one_keeps_morning() {
        let set = select_suggestions(&week(), 2, 1);
        assert_eq!(set.slots(), &[slot(day(0), 9, 0), slot(day(1), 9, 0)]);
    }

    #[test]
    fn unsorted_input_still_ordered() {
        let mut free = week();
        free.reverse();
        let set = select_suggestions(&free, 3, 2);
        assert_eq!(set, select_suggestions(&week(), 3, 2));
    }

    #[test]
    fn idempotent() {
        let free = week();
        assert_eq!(select_suggestions(&free, 3, 2), select_suggestions(&free, 3, 2));
    }
}
