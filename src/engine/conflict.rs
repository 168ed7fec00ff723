use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::*;

/// How a candidate slot is judged to clash with an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictMode {
    /// Only identical `(date, start time)` pairs conflict. Back-to-back and
    /// partially overlapping appointments are allowed through.
    #[default]
    ExactStart,
    /// Half-open `[start, start + duration)` spans conflict when they overlap.
    Overlap,
}

/// Drop every slot that collides with a booking, comparing exact start times.
///
/// `None` means the snapshot could not be fetched: the filter fails open and
/// returns every candidate. Malformed records are skipped one by one.
pub fn filter_available(slots: Vec<TimeSlot>, bookings: Option<&[BookingRecord]>) -> Vec<TimeSlot> {
    filter_available_with(
        slots,
        bookings,
        ConflictMode::ExactStart,
        &AvailabilityWindow::default(),
    )
}

/// [`filter_available`] with an explicit conflict mode. In overlap mode a
/// booking without a duration is assumed to last one window step.
pub fn filter_available_with(
    mut slots: Vec<TimeSlot>,
    bookings: Option<&[BookingRecord]>,
    mode: ConflictMode,
    window: &AvailabilityWindow,
) -> Vec<TimeSlot> {
    let Some(bookings) = bookings else {
        tracing::warn!(
            candidates = slots.len(),
            "booking snapshot unavailable, passing candidates through unfiltered"
        );
        return slots;
    };

    match mode {
        ConflictMode::ExactStart => {
            let booked: HashSet<SlotKey> = normalize_bookings(bookings).map(|(key, _)| key).collect();
            slots.retain(|s| !booked.contains(&s.key()));
        }
        ConflictMode::Overlap => {
            let mut busy: Vec<Span> = normalize_bookings(bookings)
                .map(|(key, minutes)| {
                    Span::starting_at(
                        key.date,
                        key.time,
                        minutes.unwrap_or(window.granularity_minutes),
                    )
                })
                .collect();
            busy.sort_by_key(|s| s.start);
            let busy = merge_overlapping(&busy);
            slots.retain(|s| !overlaps_any(&busy, &s.span()));
        }
    }
    slots
}

/// Canonical keys (plus declared duration) for every well-formed record.
fn normalize_bookings(bookings: &[BookingRecord]) -> impl Iterator<Item = (SlotKey, Option<u32>)> + '_ {
    bookings
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record.key(index) {
            Ok(key) => Some((key, record.duration_minutes)),
            Err(e) => {
                tracing::warn!("skipping booking: {e}");
                metrics::counter!(crate::observability::MALFORMED_BOOKINGS_TOTAL).increment(1);
                None
            }
        })
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        merged.push(span);
    }
    merged
}

/// `busy` must be sorted and disjoint.
fn overlaps_any(busy: &[Span], span: &Span) -> bool {
    // Everything at index >= right_bound starts at or after span.end.
    let right_bound = busy.partition_point(|b| b.start < span.end);
    busy[..right_bound].iter().rev().take(1).any(|b| b.overlaps(span))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::engine::availability::generate_slots;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn candidates() -> Vec<TimeSlot> {
        generate_slots(Some(monday()), 1, &AvailabilityWindow::default())
    }

    fn times(slots: &[TimeSlot]) -> Vec<chrono::NaiveTime> {
        slots.iter().map(|s| s.start_time).collect()
    }

    #[test]
    fn exact_match_removed() {
        let bookings = vec![BookingRecord::at(monday(), "9:00 AM")];
        let free = filter_available(candidates(), Some(bookings.as_slice()));
        assert_eq!(free.len(), 15);
        assert_eq!(free[0].start_time, hm(9, 30));
    }

    #[test]
    fn booking_formats_normalize_to_same_key() {
        let bookings = vec![
            BookingRecord::at(monday(), "09:00"),
            BookingRecord::at(monday(), "1:30 pm"),
            BookingRecord::at(monday(), "15:00:00"),
        ];
        let free = filter_available(candidates(), Some(bookings.as_slice()));
        let t = times(&free);
        assert!(!t.contains(&hm(9, 0)));
        assert!(!t.contains(&hm(13, 30)));
        assert!(!t.contains(&hm(15, 0)));
        assert_eq!(free.len(), 13);
    }

    #[test]
    fn exact_mode_ignores_partial_overlap() {
        // A 90-minute booking at 9:15 does not share a start time with any slot.
        let bookings = vec![BookingRecord::at(monday(), "9:15 AM").lasting(90)];
        let free = filter_available(candidates(), Some(bookings.as_slice()));
        assert_eq!(free.len(), 16);
    }

    #[test]
    fn other_dates_untouched() {
        let tuesday = monday().succ_opt().unwrap();
        let bookings = vec![BookingRecord::at(tuesday, "9:00 AM")];
        let free = filter_available(candidates(), Some(bookings.as_slice()));
        assert_eq!(free.len(), 16);
    }

    #[test]
    fn unavailable_snapshot_fails_open() {
        let free = filter_available(candidates(), None);
        assert_eq!(free, candidates());
    }

    #[test]
    fn malformed_records_skipped_rest_applied() {
        let bookings = vec![
            BookingRecord {
                date: None,
                start_time: Some("10:00 AM".into()),
                duration_minutes: None,
            },
            BookingRecord::at(monday(), "whenever"),
            BookingRecord::at(monday(), "11:00 AM"),
        ];
        let free = filter_available(candidates(), Some(bookings.as_slice()));
        let t = times(&free);
        assert!(t.contains(&hm(10, 0)));
        assert!(!t.contains(&hm(11, 0)));
        assert_eq!(free.len(), 15);
    }

    #[test]
    fn overlap_mode_blocks_covered_slots() {
        let bookings = vec![BookingRecord::at(monday(), "9:15 AM").lasting(90)];
        let free = filter_available_with(
            candidates(),
            Some(bookings.as_slice()),
            ConflictMode::Overlap,
            &AvailabilityWindow::default(),
        );
        // [9:15, 10:45) knocks out 9:00, 9:30, 10:00 and 10:30.
        let t = times(&free);
        assert_eq!(t[0], hm(11, 0));
        assert_eq!(free.len(), 12);
    }

    #[test]
    fn overlap_mode_allows_back_to_back() {
        let bookings = vec![BookingRecord::at(monday(), "10:00 AM").lasting(60)];
        let free = filter_available_with(
            candidates(),
            Some(bookings.as_slice()),
            ConflictMode::Overlap,
            &AvailabilityWindow::default(),
        );
        let t = times(&free);
        assert!(t.contains(&hm(9, 30)));
        assert!(!t.contains(&hm(10, 0)));
        assert!(!t.contains(&hm(10, 30)));
        assert!(t.contains(&hm(11, 0)));
    }

    #[test]
    fn overlap_mode_uses_slot_duration() {
        // 90-minute candidates at 9:00 and 9:30 run into the 10:00 booking.
        let slots: Vec<TimeSlot> = candidates().into_iter().map(|s| s.with_duration(90)).collect();
        let bookings = vec![BookingRecord::at(monday(), "10:00 AM")];
        let free = filter_available_with(
            slots,
            Some(bookings.as_slice()),
            ConflictMode::Overlap,
            &AvailabilityWindow::default(),
        );
        let t = times(&free);
        assert!(!t.contains(&hm(9, 0)));
        assert!(!t.contains(&hm(9, 30)));
        assert!(t.contains(&hm(10, 30)));
    }

    #[test]
    fn merge_overlapping_adjacent() {
        let day = monday();
        let spans = vec![
            Span::starting_at(day, hm(9, 0), 60),
            Span::starting_at(day, hm(10, 0), 30),
            Span::starting_at(day, hm(12, 0), 30),
        ];
        let merged = merge_overlapping(&spans);
        assert_eq!(
            merged,
            vec![
                Span::starting_at(day, hm(9, 0), 90),
                Span::starting_at(day, hm(12, 0), 30),
            ]
        );
    }
}
