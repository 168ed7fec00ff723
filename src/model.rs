use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Build a wall-clock time from hour and minute, wrapping past midnight.
pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::minutes(i64::from(hour * 60 + minute))
}

/// Minutes elapsed since midnight.
pub fn minute_of_day(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight() / 60
}

/// Half-open interval `[start, end)` on the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn starting_at(date: NaiveDate, time: NaiveTime, minutes: u32) -> Self {
        let start = date.and_time(time);
        Self::new(start, start + TimeDelta::minutes(i64::from(minutes.max(1))))
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Canonical `(date, time)` key used to compare slots with bookings.
/// Ordering is date first, then time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    /// Seconds and sub-seconds are dropped so `9:00:59` and `9:00 AM` collide.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self { date, time }
    }
}

/// One bookable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            date,
            start_time,
            duration_minutes,
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.date, self.start_time)
    }

    pub fn span(&self) -> Span {
        Span::starting_at(self.date, self.start_time, self.duration_minutes)
    }

    pub fn with_duration(self, duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            ..self
        }
    }

    /// e.g. `"9:00 AM"`.
    pub fn canonical_time(&self) -> String {
        format_canonical_time(self.start_time)
    }
}

/// An existing appointment as reported by the booking store.
///
/// Every field is optional because the store hands over whatever it has;
/// a record missing its date or start time is skipped, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl BookingRecord {
    pub fn at(date: NaiveDate, start_time: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            start_time: Some(start_time.into()),
            duration_minutes: None,
        }
    }

    pub fn lasting(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Normalize to a [`SlotKey`]. `index` is the record's position in its
    /// snapshot and is only used for error reporting.
    pub fn key(&self, index: usize) -> Result<SlotKey, EngineError> {
        let date = self.date.ok_or(EngineError::MalformedBookingRecord {
            index,
            reason: "missing date",
        })?;
        let raw = self
            .start_time
            .as_deref()
            .ok_or(EngineError::MalformedBookingRecord {
                index,
                reason: "missing start time",
            })?;
        let time = parse_time_of_day(raw).ok_or(EngineError::MalformedBookingRecord {
            index,
            reason: "unparseable start time",
        })?;
        Ok(SlotKey::new(date, time))
    }
}

/// Daily bookable range and step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub granularity_minutes: u32,
}

impl Default for AvailabilityWindow {
    fn default() -> Self {
        Self {
            day_start: hm(9, 0),
            day_end: hm(17, 0),
            granularity_minutes: 30,
        }
    }
}

impl AvailabilityWindow {
    pub fn validate(&self) -> Result<(), EngineError> {
        use crate::limits::*;
        if self.day_start >= self.day_end {
            return Err(EngineError::InvalidWindow("day start must be before day end"));
        }
        let whole_minute = |t: NaiveTime| t.second() == 0 && t.nanosecond() == 0;
        if !whole_minute(self.day_start) || !whole_minute(self.day_end) {
            return Err(EngineError::InvalidWindow("day bounds must be whole minutes"));
        }
        if !(MIN_GRANULARITY_MINUTES..=MAX_GRANULARITY_MINUTES).contains(&self.granularity_minutes)
        {
            return Err(EngineError::InvalidWindow("granularity out of range"));
        }
        Ok(())
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.day_start <= t && t < self.day_end
    }

    /// True if `t` is reachable from `day_start` in whole granularity steps.
    pub fn is_on_grid(&self, t: NaiveTime) -> bool {
        let start = minute_of_day(self.day_start);
        let m = minute_of_day(t);
        self.granularity_minutes > 0 && m >= start && (m - start) % self.granularity_minutes == 0
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn starting_at(start: NaiveDate, days: u32) -> Self {
        let span = TimeDelta::days(i64::from(days.max(1) - 1));
        Self {
            start,
            end: start + span,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Ordered, bounded subset of available slots shown to the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet(Vec<TimeSlot>);

impl SuggestionSet {
    pub(crate) fn from_sorted(slots: Vec<TimeSlot>) -> Self {
        debug_assert!(slots.windows(2).all(|w| w[0].key() <= w[1].key()));
        Self(slots)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&TimeSlot> {
        self.0.get(index)
    }
}

// ── Time-of-day categories ───────────────────────────────────────

/// Fixed bands the selector spreads picks across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    /// `[9:00, 12:00)`
    Morning,
    /// `[13:00, 17:00)`
    Afternoon,
}

impl DayPart {
    pub fn of(t: NaiveTime) -> Option<DayPart> {
        if hm(9, 0) <= t && t < hm(12, 0) {
            Some(DayPart::Morning)
        } else if hm(13, 0) <= t && t < hm(17, 0) {
            Some(DayPart::Afternoon)
        } else {
            None
        }
    }
}

// ── Service durations ────────────────────────────────────────────

/// Appointment lengths offered by the service packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceDuration {
    Short,
    Standard,
    Extended,
    Full,
}

impl ServiceDuration {
    pub const ALL: [ServiceDuration; 4] = [
        ServiceDuration::Short,
        ServiceDuration::Standard,
        ServiceDuration::Extended,
        ServiceDuration::Full,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            ServiceDuration::Short => 45,
            ServiceDuration::Standard => 90,
            ServiceDuration::Extended => 135,
            ServiceDuration::Full => 180,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceDuration::Short => "45m",
            ServiceDuration::Standard => "1.5h",
            ServiceDuration::Extended => "2.25h",
            ServiceDuration::Full => "3h",
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<ServiceDuration> {
        Self::ALL.into_iter().find(|d| d.minutes() == minutes)
    }
}

// ── Canonical time strings ───────────────────────────────────────

pub fn format_canonical_time(t: NaiveTime) -> String {
    t.format("%-I:%M %p").to_string()
}

/// Lenient parse of a time-of-day: `"9:00 AM"`, `"9:00am"`, `"09:00"`, `"13:30:00"`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if compact.is_empty() {
        return None;
    }
    ["%I:%M%p", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&compact, fmt).ok())
}
