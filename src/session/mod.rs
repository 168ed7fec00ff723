mod driver;

pub use driver::{BookingCommitter, SessionDriver};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::engine::{Advisory, Suggestions};
use crate::limits::MAX_INPUT_LEN;
use crate::model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    DateChosen,
    SlotsLoading,
    SlotsReady,
    /// The booking query failed. Suggestions may still be present (unfiltered)
    /// and manual entry works as usual.
    SlotsFailed,
    Committed,
}

/// Contents of the time field: a suggestion click or whatever was typed.
/// Raw text is only parsed at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInput {
    Structured(NaiveTime),
    Raw(String),
}

impl TimeInput {
    pub fn resolve(&self) -> Result<NaiveTime, SessionError> {
        match self {
            TimeInput::Structured(t) => Ok(*t),
            TimeInput::Raw(text) if text.trim().is_empty() => Err(SessionError::MissingTime),
            TimeInput::Raw(text) if text.len() > MAX_INPUT_LEN => {
                Err(SessionError::InvalidTime(text.chars().take(MAX_INPUT_LEN).collect()))
            }
            TimeInput::Raw(text) => {
                parse_time_of_day(text).ok_or_else(|| SessionError::InvalidTime(text.clone()))
            }
        }
    }

    /// What the field displays.
    pub fn display(&self) -> String {
        match self {
            TimeInput::Structured(t) => format_canonical_time(*t),
            TimeInput::Raw(text) => text.clone(),
        }
    }
}

/// The finalized triple handed to the booking-commit collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSlot {
    pub date: NaiveDate,
    /// Canonical form, e.g. `"9:00 AM"`.
    pub time: String,
    pub duration_minutes: u32,
}

/// Identifies one suggestion computation. Results for a ticket that is no
/// longer current are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    AlreadyCommitted,
    /// A commit is with the collaborator; fields are frozen until it answers.
    CommitInProgress,
    MissingDate,
    MissingTime,
    InvalidTime(String),
    MissingDuration,
    UnknownDuration(u32),
    UnknownSuggestion(usize),
    /// The commit collaborator refused the booking.
    Rejected(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::AlreadyCommitted => write!(f, "session already committed"),
            SessionError::CommitInProgress => write!(f, "commit already in progress"),
            SessionError::MissingDate => write!(f, "no date selected"),
            SessionError::MissingTime => write!(f, "no time entered"),
            SessionError::InvalidTime(t) => write!(f, "not a valid time: {t:?}"),
            SessionError::MissingDuration => write!(f, "no duration selected"),
            SessionError::UnknownDuration(m) => write!(f, "{m} minutes is not an offered duration"),
            SessionError::UnknownSuggestion(i) => write!(f, "no suggestion at position {i}"),
            SessionError::Rejected(reason) => write!(f, "booking rejected: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Per-session scheduling state: date, time field, duration, and the latest
/// suggestions. Purely local; the host serializes access.
#[derive(Debug, Clone)]
pub struct SchedulingSession {
    state: SessionState,
    date: Option<NaiveDate>,
    time: Option<TimeInput>,
    duration: Option<ServiceDuration>,
    generation: u64,
    committing: bool,
    suggestions: SuggestionSet,
    advisory: Option<Advisory>,
}

impl Default for SchedulingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            date: None,
            time: None,
            duration: None,
            generation: 0,
            committing: false,
            suggestions: SuggestionSet::default(),
            advisory: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<&TimeInput> {
        self.time.as_ref()
    }

    pub fn duration(&self) -> Option<ServiceDuration> {
        self.duration
    }

    pub fn suggestions(&self) -> &SuggestionSet {
        &self.suggestions
    }

    pub fn advisory(&self) -> Option<Advisory> {
        self.advisory
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Committed {
            return Err(SessionError::AlreadyCommitted);
        }
        if self.committing {
            return Err(SessionError::CommitInProgress);
        }
        Ok(())
    }

    // ── Date and suggestions ─────────────────────────────

    /// Set the date and invalidate any in-flight computation. The caller
    /// runs the computation for the returned ticket.
    pub fn choose_date(&mut self, date: NaiveDate) -> Result<RefreshTicket, SessionError> {
        self.ensure_open()?;
        self.generation += 1;
        self.date = Some(date);
        self.suggestions = SuggestionSet::default();
        self.advisory = None;
        self.state = SessionState::DateChosen;
        Ok(RefreshTicket {
            generation: self.generation,
            date,
        })
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        self.state != SessionState::Committed && ticket.generation == self.generation
    }

    /// Move to `SlotsLoading`. False if the ticket is stale.
    pub fn begin_loading(&mut self, ticket: &RefreshTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = SessionState::SlotsLoading;
        true
    }

    /// Install computed suggestions. Returns false, changing nothing, when a
    /// newer date was chosen after `ticket` was issued.
    pub fn apply_suggestions(&mut self, ticket: &RefreshTicket, outcome: Suggestions) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = match outcome.advisory {
            Some(_) => SessionState::SlotsFailed,
            None => SessionState::SlotsReady,
        };
        self.suggestions = outcome.set;
        self.advisory = outcome.advisory;
        true
    }

    // ── Field edits ──────────────────────────────────────

    /// Suggestion click: fills the date and time fields from the slot.
    /// Does not start a new computation.
    pub fn pick_suggestion(&mut self, index: usize) -> Result<TimeSlot, SessionError> {
        self.ensure_open()?;
        let slot = *self
            .suggestions
            .get(index)
            .ok_or(SessionError::UnknownSuggestion(index))?;
        self.date = Some(slot.date);
        self.time = Some(TimeInput::Structured(slot.start_time));
        Ok(slot)
    }

    /// Manual typing in the time field. Accepted verbatim.
    pub fn edit_time(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.time = Some(TimeInput::Raw(text.into()));
        Ok(())
    }

    pub fn set_duration(&mut self, duration: ServiceDuration) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.duration = Some(duration);
        Ok(())
    }

    pub fn set_duration_minutes(&mut self, minutes: u32) -> Result<(), SessionError> {
        let duration = ServiceDuration::from_minutes(minutes).ok_or(SessionError::UnknownDuration(minutes))?;
        self.set_duration(duration)
    }

    // ── Commit ───────────────────────────────────────────

    /// Validate the fields into the triple that would be committed.
    pub fn selection(&self) -> Result<SelectedSlot, SessionError> {
        self.ensure_open()?;
        let date = self.date.ok_or(SessionError::MissingDate)?;
        let time = self.time.as_ref().ok_or(SessionError::MissingTime)?.resolve()?;
        let duration = self.duration.ok_or(SessionError::MissingDuration)?;
        Ok(SelectedSlot {
            date,
            time: format_canonical_time(time),
            duration_minutes: duration.minutes(),
        })
    }

    /// Validate the fields and freeze them while an external collaborator
    /// decides. Every edit and any second commit fail with
    /// [`SessionError::CommitInProgress`] until [`finish_commit`] runs.
    ///
    /// [`finish_commit`]: Self::finish_commit
    pub fn begin_commit(&mut self) -> Result<SelectedSlot, SessionError> {
        let slot = self.selection()?;
        self.committing = true;
        Ok(slot)
    }

    /// Close the session if the collaborator accepted, otherwise reopen it
    /// for edits.
    pub fn finish_commit(&mut self, accepted: bool) {
        self.committing = false;
        if accepted {
            self.state = SessionState::Committed;
        }
    }

    /// Validate and close the session without an external collaborator.
    pub fn commit(&mut self) -> Result<SelectedSlot, SessionError> {
        let slot = self.begin_commit()?;
        self.finish_commit(true);
        Ok(slot)
    }
}

/// Lenient parse for typed dates: `2026-03-02` or `3/2/2026`.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_INPUT_LEN {
        return None;
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
