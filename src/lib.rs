//! Appointment availability and slot suggestions.
//!
//! Candidate slots are generated inside business hours, filtered against a
//! snapshot of existing bookings, and thinned to a few well-spread picks. A
//! [`session::SchedulingSession`] tracks the date, time and duration a
//! scheduler is filling in. Suggestions are advisory: the booking store's
//! write path makes the final conflict decision.

pub mod config;
pub mod debounce;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod session;

pub use config::{ConfigError, EngineConfig};
pub use engine::{
    filter_available, generate_slots, select_suggestions, Advisory, BookingSource, ConflictMode,
    EngineError, InMemoryBookings, SuggestionEngine, Suggestions,
};
pub use model::{AvailabilityWindow, BookingRecord, ServiceDuration, SuggestionSet, TimeSlot};
pub use session::{
    BookingCommitter, SchedulingSession, SelectedSlot, SessionDriver, SessionError, SessionState,
    TimeInput,
};
