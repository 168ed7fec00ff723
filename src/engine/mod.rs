mod availability;
mod conflict;
mod error;
mod select;
mod store;

pub use availability::generate_slots;
pub use conflict::{filter_available, filter_available_with, merge_overlapping, ConflictMode};
pub use error::EngineError;
pub use select::select_suggestions;
pub use store::InMemoryBookings;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::model::*;

/// Read-only view of the external booking store.
///
/// Implementations return every booking relevant to `range` in one go; there
/// is no pagination. Any error is treated as "no known bookings".
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn snapshot(&self, range: DateRange) -> Result<Vec<BookingRecord>, EngineError>;
}

#[async_trait]
impl<T: BookingSource + ?Sized> BookingSource for Arc<T> {
    async fn snapshot(&self, range: DateRange) -> Result<Vec<BookingRecord>, EngineError> {
        (**self).snapshot(range).await
    }
}

/// Non-blocking notice shown next to the suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    /// The booking snapshot failed; suggestions were not checked for conflicts.
    BookingsUnavailable,
}

/// Outcome of one suggestion computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub set: SuggestionSet,
    pub advisory: Option<Advisory>,
}

/// Generator, conflict filter and selector wired to a booking source.
pub struct SuggestionEngine<S> {
    source: S,
    config: EngineConfig,
}

impl<S: BookingSource> SuggestionEngine<S> {
    pub fn new(source: S, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Compute suggestions starting at `base_date`.
    ///
    /// Never fails: a missing date yields an empty set, and a failed booking
    /// query yields unfiltered suggestions flagged with
    /// [`Advisory::BookingsUnavailable`]. `duration`, when known, becomes the
    /// candidates' length, which only matters in [`ConflictMode::Overlap`].
    pub async fn suggest(
        &self,
        base_date: Option<NaiveDate>,
        duration: Option<ServiceDuration>,
    ) -> Suggestions {
        let cfg = &self.config;
        let Some(base) = base_date else {
            return Suggestions::default();
        };
        let started = Instant::now();

        let mut candidates = generate_slots(Some(base), cfg.window_days, &cfg.window);
        if let Some(d) = duration {
            candidates = candidates.into_iter().map(|s| s.with_duration(d.minutes())).collect();
        }
        let generated = candidates.len();

        let range = DateRange::starting_at(base, cfg.window_days);
        let (bookings, advisory) = match self.fetch(range).await {
            Ok(bookings) => (Some(bookings), None),
            Err(e) => {
                warn!(%base, "suggestions unfiltered: {e}");
                metrics::counter!(crate::observability::BOOKING_QUERY_FAILURES_TOTAL).increment(1);
                (None, Some(Advisory::BookingsUnavailable))
            }
        };

        let free = filter_available_with(candidates, bookings.as_deref(), cfg.conflict_mode, &cfg.window);
        let set = select_suggestions(&free, cfg.max_days, cfg.max_per_day);

        let outcome = if advisory.is_some() { "unfiltered" } else { "ok" };
        metrics::counter!(crate::observability::SUGGESTIONS_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(crate::observability::SUGGEST_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        debug!(
            %base,
            generated,
            available = free.len(),
            suggested = set.len(),
            outcome,
            "computed suggestions"
        );

        Suggestions { set, advisory }
    }

    async fn fetch(&self, range: DateRange) -> Result<Vec<BookingRecord>, EngineError> {
        match tokio::time::timeout(self.config.query_timeout, self.source.snapshot(range)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::QueryTimeout),
        }
    }
}
