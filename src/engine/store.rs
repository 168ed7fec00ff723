use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

use super::{BookingSource, EngineError};

/// Concurrent in-memory booking snapshot source.
pub struct InMemoryBookings {
    records: DashMap<Ulid, BookingRecord>,
}

impl Default for InMemoryBookings {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookings {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn insert(&self, id: Ulid, record: BookingRecord) {
        self.records.insert(id, record);
    }

    /// Insert under a fresh id and return it.
    pub fn add(&self, record: BookingRecord) -> Ulid {
        let id = Ulid::new();
        self.insert(id, record);
        id
    }

    pub fn remove(&self, id: &Ulid) -> Option<BookingRecord> {
        self.records.remove(id).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl BookingSource for InMemoryBookings {
    /// Records without a date are handed back as-is so the filter can count
    /// and skip them.
    async fn snapshot(&self, range: DateRange) -> Result<Vec<BookingRecord>, EngineError> {
        let mut out: Vec<BookingRecord> = self
            .records
            .iter()
            .filter(|e| e.value().date.is_none_or(|d| range.contains(d)))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| (a.date, &a.start_time).cmp(&(b.date, &b.start_time)));
        Ok(out)
    }
}
