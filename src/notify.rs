use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::engine::Advisory;
use crate::model::SuggestionSet;
use crate::session::SelectedSlot;

const CHANNEL_CAPACITY: usize = 64;

/// What a scheduling session tells the UI hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SuggestionsReady {
        date: NaiveDate,
        suggestions: SuggestionSet,
    },
    /// Suggestions were computed without the booking snapshot.
    SuggestionsUnavailable {
        date: NaiveDate,
        suggestions: SuggestionSet,
        advisory: Advisory,
    },
    Committed {
        slot: SelectedSlot,
    },
}

impl SessionEvent {
    /// JSON payload for hosts that bridge events to a UI.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Broadcast hub for session events, one channel per session.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<SessionEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a session's events. Creates the channel if needed.
    pub fn subscribe(&self, session_id: Ulid) -> broadcast::Receiver<SessionEvent> {
        let sender = self
            .channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an event. No-op if nobody is listening.
    pub fn send(&self, session_id: Ulid, event: &SessionEvent) {
        if let Some(sender) = self.channels.get(&session_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Remove a channel (e.g. when the session is closed).
    pub fn remove(&self, session_id: &Ulid) {
        self.channels.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let sid = Ulid::new();
        let mut rx = hub.subscribe(sid);

        let event = SessionEvent::SuggestionsReady {
            date: monday(),
            suggestions: SuggestionSet::default(),
        };
        hub.send(sid, &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let sid = Ulid::new();
        // No subscriber, nothing to deliver
        hub.send(
            sid,
            &SessionEvent::SuggestionsReady {
                date: monday(),
                suggestions: SuggestionSet::default(),
            },
        );
    }

    #[tokio::test]
    async fn removed_channel_stops_delivery() {
        let hub = NotifyHub::new();
        let sid = Ulid::new();
        let mut rx = hub.subscribe(sid);
        hub.remove(&sid);
        hub.send(
            sid,
            &SessionEvent::SuggestionsReady {
                date: monday(),
                suggestions: SuggestionSet::default(),
            },
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn payload_is_tagged_json() {
        let event = SessionEvent::SuggestionsUnavailable {
            date: monday(),
            suggestions: SuggestionSet::default(),
            advisory: Advisory::BookingsUnavailable,
        };
        let parsed: serde_json::Value = serde_json::from_str(&event.to_payload()).unwrap();
        assert_eq!(parsed["event"], "suggestions_unavailable");
        assert_eq!(parsed["date"], "2026-03-02");
        assert_eq!(parsed["advisory"], "BookingsUnavailable");
    }
}
