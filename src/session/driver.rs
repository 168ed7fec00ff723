use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::debounce::Debouncer;
use crate::engine::{BookingSource, SuggestionEngine};
use crate::model::{ServiceDuration, TimeSlot};
use crate::notify::{NotifyHub, SessionEvent};

use super::{parse_date_input, SchedulingSession, SelectedSlot, SessionError};

/// Write side of the booking store. Owns the authoritative conflict check;
/// a clash found at write time comes back as [`SessionError::Rejected`].
#[async_trait]
pub trait BookingCommitter: Send + Sync {
    async fn commit(&self, slot: &SelectedSlot) -> Result<(), SessionError>;
}

/// Everything a background refresh needs, cheap to clone into a task.
struct Refresher<S> {
    id: Ulid,
    session: Arc<Mutex<SchedulingSession>>,
    engine: Arc<SuggestionEngine<S>>,
    notify: Arc<NotifyHub>,
}

impl<S> Clone for Refresher<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            session: self.session.clone(),
            engine: self.engine.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<S: BookingSource + 'static> Refresher<S> {
    /// Set the date and compute suggestions in the background. The task
    /// resolves to false if its result was discarded as stale.
    async fn select_date(&self, date: NaiveDate) -> Result<JoinHandle<bool>, SessionError> {
        let (ticket, duration) = {
            let mut session = self.session.lock().await;
            let ticket = session.choose_date(date)?;
            session.begin_loading(&ticket);
            (ticket, session.duration())
        };

        let this = self.clone();
        Ok(tokio::spawn(async move {
            let outcome = this.engine.suggest(Some(ticket.date), duration).await;
            let event = match outcome.advisory {
                Some(advisory) => SessionEvent::SuggestionsUnavailable {
                    date: ticket.date,
                    suggestions: outcome.set.clone(),
                    advisory,
                },
                None => SessionEvent::SuggestionsReady {
                    date: ticket.date,
                    suggestions: outcome.set.clone(),
                },
            };

            let applied = this.session.lock().await.apply_suggestions(&ticket, outcome);
            if applied {
                this.notify.send(this.id, &event);
            } else {
                debug!(session = %this.id, date = %ticket.date, "discarding stale suggestions");
                metrics::counter!(crate::observability::STALE_RESPONSES_TOTAL).increment(1);
            }
            applied
        }))
    }
}

/// Reopens the session if a commit future is dropped before the
/// collaborator answers.
struct PendingCommit {
    session: Arc<Mutex<SchedulingSession>>,
    armed: bool,
}

impl PendingCommit {
    async fn finish(mut self, accepted: bool) {
        let mut session = self.session.lock().await;
        session.finish_commit(accepted);
        self.armed = false;
    }
}

impl Drop for PendingCommit {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let session = self.session.clone();
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move { session.lock().await.finish_commit(false) });
        }
    }
}

/// Drives one [`SchedulingSession`] against an engine and a commit
/// collaborator, publishing progress on the notify hub.
pub struct SessionDriver<S, C> {
    refresher: Refresher<S>,
    committer: Arc<C>,
    /// Bumped by every date choice made outside the text field. Typed text
    /// carries the epoch it was entered under and is dropped once it moves.
    date_epoch: Arc<AtomicU64>,
    date_input: Debouncer<(u64, String)>,
}

impl<S, C> SessionDriver<S, C>
where
    S: BookingSource + 'static,
    C: BookingCommitter + 'static,
{
    pub fn new(engine: Arc<SuggestionEngine<S>>, committer: Arc<C>, notify: Arc<NotifyHub>) -> Self {
        let refresher = Refresher {
            id: Ulid::new(),
            session: Arc::new(Mutex::new(SchedulingSession::new())),
            engine,
            notify,
        };

        let date_epoch = Arc::new(AtomicU64::new(0));
        let (date_input, mut typed) =
            Debouncer::<(u64, String)>::spawn(refresher.engine.config().debounce);
        let typed_refresher = refresher.clone();
        let typed_epoch = date_epoch.clone();
        tokio::spawn(async move {
            while let Some((epoch, text)) = typed.recv().await {
                if epoch != typed_epoch.load(Ordering::SeqCst) {
                    debug!(session = %typed_refresher.id, "typed date superseded by a newer choice");
                    continue;
                }
                let Some(date) = parse_date_input(&text) else {
                    debug!(session = %typed_refresher.id, "ignoring unparseable date input");
                    continue;
                };
                if let Err(e) = typed_refresher.select_date(date).await {
                    debug!(session = %typed_refresher.id, "typed date ignored: {e}");
                }
            }
        });

        Self {
            refresher,
            committer,
            date_epoch,
            date_input,
        }
    }

    pub fn id(&self) -> Ulid {
        self.refresher.id
    }

    /// Shared handle on the session state, for reading fields and suggestions.
    pub fn session(&self) -> Arc<Mutex<SchedulingSession>> {
        self.refresher.session.clone()
    }

    /// Date picked from a calendar control: recompute immediately. Any
    /// typed date still waiting out the debounce is abandoned.
    pub async fn select_date(&self, date: NaiveDate) -> Result<JoinHandle<bool>, SessionError> {
        self.date_epoch.fetch_add(1, Ordering::SeqCst);
        self.refresher.select_date(date).await
    }

    /// Keystrokes in a free-text date field. Only the value left after the
    /// debounce period is parsed and, if valid, selected, and only if no
    /// other date was chosen in the meantime.
    pub fn type_date(&self, text: impl Into<String>) {
        let epoch = self.date_epoch.load(Ordering::SeqCst);
        self.date_input.push((epoch, text.into()));
    }

    pub async fn pick_suggestion(&self, index: usize) -> Result<TimeSlot, SessionError> {
        self.date_epoch.fetch_add(1, Ordering::SeqCst);
        self.refresher.session.lock().await.pick_suggestion(index)
    }

    pub async fn edit_time(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.refresher.session.lock().await.edit_time(text)
    }

    pub async fn set_duration(&self, duration: ServiceDuration) -> Result<(), SessionError> {
        self.refresher.session.lock().await.set_duration(duration)
    }

    /// Hand the current triple to the commit collaborator. Fields are frozen
    /// until it answers. On rejection the session reopens so the scheduler
    /// can adjust and retry.
    pub async fn commit(&self) -> Result<SelectedSlot, SessionError> {
        let slot = self.refresher.session.lock().await.begin_commit()?;
        let pending = PendingCommit {
            session: self.refresher.session.clone(),
            armed: true,
        };

        if let Err(e) = self.committer.commit(&slot).await {
            pending.finish(false).await;
            warn!(session = %self.id(), date = %slot.date, time = %slot.time, "commit failed: {e}");
            metrics::counter!(crate::observability::COMMITS_TOTAL, "status" => "rejected").increment(1);
            return Err(e);
        }

        pending.finish(true).await;
        metrics::counter!(crate::observability::COMMITS_TOTAL, "status" => "ok").increment(1);
        info!(
            session = %self.id(),
            date = %slot.date,
            time = %slot.time,
            duration = slot.duration_minutes,
            "booking committed"
        );
        self.refresher
            .notify
            .send(self.id(), &SessionEvent::Committed { slot: slot.clone() });
        Ok(slot)
    }
}
