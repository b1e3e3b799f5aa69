use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result, SessionError};
use crate::history::HistoryStore;
use crate::session::{ActiveSession, Operation, SessionRecord, SessionState, DEFAULT_TASK_NAME};
use crate::storage::BlobStore;

/// Drives the lifecycle of the single active session.
///
/// Idle -> Running <-> Paused -> (stop) -> Idle. Elapsed time is always
/// recomputed from the session's timestamps, never accumulated per tick.
#[derive(Debug)]
pub struct SessionManager<C: Clock = SystemClock> {
    clock: C,
    active: Option<ActiveSession>,
    default_task_name: String,
    // latest timestamp handed out; keeps transitions ordered if the clock steps back
    high_water: Cell<Option<DateTime<Utc>>>,
}

impl SessionManager<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SessionManager<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionManager<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            active: None,
            default_task_name: DEFAULT_TASK_NAME.to_string(),
            high_water: Cell::new(None),
        }
    }

    pub fn with_default_task_name(mut self, name: impl Into<String>) -> Self {
        self.default_task_name = name.into();
        self
    }

    pub fn default_task_name(&self) -> &str {
        &self.default_task_name
    }

    pub fn state(&self) -> SessionState {
        self.active
            .as_ref()
            .map_or(SessionState::Idle, ActiveSession::state)
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Current time, never earlier than any timestamp previously handed out
    pub fn now(&self) -> DateTime<Utc> {
        let now = match self.high_water.get() {
            Some(latest) => self.clock.now().max(latest),
            None => self.clock.now(),
        };
        self.high_water.set(Some(now));
        now
    }

    pub fn start(&mut self, task_name: impl Into<String>) -> Result<&ActiveSession> {
        if self.active.is_some() {
            return Err(self.invalid(Operation::Start));
        }

        let session = ActiveSession::new(task_name.into(), self.now());
        info!(id = session.id(), task = session.task_name(), "session started");
        let session: &ActiveSession = self.active.insert(session);
        Ok(session)
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state() != SessionState::Running {
            return Err(self.invalid(Operation::Pause));
        }

        let now = self.now();
        if let Some(session) = self.active.as_mut() {
            session.open_pause(now);
            info!(id = session.id(), "session paused");
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state() != SessionState::Paused {
            return Err(self.invalid(Operation::Resume));
        }

        let now = self.now();
        if let Some(session) = self.active.as_mut() {
            session.close_pause(now);
            info!(id = session.id(), "session resumed");
        }
        Ok(())
    }

    /// Finalize the active session and append its record to `history`.
    ///
    /// The session is cleared and the record is at the head of the in-memory
    /// history even when the write fails; the failure is returned as
    /// [`Error::Persistence`].
    pub fn stop<S: BlobStore>(&mut self, history: &mut HistoryStore<S>) -> Result<SessionRecord> {
        let now = self.now();
        let Some(session) = self.active.take() else {
            return Err(self.invalid(Operation::Stop));
        };

        let record = session.finalize(now, &self.default_task_name);
        info!(
            id = %record.id,
            task = %record.task_name,
            duration_secs = record.duration_seconds,
            paused_secs = record.paused_seconds(),
            "session stopped"
        );

        history.append(record.clone())?;
        Ok(record)
    }

    /// Relabel the active session before it is stopped
    pub fn set_task_name(&mut self, task_name: impl Into<String>) -> bool {
        match self.active.as_mut() {
            Some(session) => {
                session.set_task_name(task_name.into());
                true
            }
            None => false,
        }
    }

    /// Elapsed seconds at `at`, excluding pauses; `None` when idle
    pub fn elapsed(&self, at: DateTime<Utc>) -> Option<u64> {
        self.active.as_ref().map(|session| session.elapsed_secs(at))
    }

    /// Elapsed seconds right now; this is what the display refresh polls
    pub fn elapsed_now(&self) -> Option<u64> {
        let now = self.now();
        self.elapsed(now)
    }

    /// Paused time accumulated by the active session up to `at`
    pub fn paused_total(&self, at: DateTime<Utc>) -> Option<Duration> {
        self.active.as_ref().map(|session| session.paused_total(at))
    }

    fn invalid(&self, operation: Operation) -> Error {
        SessionError::InvalidTransition {
            operation,
            state: self.state(),
        }
        .into()
    }
}
