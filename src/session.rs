use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Label used when a session is stopped without a task name
pub const DEFAULT_TASK_NAME: &str = "Untitled Task";

/// Lifecycle state of the session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

/// Lifecycle operations, named in transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Stop,
}

/// A span of time excluded from the elapsed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseInterval {
    pub paused_at: DateTime<Utc>,
    pub resumed_at: Option<DateTime<Utc>>,
}

impl PauseInterval {
    pub fn is_open(&self) -> bool {
        self.resumed_at.is_none()
    }

    /// Length of this pause as seen at `at`. An open interval runs up to `at`;
    /// anything after `at` is ignored and the result never goes negative.
    pub fn length_until(&self, at: DateTime<Utc>) -> Duration {
        let end = self.resumed_at.map_or(at, |resumed| resumed.min(at));
        (end - self.paused_at).max(Duration::zero())
    }
}

/// The single in-progress session owned by the manager
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    id: String,
    task_name: String,
    started_at: DateTime<Utc>,
    pause_intervals: Vec<PauseInterval>,
}

impl ActiveSession {
    pub(crate) fn new(task_name: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id: new_session_id(started_at),
            task_name,
            started_at,
            pause_intervals: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn pause_intervals(&self) -> &[PauseInterval] {
        &self.pause_intervals
    }

    /// Paused iff the last pause interval is still open
    pub fn state(&self) -> SessionState {
        match self.pause_intervals.last() {
            Some(interval) if interval.is_open() => SessionState::Paused,
            _ => SessionState::Running,
        }
    }

    pub(crate) fn set_task_name(&mut self, task_name: String) {
        self.task_name = task_name;
    }

    pub(crate) fn open_pause(&mut self, at: DateTime<Utc>) {
        self.pause_intervals.push(PauseInterval {
            paused_at: at,
            resumed_at: None,
        });
    }

    pub(crate) fn close_pause(&mut self, at: DateTime<Utc>) {
        if let Some(interval) = self.pause_intervals.last_mut() {
            if interval.is_open() {
                interval.resumed_at = Some(at.max(interval.paused_at));
            }
        }
    }

    /// Total paused time up to `at`
    pub fn paused_total(&self, at: DateTime<Utc>) -> Duration {
        self.pause_intervals
            .iter()
            .fold(Duration::zero(), |acc, interval| {
                acc + interval.length_until(at)
            })
    }

    /// Running time up to `at`, excluding every pause.
    ///
    /// Derived from absolute timestamps on each call, so it stays exact across
    /// missed refresh ticks or a suspended host.
    pub fn elapsed(&self, at: DateTime<Utc>) -> Duration {
        let span = (at - self.started_at).max(Duration::zero());
        (span - self.paused_total(at)).max(Duration::zero())
    }

    pub fn elapsed_secs(&self, at: DateTime<Utc>) -> u64 {
        self.elapsed(at).num_seconds().max(0) as u64
    }

    /// Close out the session at `at` and produce its history record
    pub(crate) fn finalize(mut self, at: DateTime<Utc>, default_task_name: &str) -> SessionRecord {
        self.close_pause(at);

        // ended_at must be strictly after started_at
        let ended_at = at.max(self.started_at + Duration::milliseconds(1));
        // any pause, however short, costs at least a whole second
        let span_secs = (ended_at - self.started_at).num_seconds().max(0) as u64;
        let duration_seconds = span_secs.saturating_sub(ceil_secs(self.paused_total(ended_at)));

        SessionRecord {
            id: self.id,
            task_name: resolve_task_name(&self.task_name, default_task_name),
            started_at: self.started_at,
            ended_at,
            duration_seconds,
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let whole = duration.num_seconds().max(0);
    if duration > Duration::seconds(whole) {
        whole as u64 + 1
    } else {
        whole as u64
    }
}

/// A completed session as stored in the history.
///
/// Field names follow the persisted JSON layout; the older `startTime`,
/// `endTime` and `duration` names are still accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub task_name: String,
    #[serde(alias = "startTime")]
    pub started_at: DateTime<Utc>,
    #[serde(alias = "endTime")]
    pub ended_at: DateTime<Utc>,
    #[serde(alias = "duration")]
    pub duration_seconds: u64,
}

impl SessionRecord {
    /// Wall-clock span between start and end, pauses included
    pub fn span_seconds(&self) -> u64 {
        (self.ended_at - self.started_at).num_seconds().max(0) as u64
    }

    pub fn paused_seconds(&self) -> u64 {
        self.span_seconds().saturating_sub(self.duration_seconds)
    }
}

pub fn resolve_task_name(task_name: &str, default_task_name: &str) -> String {
    let trimmed = task_name.trim();
    if trimmed.is_empty() {
        default_task_name.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Opaque id: start time in epoch millis plus a random suffix
pub fn new_session_id(started_at: DateTime<Utc>) -> String {
    format!(
        "{}-{:04x}",
        started_at.timestamp_millis(),
        rand::random::<u16>()
    )
}
