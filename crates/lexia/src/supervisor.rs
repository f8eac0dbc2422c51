//! Failure containment for units of work.
//!
//! A failing load does not abort the program: [`Supervisor::guard`] turns
//! the error into an [`Incident`] with a unique id, logs it, and hands back
//! a [`Supervised`] value the caller can inspect, retry or reload.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A captured failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub id: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (incident {})", self.message, self.id)
    }
}

/// State of a supervised unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Supervised<T> {
    /// Not run yet, or waiting to be run again.
    Pending,
    Ready(T),
    Failed(Incident),
}

impl<T> Supervised<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Supervised::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Supervised::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Supervised::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn incident(&self) -> Option<&Incident> {
        match self {
            Supervised::Failed(incident) => Some(incident),
            _ => None,
        }
    }

    /// Moves to `Failed` with a fresh incident.
    pub fn fail(&mut self, supervisor: &Supervisor, error: impl fmt::Display) -> Incident {
        let incident = supervisor.record(error);
        *self = Supervised::Failed(incident.clone());
        incident
    }

    /// Clears a failure so the work can run again.
    pub fn retry(&mut self) {
        if self.is_failed() {
            *self = Supervised::Pending;
        }
    }

    /// Runs `init` again and stores its outcome.
    pub fn reload<E, F>(&mut self, supervisor: &Supervisor, init: F)
    where
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        *self = supervisor.guard(init);
    }

    pub fn into_result(self) -> Result<T, Incident> {
        match self {
            Supervised::Ready(value) => Ok(value),
            Supervised::Failed(incident) => Err(incident),
            Supervised::Pending => Err(Incident {
                id: String::new(),
                message: "not loaded".to_string(),
                at: Utc::now(),
            }),
        }
    }
}

/// Issues incident ids and runs guarded work.
#[derive(Debug, Default)]
pub struct Supervisor {
    seq: AtomicU64,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work`, capturing an error as an incident instead of returning
    /// it.
    pub fn guard<T, E, F>(&self, work: F) -> Supervised<T>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        match work() {
            Ok(value) => Supervised::Ready(value),
            Err(err) => Supervised::Failed(self.record(err)),
        }
    }

    /// Async form of [`guard`](Self::guard).
    pub async fn guard_async<T, E, Fut>(&self, work: Fut) -> Supervised<T>
    where
        E: fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        match work.await {
            Ok(value) => Supervised::Ready(value),
            Err(err) => Supervised::Failed(self.record(err)),
        }
    }

    /// Number of incidents recorded so far.
    pub fn incidents(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    fn record(&self, error: impl fmt::Display) -> Incident {
        let at = Utc::now();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{:x}-{:04x}", at.timestamp_millis(), seq);
        let message = error.to_string();
        tracing::error!(incident = %id, error = %message, "operation failed");
        Incident { id, message, at }
    }
}
