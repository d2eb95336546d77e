//! # Saving Document Changes
//!
//! [`PersistenceQueue`] consumes [`DocumentChanged`] events and hands the
//! latest one to a [`Persister`] once edits have settled. Failed saves are
//! retried with a growing delay and finally reported; the document itself
//! is never rolled back.
//!
//! ```text
//! push(v3) ──debounce──▶ poll ──persist──┬── Ok ─────────────▶ Saved(v3)
//!                                        └── Err ─▶ Retrying(v3, n) ─▶ ... ─▶ GaveUp(v3)
//! ```
//!
//! Like the affordance machine, the queue owns no timers: the host passes
//! the current [`Instant`] and polls when [`PersistenceQueue::next_due`]
//! says something is ready.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use crate::session::DocumentChanged;

/// Something that can store a serialized document.
pub trait Persister {
    fn persist(&mut self, event: &DocumentChanged) -> Result<()>;
}

impl<F> Persister for F
where
    F: FnMut(&DocumentChanged) -> Result<()>,
{
    fn persist(&mut self, event: &DocumentChanged) -> Result<()> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistConfig {
    /// Quiet time after the last change before saving.
    pub debounce: Duration,
    pub max_attempts: u32,
    /// Retry `n` waits `backoff * n`.
    pub backoff: Duration,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { version: u64 },
    Retrying { version: u64, attempt: u32, at: Instant },
    /// Every attempt failed. The event is dropped; a later change starts over.
    GaveUp { version: u64, attempts: u32, error: String },
}

#[derive(Debug)]
struct Pending {
    event: DocumentChanged,
    due: Instant,
    failures: u32,
}

#[derive(Debug, Default)]
pub struct PersistenceQueue {
    config: PersistConfig,
    pending: Option<Pending>,
    saved_version: Option<u64>,
}

impl PersistenceQueue {
    pub fn new(config: PersistConfig) -> Self {
        Self {
            config,
            pending: None,
            saved_version: None,
        }
    }

    /// Queue `event`, replacing anything pending including a scheduled
    /// retry. Versions already saved are ignored.
    pub fn push(&mut self, event: DocumentChanged, now: Instant) {
        if self.saved_version.is_some_and(|saved| event.version <= saved) {
            debug!(version = event.version, "stale change, already saved");
            return;
        }
        if let Some(pending) = &self.pending
            && pending.event.version > event.version
        {
            debug!(version = event.version, "stale change, newer one pending");
            return;
        }
        self.pending = Some(Pending {
            event,
            due: now + self.config.debounce,
            failures: 0,
        });
    }

    pub fn push_all(&mut self, events: impl IntoIterator<Item = DocumentChanged>, now: Instant) {
        for event in events {
            self.push(event, now);
        }
    }

    /// When the pending save becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn pending_version(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.event.version)
    }

    pub fn saved_version(&self) -> Option<u64> {
        self.saved_version
    }

    /// Save the pending event if it is due. `None` when nothing was tried.
    pub fn poll(&mut self, now: Instant, persister: &mut impl Persister) -> Option<PersistOutcome> {
        if self.pending.as_ref().is_none_or(|p| now < p.due) {
            return None;
        }
        let mut pending = self.pending.take()?;
        let version = pending.event.version;
        match persister.persist(&pending.event) {
            Ok(()) => {
                debug!(version, "document saved");
                self.saved_version = Some(version);
                Some(PersistOutcome::Saved { version })
            }
            Err(err) => {
                pending.failures += 1;
                let attempt = pending.failures;
                if attempt >= self.config.max_attempts {
                    error!(version, attempts = attempt, error = %format!("{err:#}"), "giving up saving document");
                    return Some(PersistOutcome::GaveUp {
                        version,
                        attempts: attempt,
                        error: format!("{err:#}"),
                    });
                }
                let at = now + self.config.backoff * attempt;
                warn!(version, attempt, error = %format!("{err:#}"), "saving document failed, retrying");
                pending.due = at;
                self.pending = Some(pending);
                Some(PersistOutcome::Retrying { version, attempt, at })
            }
        }
    }
}

/// Writes each document to `<dir>/<doc id>.md`.
#[derive(Debug, Clone)]
pub struct DraftsDir {
    dir: PathBuf,
}

impl DraftsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, event: &DocumentChanged) -> PathBuf {
        self.dir.join(format!("{}.md", event.doc_id))
    }
}

impl Persister for DraftsDir {
    fn persist(&mut self, event: &DocumentChanged) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create drafts directory: {}", self.dir.display()))?;
        let path = self.path_for(event);
        fs::write(&path, &event.serialized)
            .with_context(|| format!("Failed to write draft: {}", path.display()))
    }
}
