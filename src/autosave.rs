//! Autosave scheduling: debounced content and thumbnail save cadences.
//!
//! DESIGN
//! ======
//! The scheduler is a pure deadline state machine — it decides *when* a save
//! is due and tracks dirty/in-flight bookkeeping, but performs no I/O. The
//! session's background task drives it: tick, [`AutosaveScheduler::poll`]
//! under the lock, perform the network call with the lock released, then
//! [`complete`](AutosaveScheduler::complete) or
//! [`fail`](AutosaveScheduler::fail).
//!
//! Two independent debounce windows restart on every qualifying change: a
//! short one persisting scene content only, and a longer one that also
//! regenerates a thumbnail. The gesture-skip and in-flight checks are
//! best-effort coordination, not a correctness guarantee — a save can still
//! land between a pointer-up and the next pointer-down.

#[cfg(test)]
#[path = "autosave_test.rs"]
mod autosave_test;

use std::time::{Duration, Instant};

/// Which save cadence fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Serialized scene only (short debounce window).
    Content,
    /// Serialized scene plus a regenerated thumbnail (long window).
    WithThumbnail,
}

/// Debounce bookkeeping for one board session.
#[derive(Debug)]
pub struct AutosaveScheduler {
    content_window: Duration,
    thumbnail_window: Duration,
    content_due: Option<Instant>,
    thumbnail_due: Option<Instant>,
    unsaved_changes: bool,
    changed_since_thumbnail: bool,
    in_flight: bool,
    last_saved: Option<String>,
}

impl AutosaveScheduler {
    #[must_use]
    pub fn new(content_window: Duration, thumbnail_window: Duration) -> Self {
        Self {
            content_window,
            thumbnail_window,
            content_due: None,
            thumbnail_due: None,
            unsaved_changes: false,
            changed_since_thumbnail: false,
            in_flight: false,
            last_saved: None,
        }
    }

    /// Register a qualifying scene change: restart both debounce windows and
    /// mark the session dirty.
    pub fn note_change(&mut self, now: Instant) {
        self.content_due = Some(now + self.content_window);
        self.thumbnail_due = Some(now + self.thumbnail_window);
        self.unsaved_changes = true;
        self.changed_since_thumbnail = true;
    }

    /// Seed the last-successful-save cache (after the initial board load).
    pub fn seed_last_saved(&mut self, serialized: String) {
        self.last_saved = Some(serialized);
    }

    /// Whether `serialized` is byte-identical to the last successful save.
    #[must_use]
    pub fn is_unchanged(&self, serialized: &str) -> bool {
        self.last_saved.as_deref() == Some(serialized)
    }

    /// Collect due work, consuming the fired deadline(s).
    ///
    /// Returns `None` while a save is in flight or a gesture is active; the
    /// dropped trigger relies on the next tick (or the next change) to
    /// retry. A due thumbnail save absorbs the content deadline, since it
    /// carries the content too.
    pub fn poll(&mut self, now: Instant, gesture_active: bool) -> Option<SaveKind> {
        if self.in_flight || gesture_active {
            return None;
        }
        if self.thumbnail_due.is_some_and(|due| now >= due) {
            self.thumbnail_due = None;
            if self.changed_since_thumbnail {
                self.content_due = None;
                return Some(SaveKind::WithThumbnail);
            }
        }
        if self.content_due.is_some_and(|due| now >= due) {
            self.content_due = None;
            return Some(SaveKind::Content);
        }
        None
    }

    /// Mark a save request as started. Guards against overlapping requests.
    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    /// Record a successful save of `serialized`. A thumbnail save clears the
    /// unsaved-changes flag; a content save leaves it set until a thumbnail
    /// save lands.
    pub fn complete(&mut self, kind: SaveKind, serialized: String) {
        self.in_flight = false;
        self.last_saved = Some(serialized);
        if kind == SaveKind::WithThumbnail {
            self.changed_since_thumbnail = false;
            self.unsaved_changes = false;
        }
    }

    /// Record a failed save. The consumed deadline is not re-armed — the
    /// next change event starts the next debounce cycle.
    pub fn fail(&mut self) {
        self.in_flight = false;
    }

    /// Cancel all pending debounce work (session unmount). In-flight saves
    /// are not aborted; their completion bookkeeping is simply irrelevant.
    pub fn cancel(&mut self) {
        self.content_due = None;
        self.thumbnail_due = None;
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Monotonic dirty flag: set on every change, cleared only by a
    /// successful thumbnail save.
    #[must_use]
    pub fn unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }
}
