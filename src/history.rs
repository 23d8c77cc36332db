//! Linear undo/redo over serialized scene snapshots.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

/// Bounded snapshot list with a cursor.
///
/// Every mutation records a full serialized scene. Recording truncates any
/// redo branch past the cursor, and evicts the oldest entry once the
/// capacity is exceeded. Capture during an undo/redo replay is suppressed
/// via [`History::set_replaying`] — restoring a snapshot must never record
/// one.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    capacity: usize,
    replaying: bool,
}

impl History {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::new(), index: 0, capacity: capacity.max(1), replaying: false }
    }

    /// Capture a snapshot at the cursor: discard the redo branch, append,
    /// advance, evict beyond capacity. No-op while replaying.
    pub fn record(&mut self, snapshot: String) {
        if self.replaying {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.index -= 1;
        }
    }

    /// Step back; returns the snapshot to restore, or `None` at the oldest
    /// recoverable state.
    pub fn undo(&mut self) -> Option<String> {
        if self.entries.is_empty() || self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Step forward; returns the snapshot to restore, or `None` when no redo
    /// branch exists.
    pub fn redo(&mut self) -> Option<String> {
        if self.entries.is_empty() || self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    /// Suppress (or re-enable) snapshot capture while a snapshot is being
    /// restored into the live scene.
    pub fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Number of snapshots currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
