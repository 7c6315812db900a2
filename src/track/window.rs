// ABOUTME: Log windowing: push-mode watermark buffer and pull-mode id cursor.
// ABOUTME: Every entry is released exactly once, in arrival order, never re-sorted.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::api::{LogEntry, StageLogEntry, StageLogs};

/// Push-mode buffer shared between the live log reader and the tracker loop.
pub type SharedLogWindow = Arc<Mutex<LogWindow>>;

/// Buffers push-delivered log entries and releases only those at-or-before
/// a watermark.
///
/// Delivery order is not guaranteed to exactly match timestamp order under
/// concurrent delivery, so the release boundary is the first entry whose
/// timestamp exceeds the bound, found by linear scan. Entries are never
/// reordered.
#[derive(Debug, Default)]
pub struct LogWindow {
    entries: VecDeque<LogEntry>,
}

impl LogWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLogWindow {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn enqueue(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries `flush(until)` would release, without mutating
    /// state. Used to decide whether a stage has logs yet before opening
    /// its group.
    pub fn peek(&self, until: Option<DateTime<Utc>>) -> usize {
        match until {
            None => self.entries.len(),
            Some(bound) => self
                .entries
                .iter()
                .position(|e| e.timestamp > bound)
                .unwrap_or(self.entries.len()),
        }
    }

    /// Release (in FIFO order) every buffered entry whose timestamp is at
    /// or before `until`, or all entries when unbounded.
    pub fn flush(&mut self, until: Option<DateTime<Utc>>) -> Vec<LogEntry> {
        let count = self.peek(until);
        debug!("flushing {count} of {} buffered log entries", self.entries.len());
        self.entries.drain(..count).collect()
    }
}

/// Pull-mode cursor over per-stage log snapshots.
///
/// Each fetch returns the stage's entire history, so the cursor remembers
/// the last emitted id and hands back only what is new.
#[derive(Debug, Clone, Copy, Default)]
pub struct PullCursor {
    last_id: Option<u64>,
}

impl PullCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries from `snapshot` not yet emitted through this cursor.
    ///
    /// With no recorded id the whole snapshot is new; when the snapshot's
    /// end marker equals the recorded id nothing is new; otherwise exactly
    /// the entries with a larger id.
    pub fn new_since<'a>(&self, snapshot: &'a StageLogs) -> Vec<&'a StageLogEntry> {
        match self.last_id {
            None => snapshot.data.iter().collect(),
            Some(last_id) if snapshot.end == last_id => Vec::new(),
            Some(last_id) => snapshot.data.iter().filter(|e| e.id > last_id).collect(),
        }
    }

    /// Record the largest id in `snapshot` as emitted. A snapshot with no
    /// entries leaves the cursor unchanged.
    pub fn advance(&mut self, snapshot: &StageLogs) {
        if let Some(max) = snapshot.data.iter().map(|e| e.id).max() {
            self.last_id = Some(max);
        }
    }

    pub fn last_id(&self) -> Option<u64> {
        self.last_id
    }
}
