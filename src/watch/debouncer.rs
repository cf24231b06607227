use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::types::EventKind;

pub(super) const DEBOUNCE_MS: u64 = 100;

/// Pure debouncer: timing and per-path deduplication only.
///
/// Unlike a map, the pending list keeps first-seen order so a directory
/// event is delivered before the file events that followed it.
pub(super) struct Debouncer {
    pub(super) pending: Vec<(PathBuf, EventKind)>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            pending: Vec::new(),
            last_event: None,
        }
    }

    /// Add an event, applying dedup rules:
    /// - Unlink + Add/Change → Change (file was restored, e.g. atomic save)
    /// - Add/Change + Unlink → Unlink, except Add + Unlink → nothing
    /// - AddDir + UnlinkDir → nothing, UnlinkDir + AddDir → AddDir
    /// - otherwise: first event wins
    pub(super) fn add(&mut self, path: PathBuf, kind: EventKind) {
        use EventKind::*;

        self.last_event = Some(Instant::now());

        let Some(index) = self.pending.iter().position(|(p, _)| *p == path) else {
            self.pending.push((path, kind));
            return;
        };

        let existing = self.pending[index].1;
        match (existing, kind) {
            (Unlink, Add | Change) => self.pending[index].1 = Change,
            (Change, Unlink) => self.pending[index].1 = Unlink,
            (Add, Unlink) | (AddDir, UnlinkDir) => {
                crate::debug!("watch"; "discard {}+{}: {}", existing, kind, path.display());
                self.pending.remove(index);
            }
            (UnlinkDir, AddDir) => self.pending[index].1 = AddDir,
            _ => {}
        }
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
            && !self.pending.is_empty()
    }

    /// Take pending events once the window has been quiet.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, EventKind)>> {
        if !self.is_ready() {
            if self.pending.is_empty() {
                self.last_event = None;
            }
            return None;
        }
        self.take_all()
    }

    pub(super) fn take_all(&mut self) -> Option<Vec<(PathBuf, EventKind)>> {
        self.last_event = None;
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    /// Precise sleep duration until the batch can be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
