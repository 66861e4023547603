//! Bounded undo/redo history of `(text, caret)` snapshots.
//!
//! Typing is coalesced by a [`Debounce`] before a non-forced snapshot is
//! taken; structural edits push a forced pair around themselves.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_HISTORY_LIMIT: usize = 300;
pub const DEFAULT_HISTORY_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub caret: usize,
}

/// Linear history with a current index.
///
/// Invariant: `index < len()` whenever the stack is non-empty. Pushing after
/// an undo discards the redo branch.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    index: usize,
    limit: usize,
    replaying: bool,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStack {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: 0,
            limit: limit.max(1),
            replaying: false,
        }
    }

    /// Push a snapshot. Returns whether anything was recorded.
    ///
    /// Ignored during replay. Without `force`, a snapshot whose text equals
    /// the current entry is dropped, so pure caret moves never add steps.
    pub fn snapshot(&mut self, text: &str, caret: usize, force: bool) -> bool {
        if self.replaying {
            return false;
        }
        if !force && self.current().is_some_and(|entry| entry.text == text) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push_back(HistoryEntry {
            text: text.to_string(),
            caret,
        });
        self.index = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            self.entries.pop_front();
            self.index -= 1;
        }
        true
    }

    /// Step back; the entry to restore, if there is one
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward; the entry to restore, if there is one
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    /// Suppress snapshots while a restored entry is written back
    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

/// Quiet-period timer for coalescing keystrokes.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEBOUNCE)
    }
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)start the quiet period from `now`
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once per schedule, when the quiet period has elapsed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(n: usize) -> HistoryStack {
        let mut history = HistoryStack::default();
        for i in 0..n {
            history.snapshot(&format!("text {i}"), i, true);
        }
        history
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let history = filled(301);

        assert_eq!(history.len(), 300);
        assert_eq!(history.index(), 299);
        assert_eq!(history.current().unwrap().text, "text 300");
        assert_eq!(history.entries().next().unwrap().text, "text 1");
    }

    #[test]
    fn test_undo_restores_earlier_snapshots() {
        let mut history = filled(5);

        for _ in 0..3 {
            history.undo();
        }

        let entry = history.current().unwrap();
        assert_eq!(entry.text, "text 1");
        assert_eq!(entry.caret, 1);
    }

    #[test]
    fn test_undo_stops_at_first_entry() {
        let mut history = filled(2);
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_redo_after_undo() {
        let mut history = filled(3);
        history.undo();
        history.undo();

        assert_eq!(history.redo().unwrap().text, "text 1");
        assert_eq!(history.redo().unwrap().text, "text 2");
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_new_snapshot_prunes_redo_branch() {
        let mut history = filled(4);
        history.undo();
        history.undo();

        history.snapshot("branch", 0, true);

        assert!(history.redo().is_none());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().unwrap().text, "branch");
    }

    #[test]
    fn test_identical_text_is_suppressed_unless_forced() {
        let mut history = HistoryStack::default();
        assert!(history.snapshot("1+1", 0, true));
        assert!(!history.snapshot("1+1", 3, false));
        assert!(history.snapshot("1+1", 3, true));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_replay_suppresses_snapshots() {
        let mut history = filled(2);
        history.begin_replay();
        assert!(!history.snapshot("ignored", 0, true));
        history.end_replay();
        assert!(history.snapshot("kept", 0, true));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_debounce_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debounce::default();

        debounce.schedule(start);
        debounce.schedule(start + Duration::from_millis(300));

        assert!(!debounce.take_due(start + Duration::from_millis(700)));
        assert!(debounce.take_due(start + Duration::from_millis(800)));
        assert!(!debounce.take_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_debounce_cancel() {
        let start = Instant::now();
        let mut debounce = Debounce::default();
        debounce.schedule(start);
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(!debounce.take_due(start + Duration::from_secs(1)));
    }
}
