//! One editing session: the document plus everything that reacts to it.
//!
//! Front ends translate input into [`Action`]s, call [`Session::dispatch`]
//! and drive [`Session::tick`] from their event loop. All timing goes through
//! explicit `Instant`s.

use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{info, warn};
use regex::Regex;

use crate::calc::{ChannelFactory, Coordinator, DEFAULT_CALCULATION_TIMEOUT, PollResult};
use crate::editing::{Cmd, Document, Motion, locate_line, result_of};
use crate::history::{DEFAULT_HISTORY_DEBOUNCE, DEFAULT_HISTORY_LIMIT, Debounce, HistoryStack};
use crate::io::{Clipboard, Store, export_to_file, write_clipboard};
use crate::merge::apply_results;
use crate::viewport::Viewport;

/// Store key of the persisted buffer
pub const STORAGE_KEY: &str = "editorText";

/// Shown by front ends while the buffer is empty
pub const PLACEHOLDER: &str = concat!(
    "concalc v",
    env!("CARGO_PKG_VERSION"),
    ": a text calculator.\n",
    "Every line is evaluated as you type.\n",
    "Text is kept between runs.\n",
    "Ctrl+H shows the available functions and keys.",
);

/// Appended to the buffer by [`Action::Help`]. No line contains the result
/// separator, so none of it is mistaken for an annotation.
pub const HELP_TEXT: &str = concat!(
    "concalc v",
    env!("CARGO_PKG_VERSION"),
    "\n\n",
    "Operators: + - * / % ^ ! and parentheses\n",
    "Functions: sqrt cbrt abs sin cos tan asin acos atan sinh cosh tanh\n",
    "ln log log10 log2 exp floor ceil round sign min max\n",
    "Arguments are separated by ; as in log(8; 2)\n",
    "Constants: pi e tau phi\n",
    "\n",
    "Keys:\n",
    "- Ctrl+C copies the line result.\n",
    "- Ctrl+X clears everything.\n",
    "- Ctrl+K deletes the line.\n",
    "- Ctrl+D duplicates the line.\n",
    "- Ctrl+Enter inserts a line before the current one.\n",
    "- Ctrl+S saves everything to a file.\n",
    "- Ctrl+Z/Y: undo/redo\n",
    "- Ctrl+H shows this help.\n",
);

static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();

fn strip_line_breaks(text: &str) -> String {
    let regex = LINE_BREAKS.get_or_init(|| Regex::new(r"\r\n|\n|\r").expect("Invalid line break regex"));
    regex.replace_all(text, "").into_owned()
}

/// Tunables of a session; see `concalc-config` for where they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub calculation_timeout: Duration,
    pub history_debounce: Duration,
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            calculation_timeout: DEFAULT_CALCULATION_TIMEOUT,
            history_debounce: DEFAULT_HISTORY_DEBOUNCE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Everything a front end can ask of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Typed text replacing the selection
    Insert(String),
    Backspace,
    Delete,
    Move(Motion),
    SetSelection(Range<usize>),
    /// Enter
    SplitLine,
    InsertLineBefore,
    DuplicateLine,
    DeleteLine,
    Clear,
    /// Pasted text; line breaks are stripped
    Paste(String),
    Help,
    CopyLineResult,
    Save,
    Undo,
    Redo,
}

/// What the front end should do after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    /// Not applicable in the current state; the front end may fall back to
    /// its own handling of the key
    Passthrough,
    /// Put this text on the clipboard
    CopyRequested(String),
    /// Ask the user for a file name, then call [`Session::export`]
    SaveRequested,
}

/// What a [`Session::tick`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    Idle,
    /// Results were merged into the buffer
    Merged,
    /// The evaluator did not answer in time and was restarted
    TimedOut,
}

pub struct Session<F: ChannelFactory, S: Store> {
    document: Document,
    history: HistoryStack,
    debounce: Debounce,
    coordinator: Coordinator<F>,
    viewport: Viewport,
    store: S,
}

impl<F: ChannelFactory, S: Store> Session<F, S> {
    /// Start from the persisted buffer; an absent or unreadable one is empty.
    pub fn open(store: S, factory: F, options: SessionOptions, now: Instant) -> anyhow::Result<Self> {
        let text = match store.get(STORAGE_KEY) {
            Ok(text) => text.unwrap_or_default(),
            Err(err) => {
                warn!("Could not restore saved text: {err}");
                String::new()
            }
        };
        Self::with_text(&text, store, factory, options, now)
    }

    /// Start from `text`, with the caret at its end.
    pub fn with_text(
        text: &str,
        store: S,
        factory: F,
        options: SessionOptions,
        now: Instant,
    ) -> anyhow::Result<Self> {
        let coordinator = Coordinator::new(factory, options.calculation_timeout)?;
        let mut session = Self {
            document: Document::from_text(text),
            history: HistoryStack::new(options.history_limit),
            debounce: Debounce::new(options.history_debounce),
            coordinator,
            viewport: Viewport::default(),
            store,
        };
        session.snapshot(true);
        session.recalculate(now);
        info!(
            "Session started with {} lines",
            session.document.line_count()
        );
        Ok(session)
    }

    pub fn dispatch(&mut self, action: Action, now: Instant) -> Outcome {
        match action {
            Action::Insert(text) => {
                let cmd = self.replace_selection(text);
                self.input(cmd, now);
            }
            Action::Backspace => {
                let range = self.deletion_range(self.document.prev_boundary(), true);
                if let Some(range) = range {
                    self.input(Cmd::DeleteRange { range }, now);
                }
            }
            Action::Delete => {
                let range = self.deletion_range(self.document.next_boundary(), false);
                if let Some(range) = range {
                    self.input(Cmd::DeleteRange { range }, now);
                }
            }
            Action::Move(motion) => {
                self.document.move_caret(motion);
                self.scroll();
            }
            Action::SetSelection(range) => {
                self.document.set_selection(range);
                self.scroll();
            }
            Action::SplitLine => self.split_line(now),
            Action::InsertLineBefore | Action::DuplicateLine | Action::DeleteLine => {
                if self.document.has_selection() {
                    return Outcome::Passthrough;
                }
                let at = self.document.caret();
                let cmd = match action {
                    Action::InsertLineBefore => Cmd::InsertLineBefore { at },
                    Action::DuplicateLine => Cmd::DuplicateLine { at },
                    _ => Cmd::DeleteLine { at },
                };
                self.structural(cmd, now);
            }
            Action::Clear => {
                if self.document.has_selection() {
                    return Outcome::Passthrough;
                }
                self.structural(Cmd::Clear, now);
            }
            Action::Paste(text) => {
                let text = strip_line_breaks(&text);
                if text.is_empty() && !self.document.has_selection() {
                    return Outcome::Handled;
                }
                let cmd = self.replace_selection(text);
                self.structural(cmd, now);
            }
            Action::Help => self.help(now),
            Action::CopyLineResult => {
                if self.document.has_selection() {
                    return Outcome::Passthrough;
                }
                if let Some(result) = self.line_result() {
                    return Outcome::CopyRequested(result);
                }
            }
            Action::Save => return Outcome::SaveRequested,
            Action::Undo => self.replay(false, now),
            Action::Redo => self.replay(true, now),
        }
        Outcome::Handled
    }

    /// Merge arrived results, notice timeouts and take a due debounced
    /// snapshot.
    pub fn tick(&mut self, now: Instant) -> TickEvent {
        let event = match self.coordinator.poll(now) {
            PollResult::Ready(results) => {
                if apply_results(&mut self.document, &results) {
                    self.scroll();
                    TickEvent::Merged
                } else {
                    TickEvent::Idle
                }
            }
            PollResult::TimedOut => TickEvent::TimedOut,
            PollResult::Idle => TickEvent::Idle,
        };

        if self.debounce.take_due(now) {
            self.snapshot(false);
        }
        event
    }

    /// The trimmed result of the caret's line, if it has a non-empty one
    pub fn line_result(&self) -> Option<String> {
        let text = self.document.text();
        let location = locate_line(&text, self.document.caret());
        let line = text[location.start..].split('\n').next().unwrap_or_default();
        result_of(line)
            .map(str::trim)
            .filter(|result| !result.is_empty())
            .map(str::to_string)
    }

    /// Copy the caret line's result. Failures are logged and absorbed.
    pub fn copy_line_result(&self, clipboard: &mut dyn Clipboard) -> bool {
        match self.line_result() {
            Some(result) => write_clipboard(clipboard, &result),
            None => false,
        }
    }

    /// Write the buffer to `path`. Failures are logged and absorbed.
    pub fn export(&self, path: &Path) -> bool {
        match export_to_file(path, &self.document.text()) {
            Ok(()) => {
                info!("Exported buffer to {}", path.display());
                true
            }
            Err(err) => {
                warn!("Export to {} failed: {err}", path.display());
                false
            }
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn caret(&self) -> usize {
        self.document.caret()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn coordinator(&self) -> &Coordinator<F> {
        &self.coordinator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        if self.viewport.height != height {
            self.viewport.set_height(height);
            self.scroll();
        }
    }

    fn replace_selection(&self, text: String) -> Cmd {
        let selection = self.document.selection();
        if selection.is_empty() {
            Cmd::InsertText {
                at: selection.start,
                text,
            }
        } else {
            Cmd::ReplaceRange {
                range: selection,
                text,
            }
        }
    }

    /// The selection, or the character on one side of the caret
    fn deletion_range(&self, boundary: Option<usize>, before: bool) -> Option<Range<usize>> {
        if self.document.has_selection() {
            return Some(self.document.selection());
        }
        let caret = self.document.caret();
        boundary.map(|at| if before { at..caret } else { caret..at })
    }

    /// Typing: recalculate now, snapshot once the user pauses
    fn input(&mut self, cmd: Cmd, now: Instant) {
        if self.document.apply(cmd).is_noop() {
            return;
        }
        self.persist();
        self.recalculate(now);
        self.debounce.schedule(now);
        self.scroll();
    }

    fn split_line(&mut self, now: Instant) {
        self.debounce.cancel();
        self.snapshot(false);
        let cmd = if self.document.has_selection() {
            Cmd::ReplaceRange {
                range: self.document.selection(),
                text: "\n".to_string(),
            }
        } else {
            Cmd::SplitLine {
                at: self.document.caret(),
            }
        };
        self.document.apply(cmd);
        self.recalculate(now);
        self.snapshot(true);
        self.persist();
        self.scroll();
    }

    /// A discrete edit, individually undoable: forced snapshots on both sides
    fn structural(&mut self, cmd: Cmd, now: Instant) {
        self.debounce.cancel();
        self.snapshot(true);
        if self.document.apply(cmd).is_noop() {
            self.scroll();
            return;
        }
        self.recalculate(now);
        self.snapshot(true);
        self.persist();
        self.scroll();
    }

    fn help(&mut self, now: Instant) {
        self.debounce.cancel();
        self.snapshot(true);

        let text = self.document.text();
        let mut addition = String::new();
        if !text.is_empty() && !text.ends_with('\n') {
            addition.push_str("\n\n");
        }
        addition.push_str(HELP_TEXT);
        self.document.apply(Cmd::InsertText {
            at: text.len(),
            text: addition,
        });
        let end = self.document.len();
        self.document.set_caret(end);

        self.recalculate(now);
        self.snapshot(true);
        self.persist();
        self.scroll();
    }

    fn replay(&mut self, forward: bool, now: Instant) {
        // A burst of typing still inside its quiet period is its own step
        if self.debounce.is_pending() {
            self.debounce.cancel();
            self.snapshot(false);
        }

        let entry = if forward {
            self.history.redo()
        } else {
            self.history.undo()
        };
        let Some(entry) = entry.cloned() else {
            return;
        };

        self.history.begin_replay();
        self.document
            .restore(&entry.text, entry.caret..entry.caret);
        self.persist();
        self.scroll();
        self.history.end_replay();

        self.recalculate(now);
    }

    fn snapshot(&mut self, force: bool) {
        let text = self.document.text();
        self.history.snapshot(&text, self.document.caret(), force);
    }

    fn recalculate(&mut self, now: Instant) {
        if self.history.is_replaying() {
            return;
        }
        self.coordinator.trigger(&self.document.text(), now);
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.put(STORAGE_KEY, &self.document.text()) {
            warn!("Could not persist buffer: {err}");
        }
    }

    fn scroll(&mut self) {
        self.viewport
            .scroll_to_caret(self.document.caret_line(), self.document.line_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{IoError, MemoryStore};
    use crate::tests::ScriptedFactory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    type TestSession = Session<ScriptedFactory, MemoryStore>;

    fn session_with(text: &str) -> (TestSession, ScriptedFactory, Instant) {
        let factory = ScriptedFactory::default();
        let handle = factory.clone();
        let now = Instant::now();
        let session = Session::with_text(
            text,
            MemoryStore::default(),
            factory,
            SessionOptions::default(),
            now,
        )
        .unwrap();
        (session, handle, now)
    }

    fn settle(session: &mut TestSession, handle: &ScriptedFactory, now: Instant) {
        handle.answer_latest();
        session.tick(now);
    }

    fn type_text(session: &mut TestSession, text: &str, now: Instant) {
        for c in text.chars() {
            session.dispatch(Action::Insert(c.to_string()), now);
        }
    }

    #[test]
    fn test_open_restores_persisted_text() {
        let store = MemoryStore::with_entry(STORAGE_KEY, "1+1 = 2\n3*3");
        let handle = ScriptedFactory::default();
        let session = Session::open(
            store,
            handle.clone(),
            SessionOptions::default(),
            Instant::now(),
        )
        .unwrap();

        assert_eq!(session.text(), "1+1 = 2\n3*3");
        assert_eq!(session.caret(), 11);
        assert_eq!(session.history().len(), 1);
        assert_eq!(handle.last_sent().unwrap().text, "1+1 = 2\n3*3");
    }

    #[test]
    fn test_open_survives_unreadable_store() {
        struct Broken;
        impl Store for Broken {
            fn get(&self, _key: &str) -> Result<Option<String>, IoError> {
                Err(IoError::Unavailable("locked".to_string()))
            }
            fn put(&mut self, _key: &str, _text: &str) -> Result<(), IoError> {
                Err(IoError::Unavailable("locked".to_string()))
            }
        }

        let now = Instant::now();
        let mut session = Session::open(
            Broken,
            ScriptedFactory::default(),
            SessionOptions::default(),
            now,
        )
        .unwrap();
        assert_eq!(session.text(), "");

        // Failing writes do not stop editing
        type_text_generic(&mut session, "7", now);
        assert_eq!(session.text(), "7");
    }

    fn type_text_generic<S: Store>(session: &mut Session<ScriptedFactory, S>, text: &str, now: Instant) {
        session.dispatch(Action::Insert(text.to_string()), now);
    }

    #[test]
    fn test_typing_is_annotated() {
        let (mut session, handle, now) = session_with("");

        type_text(&mut session, "2+2", now);
        settle(&mut session, &handle, now);

        insta::assert_snapshot!(session.text(), @"2+2 = 4");
        assert_eq!(session.caret(), 3);
        assert_eq!(
            session.store().get(STORAGE_KEY).unwrap().as_deref(),
            Some("2+2")
        );
    }

    #[rstest]
    #[case("10/3", "10/3 = 3.3333333333")]
    #[case("1,5+1,5", "1,5+1,5 = 3")]
    #[case("2 * (3 + 4)", "2 * (3 + 4) = 14")]
    #[case("nonsense", "nonsense")]
    fn test_annotations(#[case] input: &str, #[case] expected: &str) {
        let (mut session, handle, now) = session_with(input);
        settle(&mut session, &handle, now);
        assert_eq!(session.text(), expected);
    }

    #[test]
    fn test_recalculating_unchanged_buffer_is_idempotent() {
        let (mut session, handle, now) = session_with("1+1\n2^10\nx");
        settle(&mut session, &handle, now);
        let first = session.text();

        session.dispatch(Action::Move(Motion::DocumentEnd), now);
        session.dispatch(Action::Insert(" ".to_string()), now);
        session.dispatch(Action::Backspace, now);
        settle(&mut session, &handle, now);

        assert_eq!(session.text(), first);
    }

    #[test]
    fn test_stale_result_is_not_applied_to_edited_line() {
        let (mut session, handle, now) = session_with("");
        type_text(&mut session, "2+2", now);
        let in_flight = handle.last_sent().unwrap();

        // The user keeps typing before the answer arrives
        session.dispatch(Action::Insert("3".to_string()), now);
        handle.respond(in_flight.id, crate::tests::evaluate_all(&in_flight.text));
        session.tick(now);
        assert_eq!(session.text(), "2+23");

        settle(&mut session, &handle, now);
        assert_eq!(session.text(), "2+23 = 25");
    }

    #[test]
    fn test_edited_line_keeps_text_while_others_update() {
        let (mut session, handle, now) = session_with("1+1\n5*5");
        let request = handle.last_sent().unwrap();

        session.dispatch(Action::Insert("0".to_string()), now);
        // Answer the superseded request as if it were current
        handle.respond(
            session.coordinator().current_id(),
            crate::tests::evaluate_all(&request.text),
        );
        session.tick(now);

        assert_eq!(session.text(), "1+1 = 2\n5*50");
    }

    #[test]
    fn test_timeout_leaves_buffer_untouched() {
        let (mut session, handle, start) = session_with("");
        type_text(&mut session, "3!", start);

        let late = start + Duration::from_millis(1500);
        assert_eq!(session.tick(late), TickEvent::TimedOut);
        assert_eq!(session.text(), "3!");
        assert_eq!(handle.spawned(), 2);
        assert_eq!(session.coordinator().restarts(), 1);

        // The next edit uses the fresh channel
        session.dispatch(Action::Insert("+1".to_string()), late);
        settle(&mut session, &handle, late);
        assert_eq!(session.text(), "3!+1 = 7");
    }

    #[test]
    fn test_delete_only_line_leaves_empty_buffer() {
        let (mut session, _handle, now) = session_with("2+2 = 4");

        session.dispatch(Action::DeleteLine, now);

        assert_eq!(session.text(), "");
        assert_eq!(session.caret(), 0);
    }

    #[test]
    fn test_line_ops_are_individually_undoable() {
        let (mut session, _handle, now) = session_with("1\n2");
        let before = session.history().len();

        session.dispatch(Action::DuplicateLine, now);
        assert_eq!(session.text(), "1\n2\n2");
        assert_eq!(session.history().len(), before + 2);

        session.dispatch(Action::Undo, now);
        assert_eq!(session.text(), "1\n2");
        session.dispatch(Action::Redo, now);
        assert_eq!(session.text(), "1\n2\n2");
    }

    #[test]
    fn test_insert_line_before() {
        let (mut session, _handle, now) = session_with("1+1\n2+2");
        session.dispatch(Action::InsertLineBefore, now);
        assert_eq!(session.text(), "1+1\n\n2+2");
        assert_eq!(session.caret(), 4);
    }

    #[test]
    fn test_line_ops_with_selection_pass_through() {
        let (mut session, _handle, now) = session_with("1+1\n2+2");
        session.dispatch(Action::SetSelection(0..3), now);

        assert_eq!(session.dispatch(Action::DeleteLine, now), Outcome::Passthrough);
        assert_eq!(session.dispatch(Action::Clear, now), Outcome::Passthrough);
        assert_eq!(
            session.dispatch(Action::CopyLineResult, now),
            Outcome::Passthrough
        );
        assert_eq!(session.text(), "1+1\n2+2");
    }

    #[test]
    fn test_clear_then_undo() {
        let (mut session, _handle, now) = session_with("1+1 = 2");

        session.dispatch(Action::Clear, now);
        assert_eq!(session.text(), "");
        assert_eq!(session.caret(), 0);

        session.dispatch(Action::Undo, now);
        assert_eq!(session.text(), "1+1 = 2");
        assert_eq!(session.caret(), 7);
    }

    #[test]
    fn test_edit_that_changes_nothing_is_ignored() {
        let (mut session, handle, now) = session_with("");
        let sent = handle.sent().len();

        session.dispatch(Action::Insert(String::new()), now);
        session.dispatch(Action::Clear, now);

        assert_eq!(handle.sent().len(), sent);
        assert_eq!(session.store().get(STORAGE_KEY).unwrap(), None);
        assert!(!session.debounce.is_pending());
    }

    #[test]
    fn test_enter_splits_at_caret() {
        let (mut session, handle, now) = session_with("12+3");
        session.dispatch(Action::SetSelection(2..2), now);

        session.dispatch(Action::SplitLine, now);
        assert_eq!(session.text(), "12\n+3");
        assert_eq!(session.caret(), 3);

        settle(&mut session, &handle, now);
        insta::assert_snapshot!(session.text(), @r"
        12 = 12
        +3 = 3
        ");
    }

    #[test]
    fn test_paste_strips_line_breaks() {
        let (mut session, _handle, now) = session_with("1+");
        session.dispatch(Action::Paste("2\r\n+3\n+4\r".to_string()), now);
        assert_eq!(session.text(), "1+2+3+4");
        assert_eq!(session.caret(), 7);
    }

    #[test]
    fn test_paste_replaces_selection() {
        let (mut session, _handle, now) = session_with("1+99");
        session.dispatch(Action::SetSelection(2..4), now);
        session.dispatch(Action::Paste("5".to_string()), now);
        assert_eq!(session.text(), "1+5");
    }

    #[test]
    fn test_help_is_appended_after_blank_line() {
        let (mut session, handle, now) = session_with("1+1");

        session.dispatch(Action::Help, now);

        let text = session.text();
        assert!(text.starts_with("1+1\n\nconcalc v"));
        assert!(text.ends_with(HELP_TEXT));
        assert_eq!(session.caret(), text.len());

        // Only the first line gets a result
        settle(&mut session, &handle, now);
        assert!(session.text().starts_with("1+1 = 2\n\nconcalc v"));
        assert_eq!(session.text().matches(" = ").count(), 1);
    }

    #[rstest]
    #[case("1+1 = 2", Some("2"))]
    #[case("1+1", None)]
    #[case("x = ", None)]
    #[case("a = b = c", Some("b"))]
    fn test_copy_line_result(#[case] text: &str, #[case] expected: Option<&str>) {
        let (mut session, _handle, now) = session_with(text);
        let outcome = session.dispatch(Action::CopyLineResult, now);
        match expected {
            Some(result) => assert_eq!(outcome, Outcome::CopyRequested(result.to_string())),
            None => assert_eq!(outcome, Outcome::Handled),
        }
    }

    #[test]
    fn test_typing_burst_is_one_undo_step() {
        let (mut session, _handle, start) = session_with("");

        type_text(&mut session, "12", start);
        session.tick(start + Duration::from_millis(600));
        type_text(&mut session, "34", start + Duration::from_millis(700));
        session.tick(start + Duration::from_millis(1300));

        session.dispatch(Action::Undo, start + Duration::from_millis(1400));
        assert_eq!(session.text(), "12");
        session.dispatch(Action::Undo, start + Duration::from_millis(1500));
        assert_eq!(session.text(), "");
    }

    #[test]
    fn test_undo_commits_pending_typing() {
        let (mut session, _handle, now) = session_with("1");

        type_text(&mut session, "23", now);
        session.dispatch(Action::Undo, now);

        assert_eq!(session.text(), "1");
        session.dispatch(Action::Redo, now);
        assert_eq!(session.text(), "123");
    }

    #[test]
    fn test_undo_recalculates_restored_text() {
        let (mut session, handle, now) = session_with("4*4");
        session.dispatch(Action::Clear, now);

        session.dispatch(Action::Undo, now);
        settle(&mut session, &handle, now);

        assert_eq!(session.text(), "4*4 = 16");
        assert_eq!(handle.last_sent().unwrap().text, "4*4");
    }

    #[test]
    fn test_caret_moves_do_not_touch_history() {
        let (mut session, handle, now) = session_with("1\n2\n3");
        let sent = handle.sent().len();

        session.dispatch(Action::Move(Motion::Up), now);
        session.dispatch(Action::Move(Motion::LineStart), now);

        assert_eq!(session.caret(), 2);
        assert_eq!(session.history().len(), 1);
        assert_eq!(handle.sent().len(), sent);
    }

    #[test]
    fn test_viewport_follows_caret() {
        let text = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let (mut session, _handle, now) = session_with(&text);
        session.set_viewport_height(10);
        assert_eq!(session.viewport().top, 20);

        session.dispatch(Action::Move(Motion::DocumentStart), now);
        assert_eq!(session.viewport().top, 0);
    }

    #[test]
    fn test_export_writes_buffer() {
        let dir = tempfile::TempDir::new().unwrap();
        let (session, _handle, _now) = session_with("2+2 = 4");
        let path = dir.path().join("out/doc.txt");

        assert!(session.export(&path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2+2 = 4");
    }
}
