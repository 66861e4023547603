use std::ops::Range;

use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::{Cmd, Patch};

/// The notebook buffer: one rope, one selection, one version counter.
///
/// ## Invariants
/// - `selection.start <= selection.end <= len()`
/// - both selection ends sit on UTF-8 character boundaries
///
/// The caret is `selection.start`. Ranged selections exist (typing replaces
/// them) but line-oriented commands only look at the caret.
///
/// ```rust
/// # use concalc_engine::editing::{Document, Cmd};
/// let mut doc = Document::from_bytes(b"2+2").unwrap();
/// doc.apply(Cmd::SplitLine { at: 3 });
/// assert_eq!(doc.text(), "2+2\n");
/// assert_eq!(doc.caret(), 4);
/// ```
#[derive(Clone)]
pub struct Document {
    /// xi-rope buffer containing the entire notebook as UTF-8 bytes
    pub(crate) buffer: Rope,
    /// Current selection as byte offsets in buffer
    pub(crate) selection: Range<usize>,
    /// Version counter incremented on each edit (enables change detection)
    pub(crate) version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Create a document with the caret at the end of `text`
    pub fn from_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        let len = buffer.len();
        Self {
            buffer,
            selection: len..len,
            version: 0,
        }
    }

    /// Apply a command.
    ///
    /// Both the delta and the new selection are computed against the buffer
    /// *before* the edit: structural line commands need the caret's original
    /// line to place it afterwards.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let delta = self.compile_command(&cmd);
        let new_selection = self.transform_selection_for_command(&self.selection, &cmd);

        // Ranges of the new buffer that differ from the old one; a pure
        // deletion shows up as an empty range where the text was removed
        let mut changed = Vec::new();
        let mut cursor = 0;
        let mut source = 0;
        for op in delta.els.iter() {
            match op {
                xi_rope::delta::DeltaElement::Copy(from, to) => {
                    if *from > source {
                        mark_changed(&mut changed, cursor..cursor);
                    }
                    cursor += to - from;
                    source = *to;
                }
                xi_rope::delta::DeltaElement::Insert(inserted) if !inserted.is_empty() => {
                    let start = cursor;
                    cursor += inserted.len();
                    mark_changed(&mut changed, start..cursor);
                }
                xi_rope::delta::DeltaElement::Insert(_) => {}
            }
        }
        if source < delta.base_len {
            mark_changed(&mut changed, cursor..cursor);
        }

        self.buffer = delta.apply(&self.buffer);
        self.selection = self.clamp_range(new_selection);
        self.version += 1;

        Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }

    /// Replace the whole buffer and put the selection at `selection`
    /// (clamped). Used by merges and history replay.
    pub fn restore(&mut self, text: &str, selection: Range<usize>) -> Patch {
        let mut patch = self.apply(Cmd::ReplaceRange {
            range: 0..self.len(),
            text: text.to_string(),
        });
        self.selection = self.clamp_range(selection);
        patch.new_selection = self.selection.clone();
        patch
    }

    /// Get the current selection range
    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Set the selection range, clamped to the buffer and character boundaries
    pub fn set_selection(&mut self, selection: Range<usize>) {
        self.selection = self.clamp_range(selection);
    }

    /// Caret offset (selection start)
    pub fn caret(&self) -> usize {
        self.selection.start
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.set_selection(caret..caret);
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    /// Get the buffer length in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of lines; an empty buffer has one empty line
    pub fn line_count(&self) -> usize {
        self.text().split('\n').count()
    }

    /// 0-based line index of the caret
    pub fn caret_line(&self) -> usize {
        byte_to_point_in_text(&self.text(), self.caret()).0
    }

    /// Text in `range`, clamped to the buffer
    pub fn slice(&self, range: Range<usize>) -> std::borrow::Cow<'_, str> {
        let doc_len = self.buffer.len();

        // Clamp range to document bounds to prevent xi-rope panic
        let start = range.start.min(doc_len);
        let end = range.end.min(doc_len).max(start);

        self.buffer.slice_to_cow(start..end)
    }

    fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let text = self.text();
        let start = floor_char_boundary(&text, range.start);
        let end = floor_char_boundary(&text, range.end).max(start);
        start..end
    }

    // Forward declarations for methods implemented in other modules
    pub(crate) fn compile_command(&self, cmd: &Cmd) -> Delta<RopeInfo> {
        crate::editing::commands::compile_command(self, cmd)
    }

    pub(crate) fn transform_selection_for_command(
        &self,
        range: &Range<usize>,
        cmd: &Cmd,
    ) -> Range<usize> {
        crate::editing::commands::transform_selection_for_command(self, range, cmd)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.text())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.buffer.to_string() == other.buffer.to_string()
            && self.selection == other.selection
            && self.version == other.version
    }
}

/// Clamp `offset` to `text` and step back to a character boundary
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Convert byte position to (row, column) point in text
pub fn byte_to_point_in_text(text: &str, byte_pos: usize) -> (usize, usize) {
    let clamped_pos = byte_pos.min(text.len());
    let mut row = 0;
    let mut col = 0;

    for (i, ch) in text.char_indices() {
        if i >= clamped_pos {
            break;
        }
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += ch.len_utf8();
        }
    }

    (row, col)
}

/// Record `range`, joining it onto the previous range when they touch.
fn mark_changed(changed: &mut Vec<Range<usize>>, range: Range<usize>) {
    if let Some(last) = changed.last_mut().filter(|last| last.end == range.start) {
        last.end = range.end;
    } else {
        changed.push(range);
    }
}
