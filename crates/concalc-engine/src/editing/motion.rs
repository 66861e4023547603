use crate::editing::Document;
use crate::editing::document::floor_char_boundary;
use crate::editing::line::{line_start, locate_line};

/// Caret movements. Every motion collapses a ranged selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
    /// Move up by a number of lines
    PageUp(usize),
    /// Move down by a number of lines
    PageDown(usize),
}

impl Document {
    pub fn move_caret(&mut self, motion: Motion) {
        let text = self.text();
        let caret = self.caret();
        let target = match motion {
            Motion::Left => prev_char_boundary(&text, caret),
            Motion::Right => next_char_boundary(&text, caret),
            Motion::Up => vertical(&text, caret, -1),
            Motion::Down => vertical(&text, caret, 1),
            Motion::PageUp(lines) => vertical(&text, caret, -(lines.max(1) as isize)),
            Motion::PageDown(lines) => vertical(&text, caret, lines.max(1) as isize),
            Motion::LineStart => locate_line(&text, caret).start,
            Motion::LineEnd => {
                let location = locate_line(&text, caret);
                location.start + line_len(&text, location.start)
            }
            Motion::DocumentStart => 0,
            Motion::DocumentEnd => text.len(),
        };
        self.set_caret(target);
    }

    /// Offset of the character boundary before the caret, if any
    pub(crate) fn prev_boundary(&self) -> Option<usize> {
        let caret = self.caret();
        (caret > 0).then(|| prev_char_boundary(&self.text(), caret))
    }

    /// Offset of the character boundary after the caret, if any
    pub(crate) fn next_boundary(&self) -> Option<usize> {
        let caret = self.caret();
        (caret < self.len()).then(|| next_char_boundary(&self.text(), caret))
    }
}

fn line_len(text: &str, start: usize) -> usize {
    text[start..].split('\n').next().map_or(0, str::len)
}

fn prev_char_boundary(text: &str, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    floor_char_boundary(text, offset - 1)
}

fn next_char_boundary(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .next()
        .map_or(offset, |ch| offset + ch.len_utf8())
}

/// Move `delta` lines keeping the byte column, clamped to the target line.
/// Moving above the first line lands at the document start, below the last
/// line at the document end.
fn vertical(text: &str, caret: usize, delta: isize) -> usize {
    let location = locate_line(text, caret);
    let line_count = text.split('\n').count();
    let target = location.index as isize + delta;
    if target < 0 {
        return 0;
    }
    let target = target as usize;
    if target >= line_count {
        return text.len();
    }
    let start = line_start(text, target);
    let column = location.column.min(line_len(text, start));
    floor_char_boundary(text, start + column)
}
