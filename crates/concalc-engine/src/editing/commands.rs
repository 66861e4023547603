use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::Document;
use crate::editing::line::{LineLocation, locate_line};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    /// Insert a line break at `at`, splitting the line there
    SplitLine {
        at: usize,
    },
    /// Insert a blank line before the line containing `at`
    InsertLineBefore {
        at: usize,
    },
    /// Copy the line containing `at` right below itself
    DuplicateLine {
        at: usize,
    },
    /// Remove the line containing `at` together with one line break
    DeleteLine {
        at: usize,
    },
    /// Empty the whole buffer
    Clear,
}

/// The line holding `at` and its text, read from the pre-edit buffer
fn active_line(doc: &Document, at: usize) -> (LineLocation, String, usize) {
    let text = doc.text();
    let location = locate_line(&text, at);
    let line = text[location.start..]
        .split('\n')
        .next()
        .unwrap_or_default()
        .to_string();
    let line_count = text.split('\n').count();
    (location, line, line_count)
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    let mut builder = Builder::new(doc.len());
    match cmd {
        Cmd::InsertText { at, text } => {
            builder.replace(*at..*at, Rope::from(text));
        }
        Cmd::DeleteRange { range } => {
            builder.delete(range.clone());
        }
        Cmd::ReplaceRange { range, text } => {
            builder.replace(range.clone(), Rope::from(text));
        }
        Cmd::SplitLine { at } => {
            builder.replace(*at..*at, Rope::from("\n"));
        }
        Cmd::InsertLineBefore { at } => {
            let (location, _, _) = active_line(doc, *at);
            builder.replace(location.start..location.start, Rope::from("\n"));
        }
        Cmd::DuplicateLine { at } => {
            let (location, line, _) = active_line(doc, *at);
            let line_end = location.start + line.len();
            builder.replace(line_end..line_end, Rope::from(format!("\n{line}")));
        }
        Cmd::DeleteLine { at } => {
            let (location, line, line_count) = active_line(doc, *at);
            let line_end = location.start + line.len();
            let range = if line_count == 1 {
                0..doc.len()
            } else if location.index + 1 == line_count {
                // Last line: take the break that precedes it
                (location.start - 1)..line_end
            } else {
                location.start..(line_end + 1)
            };
            builder.delete(range);
        }
        Cmd::Clear => {
            builder.delete(0..doc.len());
        }
    }
    builder.build()
}

/// Transform selection based on the command being applied.
///
/// Text commands shift the selection like any insertion or deletion would.
/// Line commands collapse it to a caret derived from the caret's line index.
pub(crate) fn transform_selection_for_command(
    doc: &Document,
    range: &Range<usize>,
    cmd: &Cmd,
) -> Range<usize> {
    match cmd {
        Cmd::InsertText { at, text } => {
            let text_len = text.len();
            if *at <= range.start {
                (range.start + text_len)..(range.end + text_len)
            } else if *at < range.end {
                // Insertion is within selection - grow the end
                range.start..(range.end + text_len)
            } else {
                range.clone()
            }
        }
        Cmd::DeleteRange { range: del_range } => {
            let del_len = del_range.len();
            if del_range.end <= range.start {
                (range.start - del_len)..(range.end - del_len)
            } else if del_range.start >= range.end {
                range.clone()
            } else {
                // Deletion overlaps with selection - collapse to deletion point
                del_range.start..del_range.start
            }
        }
        Cmd::ReplaceRange {
            range: replace_range,
            text,
        } => {
            let del_len = replace_range.len();
            let insert_len = text.len();

            if replace_range.end <= range.start && replace_range.start < range.start {
                let start = range.start - del_len + insert_len;
                let end = range.end - del_len + insert_len;
                start..end
            } else if replace_range.start >= range.end && replace_range.start > range.start {
                range.clone()
            } else {
                // Replacement touches the selection - caret goes after the new text
                let caret = replace_range.start + insert_len;
                caret..caret
            }
        }
        Cmd::SplitLine { at } => (at + 1)..(at + 1),
        Cmd::InsertLineBefore { at } => {
            let (location, _, _) = active_line(doc, *at);
            location.start..location.start
        }
        Cmd::DuplicateLine { at } => {
            let (location, line, _) = active_line(doc, *at);
            let line_end = location.start + line.len();
            line_end..line_end
        }
        Cmd::DeleteLine { at } => {
            let (location, _, line_count) = active_line(doc, *at);
            let caret = if line_count == 1 {
                0
            } else if location.index + 1 == line_count {
                // Deleted the last line: clamp to the new document end
                location.start - 1
            } else {
                location.start
            };
            caret..caret
        }
        Cmd::Clear => 0..0,
    }
}
