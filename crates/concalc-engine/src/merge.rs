//! Reconciles an asynchronous result batch with the *current* buffer.
//!
//! A result is adopted line by line, and only where the line's expression is
//! still the one that was sent. Lines the user touched since the dispatch keep
//! their current text; the next dispatch will annotate them.

use log::debug;

use crate::editing::document::floor_char_boundary;
use crate::editing::line::{expression_of, line_start};
use crate::editing::{Document, byte_to_point_in_text};

/// Merge `results` into `current`. Returns the new text, or `None` when the
/// line counts differ (the whole batch is void) or nothing changed.
pub fn merge_lines(current: &str, results: &[String]) -> Option<String> {
    let lines: Vec<&str> = current.split('\n').collect();
    if lines.len() != results.len() {
        debug!(
            "Discarding calculation batch: {} results for {} lines",
            results.len(),
            lines.len()
        );
        return None;
    }

    let mut changed = false;
    let merged: Vec<&str> = lines
        .iter()
        .zip(results)
        .map(|(line, result)| {
            if expression_of(line) == expression_of(result) && *line != result.as_str() {
                changed = true;
                result.as_str()
            } else {
                *line
            }
        })
        .collect();

    changed.then(|| merged.join("\n"))
}

/// Apply a result batch to the document, keeping the caret on its line.
///
/// Each selection end keeps its (line, column) position with the column
/// clamped to the merged line. On the caret's own line this is the raw
/// offset; on lines above it, appended or removed annotations no longer
/// drag the caret onto a neighbouring line.
pub fn apply_results(doc: &mut Document, results: &[String]) -> bool {
    let text = doc.text();
    let Some(merged) = merge_lines(&text, results) else {
        return false;
    };

    let selection = doc.selection();
    let start = reanchor(&text, &merged, selection.start);
    let end = reanchor(&text, &merged, selection.end);
    doc.restore(&merged, start..end.max(start));
    true
}

fn reanchor(old: &str, new: &str, offset: usize) -> usize {
    let (row, column) = byte_to_point_in_text(old, offset);
    let start = line_start(new, row);
    let line_len = new[start..].split('\n').next().map_or(0, str::len);
    floor_char_boundary(new, start + column.min(line_len))
}
