//! Line-level reading of the buffer.
//!
//! Splitting on the *first* [`SEPARATOR`] is authoritative. An expression that
//! itself contains `" = "` does not round-trip; that is a known limitation.

/// Separator between a line's expression and its computed result.
pub const SEPARATOR: &str = " = ";

/// The text before the first separator, or the whole line.
pub fn expression_of(line: &str) -> &str {
    line.split_once(SEPARATOR).map_or(line, |(expression, _)| expression)
}

/// The text between the first and second separator, if any.
pub fn result_of(line: &str) -> Option<&str> {
    line.split(SEPARATOR).nth(1)
}

/// Where a caret offset falls in the line structure of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLocation {
    /// 0-based line index
    pub index: usize,
    /// Byte offset of the line's first character
    pub start: usize,
    /// Caret offset minus `start`
    pub column: usize,
}

/// Walk the lines accumulating `len + 1` per line until the running sum
/// reaches the caret. A caret sitting right after a line's last character
/// belongs to that line, not the next one.
pub fn locate_line(text: &str, caret: usize) -> LineLocation {
    let mut start = 0;
    let mut last = LineLocation {
        index: 0,
        start: 0,
        column: 0,
    };

    for (index, line) in text.split('\n').enumerate() {
        if start + line.len() >= caret {
            return LineLocation {
                index,
                start,
                column: caret.saturating_sub(start),
            };
        }
        last = LineLocation {
            index,
            start,
            column: line.len(),
        };
        start += line.len() + 1;
    }

    // Caret past the end of the text: clamp to the end of the last line
    last
}

/// Byte offset where line `index` starts, or the text length if there is no
/// such line.
pub fn line_start(text: &str, index: usize) -> usize {
    text.split('\n')
        .take(index)
        .map(|line| line.len() + 1)
        .sum::<usize>()
        .min(text.len())
}
