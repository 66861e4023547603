use std::ops::Range;

/// Vertical scroll state of the editing surface, in lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line
    pub top: usize,
    /// Number of visible lines
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self { top: 0, height }
    }

    /// Scroll the minimum needed for `caret_line` to be visible. A caret
    /// above the view becomes the first row, one below it the last row, so a
    /// caret on the final line scrolls the view fully to the bottom.
    pub fn scroll_to_caret(&mut self, caret_line: usize, line_count: usize) {
        if self.height == 0 {
            return;
        }
        if caret_line < self.top {
            self.top = caret_line;
        } else if caret_line + 1 > self.top + self.height {
            self.top = caret_line + 1 - self.height;
        }
        // Content shrank below the view
        let max_top = line_count.saturating_sub(self.height);
        if self.top > max_top && caret_line >= max_top {
            self.top = max_top;
        }
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
    }

    /// Line indices currently on screen
    pub fn visible(&self, line_count: usize) -> Range<usize> {
        let start = self.top.min(line_count);
        start..(self.top + self.height).min(line_count)
    }
}
