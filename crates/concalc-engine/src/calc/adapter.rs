use concalc_syntax::{evaluate, format_value};

use crate::editing::line::{SEPARATOR, expression_of};

/// Default number of fractional digits before trailing zeros are trimmed
pub const DEFAULT_PRECISION: usize = 10;

/// Wraps the expression evaluator: one stateless pure function per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEvaluator {
    precision: usize,
}

impl Default for LineEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl LineEvaluator {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Annotate one line.
    ///
    /// - blank line or blank expression: the text before the first separator
    /// - evaluation failure: the bare expression, any stale result dropped
    /// - success: `expression = value`
    ///
    /// Decimal commas become points and whitespace is removed for evaluation
    /// only; the displayed expression keeps what the user typed.
    pub fn evaluate_line(&self, line: &str) -> String {
        let expression = expression_of(line);
        if line.trim().is_empty() || expression.trim().is_empty() {
            return expression.to_string();
        }

        let normalized: String = expression
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        match evaluate(&normalized) {
            Ok(value) => format!(
                "{expression}{SEPARATOR}{}",
                format_value(value, self.precision)
            ),
            Err(_) => expression.to_string(),
        }
    }

    /// Annotate every `'\n'`-separated line; the result is position-aligned
    /// with the input lines.
    pub fn evaluate_text(&self, text: &str) -> Vec<String> {
        text.split('\n').map(|line| self.evaluate_line(line)).collect()
    }
}
