//! # concalc-syntax
//!
//! The arithmetic language of a concalc line: a [Logos] lexer, a
//! precedence-climbing parser producing a small [`Expr`] tree, an `f64`
//! evaluator and the fixed-precision result formatter.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Pipeline
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Expr → eval → f64 → format_value
//!               (Logos)          (precedence climbing)
//! ```
//!
//! The editing engine treats this crate as an opaque `evaluate`/`format`
//! pair. It never sees tokens or trees, only a value or an [`EvalError`].
//!
//! ## Example
//!
//! ```
//! use concalc_syntax::{evaluate, format_value};
//!
//! let value = evaluate("10/3").unwrap();
//! assert_eq!(format_value(value, 10), "3.3333333333");
//!
//! assert!(evaluate("2+").is_err());
//! ```

pub mod error;
pub mod eval;
pub mod format;
pub mod lexer;
pub mod parser;

pub use error::EvalError;
pub use eval::eval;
pub use format::format_value;
pub use lexer::{Token, TokenKind, lex};
pub use parser::{BinaryOp, Expr, UnaryOp, parse};

/// Parse and evaluate `src` in one step.
pub fn evaluate(src: &str) -> Result<f64, EvalError> {
    let expr = parse(src)?;
    eval(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2+2", "4")]
    #[case("10/3", "3.3333333333")]
    #[case("1.5+1.5", "3")]
    #[case("0.1+0.2", "0.3")]
    #[case("2^10", "1024")]
    #[case("-2^2", "-4")]
    #[case("2^3^2", "512")]
    #[case("5!", "120")]
    #[case("2pi", "6.2831853072")]
    #[case("3(4+1)", "15")]
    #[case("sqrt(16)+abs(-3)", "7")]
    #[case("max(1;7;3)", "7")]
    #[case("log(8;2)", "3")]
    #[case("10%4", "2")]
    #[case("1e3/4", "250")]
    #[case(".5*4", "2")]
    fn test_evaluate_and_format(#[case] src: &str, #[case] expected: &str) {
        let value = evaluate(src).unwrap();
        assert_eq!(format_value(value, 10), expected);
    }

    #[rstest]
    #[case("")]
    #[case("2+")]
    #[case("(1+2")]
    #[case("1/0")]
    #[case("foo")]
    #[case("sqrt(-1)")]
    #[case("2#3")]
    #[case("(-1)!")]
    fn test_evaluate_errors(#[case] src: &str) {
        assert!(evaluate(src).is_err(), "expected `{src}` to fail");
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let src = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate(&src), Err(EvalError::TooDeep));
    }
}
