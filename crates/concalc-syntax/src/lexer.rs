//! # Lexer - Tokenizing Expression Source
//!
//! The first stage of evaluation: break a line's expression into tokens with
//! the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! Unlike a lossless Markdown lexer, this one discards whitespace. The engine
//! strips whitespace before evaluating anyway, so `2 3` and `23` must lex the
//! same way in both paths.
//!
//! ```
//! use concalc_syntax::lexer::{lex, TokenKind};
//!
//! let tokens = lex("2*pi").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Star, TokenKind::Ident]);
//! ```

use logos::Logos;

use crate::EvalError;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `12`, `1.5`, `1.`, `.5`, `1e-3`
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,

    /// Constant or function name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("^")]
    Caret,

    #[token("!")]
    Bang,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// Function argument separator. Commas are decimal separators in
    /// concalc, so they never reach the lexer.
    #[token(";")]
    Semicolon,
}

/// A token with its kind, source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub at: usize,
}

/// Tokenize `input`, failing on the first character no token matches.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, EvalError> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let at = lexer.span().start;
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice(),
                at,
            }),
            Err(()) => {
                return Err(EvalError::InvalidToken {
                    text: lexer.slice().to_string(),
                    at,
                });
            }
        }
    }

    Ok(tokens)
}
