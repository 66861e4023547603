use thiserror::Error;

/// Everything that can go wrong between source text and a finite value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("invalid token `{text}` at {at}")]
    InvalidToken { text: String, at: usize },

    #[error("unexpected `{found}` at {at}")]
    UnexpectedToken { found: String, at: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{name}` expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("factorial is only defined for integers from 0 to 170")]
    Factorial,

    #[error("expression is nested too deeply")]
    TooDeep,

    #[error("result is not a finite number")]
    NonFinite,
}
