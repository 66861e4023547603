//! # Parser - Precedence Climbing over Tokens
//!
//! Binding strength, loosest first:
//!
//! ```text
//! + -          left associative
//! * / %        left associative, also implicit multiplication: 2pi, 3(4+1)
//! unary + -    so that -2^2 == -(2^2)
//! ^            right associative, exponent may carry its own sign: 2^-1
//! !            postfix factorial
//! ```
//!
//! An identifier directly followed by `(` is a call, anything else is a
//! constant. Call arguments are separated by `;`.
//!
//! Trees taller than [`MAX_DEPTH`] are rejected with `TooDeep`.

use crate::EvalError;
use crate::lexer::{Token, TokenKind, lex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Factorial(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Deepest tree and deepest nesting the parser accepts. Evaluation and
/// drop both recurse over the tree, so anything taller fails with
/// [`EvalError::TooDeep`] instead of exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let node = parser.additive()?;
    match parser.peek() {
        None => Ok(node.expr),
        Some(token) => Err(unexpected(token)),
    }
}

/// An expression together with the height of its tree.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    fn wrap(expr: Expr, child_height: usize) -> Result<Self, EvalError> {
        let height = child_height + 1;
        if height > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(Self { expr, height })
    }
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    /// Current recursion through parentheses, signs and exponents
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Result<Token<'a>, EvalError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), EvalError> {
        let token = self.bump()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(&token))
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.nesting >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn additive(&mut self) -> Result<Node, EvalError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs)?;
        }
    }

    fn term(&mut self) -> Result<Node, EvalError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                // Implicit multiplication: the next operand starts right away
                Some(TokenKind::Ident | TokenKind::LParen) => {
                    let rhs = self.power()?;
                    lhs = binary(BinaryOp::Mul, lhs, rhs)?;
                    continue;
                }
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs)?;
        }
    }

    fn unary(&mut self) -> Result<Node, EvalError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.nested(Self::unary)?;
        Node::wrap(
            Expr::Unary {
                op,
                operand: Box::new(operand.expr),
            },
            operand.height,
        )
    }

    fn power(&mut self) -> Result<Node, EvalError> {
        let base = self.postfix()?;
        if self.peek_kind() == Some(TokenKind::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return binary(BinaryOp::Pow, base, exponent);
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Node, EvalError> {
        let mut node = self.primary()?;
        while self.peek_kind() == Some(TokenKind::Bang) {
            self.pos += 1;
            node = Node::wrap(Expr::Factorial(Box::new(node.expr)), node.height)?;
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<Node, EvalError> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Number => token
                .text
                .parse::<f64>()
                .map(|value| Node::leaf(Expr::Number(value)))
                .map_err(|_| unexpected(&token)),
            TokenKind::Ident => {
                let name = token.text.to_ascii_lowercase();
                if self.peek_kind() == Some(TokenKind::LParen) {
                    self.pos += 1;
                    let (args, height) = self.nested(Self::arguments)?;
                    Node::wrap(Expr::Call { name, args }, height)
                } else {
                    Ok(Node::leaf(Expr::Constant(name)))
                }
            }
            TokenKind::LParen => {
                let inner = self.nested(Self::additive)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(&token)),
        }
    }

    /// Arguments after the opening parenthesis, consuming the closing one.
    /// Also returns the tallest argument's height.
    fn arguments(&mut self) -> Result<(Vec<Expr>, usize), EvalError> {
        let mut args = Vec::new();
        let mut height = 0;
        if self.peek_kind() == Some(TokenKind::RParen) {
            self.pos += 1;
            return Ok((args, height));
        }
        loop {
            let arg = self.additive()?;
            height = height.max(arg.height);
            args.push(arg.expr);
            match self.bump()? {
                Token {
                    kind: TokenKind::Semicolon,
                    ..
                } => continue,
                Token {
                    kind: TokenKind::RParen,
                    ..
                } => return Ok((args, height)),
                other => return Err(unexpected(&other)),
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Node, EvalError> {
    Node::wrap(
        Expr::Binary {
            op,
            lhs: Box::new(lhs.expr),
            rhs: Box::new(rhs.expr),
        },
        lhs.height.max(rhs.height),
    )
}

fn unexpected(token: &Token<'_>) -> EvalError {
    EvalError::UnexpectedToken {
        found: token.text.to_string(),
        at: token.at,
    }
}
