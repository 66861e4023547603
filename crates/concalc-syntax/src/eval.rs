use std::f64::consts;

use crate::EvalError;
use crate::parser::{BinaryOp, Expr, UnaryOp};

const MAX_FACTORIAL: f64 = 170.0;

/// Evaluate a parsed expression. Intermediate infinities are allowed
/// (`1/(1/0)` is 0), only the final value must be finite.
pub fn eval(expr: &Expr) -> Result<f64, EvalError> {
    let value = eval_inner(expr)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}

fn eval_inner(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Constant(name) => constant(name),
        Expr::Unary { op, operand } => {
            let value = eval_inner(operand)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Neg => -value,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_inner(lhs)?;
            let rhs = eval_inner(rhs)?;
            Ok(match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => lhs / rhs,
                // Result takes the sign of the divisor, like a mathematical modulo
                BinaryOp::Rem => lhs - rhs * (lhs / rhs).floor(),
                BinaryOp::Pow => lhs.powf(rhs),
            })
        }
        Expr::Factorial(operand) => factorial(eval_inner(operand)?),
        Expr::Call { name, args } => {
            let args = args.iter().map(eval_inner).collect::<Result<Vec<_>, _>>()?;
            call(name, &args)
        }
    }
}

fn constant(name: &str) -> Result<f64, EvalError> {
    match name {
        "pi" => Ok(consts::PI),
        "e" => Ok(consts::E),
        "tau" => Ok(consts::TAU),
        "phi" => Ok((1.0 + 5f64.sqrt()) / 2.0),
        _ => Err(EvalError::UnknownIdentifier(name.to_string())),
    }
}

fn factorial(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 || n.fract() != 0.0 || n > MAX_FACTORIAL {
        return Err(EvalError::Factorial);
    }
    Ok((2..=n as u32).fold(1.0, |acc, k| acc * k as f64))
}

fn call(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let unary: Option<fn(f64) -> f64> = match name {
        "sqrt" => Some(f64::sqrt),
        "cbrt" => Some(f64::cbrt),
        "abs" => Some(f64::abs),
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "asin" => Some(f64::asin),
        "acos" => Some(f64::acos),
        "atan" => Some(f64::atan),
        "sinh" => Some(f64::sinh),
        "cosh" => Some(f64::cosh),
        "tanh" => Some(f64::tanh),
        "ln" => Some(f64::ln),
        "log10" => Some(f64::log10),
        "log2" => Some(f64::log2),
        "exp" => Some(f64::exp),
        "floor" => Some(f64::floor),
        "ceil" => Some(f64::ceil),
        "round" => Some(f64::round),
        "sign" => Some(sign),
        _ => None,
    };
    if let Some(f) = unary {
        return match args {
            [x] => Ok(f(*x)),
            _ => Err(arity(name, "1", args.len())),
        };
    }

    match name {
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.ln() / base.ln()),
            _ => Err(arity(name, "1 or 2", args.len())),
        },
        "min" | "max" if args.is_empty() => Err(arity(name, "at least 1", 0)),
        "min" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        "max" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn sign(x: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x.signum() }
}

fn arity(name: &str, expected: &'static str, found: usize) -> EvalError {
    EvalError::Arity {
        name: name.to_string(),
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use rstest::rstest;

    fn run(src: &str) -> Result<f64, EvalError> {
        eval(&parse(src).unwrap())
    }

    #[rstest]
    #[case("7%3", 1.0)]
    #[case("-7%3", 2.0)]
    #[case("0!", 1.0)]
    #[case("3!!", 720.0)]
    #[case("sign(-4)", -1.0)]
    #[case("sign(0)", 0.0)]
    #[case("1/(1/0)", 0.0)]
    #[case("min(4;2;9)", 2.0)]
    fn test_eval_values(#[case] src: &str, #[case] expected: f64) {
        assert_eq!(run(src).unwrap(), expected);
    }

    #[test]
    fn test_constants() {
        assert_eq!(run("pi").unwrap(), consts::PI);
        assert_eq!(run("E").unwrap(), consts::E);
        assert_eq!(run("x"), Err(EvalError::UnknownIdentifier("x".to_string())));
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(run("nope(1)"), Err(EvalError::UnknownFunction("nope".to_string())));
        assert_eq!(
            run("sqrt(1;2)"),
            Err(EvalError::Arity {
                name: "sqrt".to_string(),
                expected: "1",
                found: 2
            })
        );
        assert!(matches!(run("max()"), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn test_factorial_limits() {
        assert!(run("170!").is_ok());
        assert_eq!(run("171!"), Err(EvalError::Factorial));
        assert_eq!(run("2.5!"), Err(EvalError::Factorial));
    }

    #[test]
    fn test_non_finite_results() {
        assert_eq!(run("1/0"), Err(EvalError::NonFinite));
        assert_eq!(run("0/0"), Err(EvalError::NonFinite));
        assert_eq!(run("ln(-1)"), Err(EvalError::NonFinite));
    }
}
