//! Tree-walking evaluator.
//!
//! Evaluation sees exactly two things: the syntax tree and the caller's
//! [`Bindings`]. Every intermediate result must be a finite real number.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::EvalError;
use crate::function::{Function, PowError, pow};

/// Source of values for a formula's free variables.
pub trait Bindings {
    /// Value bound to `name`, or `None` if the name is unbound.
    fn lookup(&self, name: &str) -> Option<f64>;
}

/// No variables at all.
impl Bindings for () {
    fn lookup(&self, _name: &str) -> Option<f64> {
        None
    }
}

impl<S: BuildHasher> Bindings for HashMap<String, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> Bindings for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.as_slice().lookup(name)
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn lookup(&self, name: &str) -> Option<f64> {
        (**self).lookup(name)
    }
}

/// Evaluation failure paired with the node that produced it.
pub(crate) type Failure<'e> = (EvalError, &'e Expr);

pub(crate) fn eval<'e, B: Bindings + ?Sized>(
    expr: &'e Expr,
    bindings: &B,
) -> Result<f64, Failure<'e>> {
    let value = match expr {
        Expr::Number(value) => *value,
        Expr::Variable(name) => bindings.lookup(name).ok_or_else(|| {
            (
                EvalError::UnboundVariable { name: name.clone() },
                expr,
            )
        })?,
        Expr::Unary { op, operand } => {
            let value = eval(operand, bindings)?;
            unary(*op, value).map_err(|e| (e, expr))?
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, bindings)?;
            let rhs = eval(rhs, bindings)?;
            binary(*op, lhs, rhs).map_err(|e| (e, expr))?
        }
        Expr::Call { function, args } => {
            let function = Function::resolve(function).map_err(|e| (e, expr))?;
            let values = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(&values).map_err(|e| (e, expr))?
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err((EvalError::NonFinite, expr))
    }
}

fn unary(op: UnaryOp, value: f64) -> Result<f64, EvalError> {
    match op {
        UnaryOp::Plus => Ok(value),
        UnaryOp::Minus => Ok(-value),
        UnaryOp::Invert => {
            let n = integral(value, UnaryOp::Invert.symbol())?;
            Ok(!n as f64)
        }
    }
}

fn binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let by_zero = || EvalError::DivisionByZero { operator: op };

    let value = match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => {
            if rhs == 0.0 {
                return Err(by_zero());
            }
            lhs / rhs
        }
        BinaryOp::FloorDiv => {
            if rhs == 0.0 {
                return Err(by_zero());
            }
            (lhs / rhs).floor()
        }
        BinaryOp::Mod => {
            if rhs == 0.0 {
                return Err(by_zero());
            }
            // Result takes the sign of the divisor.
            let rem = lhs % rhs;
            if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
                rem + rhs
            } else {
                rem
            }
        }
        BinaryOp::Pow => match pow(lhs, rhs) {
            Ok(value) => value,
            Err(PowError::ZeroToNegative) => return Err(by_zero()),
            Err(PowError::Complex) => {
                return Err(EvalError::Domain {
                    function: op.symbol().to_string(),
                });
            }
        },
        BinaryOp::BitOr => {
            let (a, b) = operands(op, lhs, rhs)?;
            (a | b) as f64
        }
        BinaryOp::BitAnd => {
            let (a, b) = operands(op, lhs, rhs)?;
            (a & b) as f64
        }
        BinaryOp::BitXor => {
            let (a, b) = operands(op, lhs, rhs)?;
            (a ^ b) as f64
        }
        BinaryOp::Shl => {
            let (a, shift) = shift_operands(op, lhs, rhs)?;
            let shifted = a
                .checked_shl(shift)
                .filter(|shifted| shifted >> shift == a)
                .ok_or(EvalError::InvalidShift { operator: op })?;
            shifted as f64
        }
        BinaryOp::Shr => {
            let (a, shift) = shift_operands(op, lhs, rhs)?;
            // Shifting past the width leaves only the sign.
            a.checked_shr(shift).unwrap_or(if a < 0 { -1 } else { 0 }) as f64
        }
    };
    Ok(value)
}

fn operands(op: BinaryOp, lhs: f64, rhs: f64) -> Result<(i64, i64), EvalError> {
    Ok((integral(lhs, op.symbol())?, integral(rhs, op.symbol())?))
}

fn shift_operands(op: BinaryOp, lhs: f64, rhs: f64) -> Result<(i64, u32), EvalError> {
    let (value, shift) = operands(op, lhs, rhs)?;
    let shift = u32::try_from(shift).map_err(|_| EvalError::InvalidShift { operator: op })?;
    Ok((value, shift))
}

/// Converts an operand of a bitwise operator to an integer.
fn integral(value: f64, operator: &str) -> Result<i64, EvalError> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53

    if value.fract() != 0.0 || value.abs() > LIMIT {
        return Err(EvalError::NonIntegral {
            operator: operator.to_string(),
        });
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(source: &str, bindings: &impl Bindings) -> Result<f64, EvalError> {
        let tokens = Lexer::new(source).tokenize().expect("tokenize");
        let expr = Parser::new(tokens, 64).parse().expect("parse");
        eval(&expr, bindings).map_err(|(e, _)| e)
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(run("2**3 - 1", &()), Ok(7.0));
        assert_eq!(run("-2 ** 2", &()), Ok(-4.0));
        assert_eq!(run("2 ** -1", &()), Ok(0.5));
        assert_eq!(run("1 + 2 * 3 - 4 / 2", &()), Ok(5.0));
    }

    #[test]
    fn floor_division_and_modulo_round_toward_negative_infinity() {
        assert_eq!(run("7 // 5", &()), Ok(1.0));
        assert_eq!(run("-7 // 5", &()), Ok(-2.0));
        assert_eq!(run("-7 % 5", &()), Ok(3.0));
        assert_eq!(run("7 % -5", &()), Ok(-3.0));
    }

    #[test]
    fn bitwise_operators_need_integral_operands() {
        assert_eq!(run("6 | 1", &()), Ok(7.0));
        assert_eq!(run("6 & 3", &()), Ok(2.0));
        assert_eq!(run("6 ^ 3", &()), Ok(5.0));
        assert_eq!(run("1 << 4", &()), Ok(16.0));
        assert_eq!(run("-16 >> 2", &()), Ok(-4.0));
        assert_eq!(run("~5", &()), Ok(-6.0));
        assert!(matches!(
            run("1.5 | 1", &()),
            Err(EvalError::NonIntegral { .. })
        ));
        assert!(matches!(
            run("1 << -1", &()),
            Err(EvalError::InvalidShift { .. })
        ));
    }

    #[test]
    fn division_by_zero_fails() {
        for source in ["1 / 0", "1 // 0", "1 % 0", "0 ** -1"] {
            assert!(
                matches!(run(source, &()), Err(EvalError::DivisionByZero { .. })),
                "{source}"
            );
        }
    }

    #[test]
    fn variables_resolve_from_bindings() {
        let bindings = [("SPEED", 7.0), ("base_value", 2.0)];
        assert_eq!(run("base_value * 3 + SPEED // 5", &bindings), Ok(7.0));
        assert_eq!(
            run("MISSING + 1", &bindings),
            Err(EvalError::UnboundVariable {
                name: "MISSING".into()
            })
        );
    }

    #[test]
    fn calls_dispatch_to_whitelist() {
        assert_eq!(run("max(1, sqrt(16), 3)", &()), Ok(4.0));
        assert_eq!(
            run("system(1)", &()),
            Err(EvalError::UnknownFunction {
                name: "system".into()
            })
        );
    }

    #[test]
    fn overflow_is_not_finite() {
        assert_eq!(run("10 ** 400", &()), Err(EvalError::NonFinite));
    }

    #[test]
    fn negative_base_with_fractional_exponent_is_a_domain_error() {
        assert!(matches!(
            run("(-8) ** 0.5", &()),
            Err(EvalError::Domain { .. })
        ));
    }
}
