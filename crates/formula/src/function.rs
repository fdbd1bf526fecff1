//! Whitelisted math functions.
//!
//! A call resolves its name against [`Function`]; any other name is an
//! evaluation error. All functions are real-valued: inputs outside a
//! function's domain (or results that overflow) are reported as
//! [`EvalError::Domain`] instead of producing NaN or infinity.

use std::str::FromStr;

use crate::error::EvalError;

/// Number of arguments a function accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Between(min, max) => (min..=max).contains(&count),
            Self::AtLeast(min) => count >= min,
        }
    }

    fn describe(self) -> String {
        match self {
            Self::Exact(n) => n.to_string(),
            Self::Between(min, max) => format!("{min} to {max}"),
            Self::AtLeast(min) => format!("at least {min}"),
        }
    }
}

/// The complete set of callable names.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Function {
    Abs,
    Fabs,
    Sqrt,
    Exp,
    #[strum(to_string = "expm1")]
    Expm1,
    Log,
    #[strum(to_string = "log2")]
    Log2,
    #[strum(to_string = "log10")]
    Log10,
    #[strum(to_string = "log1p")]
    Log1p,
    Pow,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    #[strum(to_string = "atan2")]
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Hypot,
    Degrees,
    Radians,
    Floor,
    Ceil,
    Trunc,
    Round,
    Copysign,
    Fmod,
    Min,
    Max,
}

impl Function {
    /// Resolves a called name, failing for anything off the whitelist.
    pub fn resolve(name: &str) -> Result<Self, EvalError> {
        Self::from_str(name).map_err(|_| EvalError::UnknownFunction {
            name: name.to_string(),
        })
    }

    pub const fn arity(self) -> Arity {
        match self {
            Self::Log | Self::Round => Arity::Between(1, 2),
            Self::Pow | Self::Atan2 | Self::Hypot | Self::Copysign | Self::Fmod => Arity::Exact(2),
            Self::Min | Self::Max => Arity::AtLeast(1),
            _ => Arity::Exact(1),
        }
    }

    /// Applies the function to already-evaluated arguments.
    pub fn call(self, args: &[f64]) -> Result<f64, EvalError> {
        let arity = self.arity();
        if !arity.accepts(args.len()) {
            return Err(EvalError::Arity {
                name: self.to_string(),
                expected: arity.describe(),
                found: args.len(),
            });
        }

        let x = args[0];
        let y = args.get(1).copied();
        let domain = || EvalError::Domain {
            function: self.to_string(),
        };

        let result = match self {
            Self::Abs | Self::Fabs => x.abs(),
            Self::Sqrt => x.sqrt(),
            Self::Exp => x.exp(),
            Self::Expm1 => x.exp_m1(),
            Self::Log => match y {
                None => x.ln(),
                Some(base) if base <= 0.0 || base == 1.0 => return Err(domain()),
                Some(base) => x.ln() / base.ln(),
            },
            Self::Log2 => x.log2(),
            Self::Log10 => x.log10(),
            Self::Log1p => x.ln_1p(),
            Self::Pow => pow(x, args[1]).map_err(|_| domain())?,
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Atan2 => x.atan2(args[1]),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Asinh => x.asinh(),
            Self::Acosh => x.acosh(),
            Self::Atanh => x.atanh(),
            Self::Hypot => x.hypot(args[1]),
            Self::Degrees => x.to_degrees(),
            Self::Radians => x.to_radians(),
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
            Self::Trunc => x.trunc(),
            Self::Round => match y {
                None => x.round_ties_even(),
                Some(digits) if digits.fract() != 0.0 => return Err(domain()),
                Some(digits) => {
                    let scale = 10f64.powf(digits);
                    (x * scale).round_ties_even() / scale
                }
            },
            Self::Copysign => x.copysign(args[1]),
            Self::Fmod => {
                if args[1] == 0.0 {
                    return Err(domain());
                }
                x % args[1]
            }
            Self::Min => args.iter().copied().fold(x, f64::min),
            Self::Max => args.iter().copied().fold(x, f64::max),
        };

        if result.is_finite() {
            Ok(result)
        } else {
            Err(domain())
        }
    }
}

/// Real-valued exponentiation shared by `**` and `pow()`.
///
/// A zero base with a negative exponent and a negative base with a
/// fractional exponent have no real result.
pub(crate) fn pow(base: f64, exponent: f64) -> Result<f64, PowError> {
    if base == 0.0 && exponent < 0.0 {
        return Err(PowError::ZeroToNegative);
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(PowError::Complex);
    }
    Ok(base.powf(exponent))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PowError {
    ZeroToNegative,
    Complex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_whitelisted_names_only() {
        assert_eq!(Function::resolve("sqrt"), Ok(Function::Sqrt));
        assert_eq!(Function::resolve("log10"), Ok(Function::Log10));
        assert_eq!(
            Function::resolve("__import__"),
            Err(EvalError::UnknownFunction {
                name: "__import__".into()
            })
        );
        assert!(Function::resolve("SQRT").is_err());
    }

    #[test]
    fn checks_arity() {
        assert!(matches!(
            Function::Sqrt.call(&[1.0, 2.0]),
            Err(EvalError::Arity { found: 2, .. })
        ));
        assert!(matches!(
            Function::Max.call(&[]),
            Err(EvalError::Arity { found: 0, .. })
        ));
    }

    #[test]
    fn reports_domain_errors() {
        assert_eq!(
            Function::Sqrt.call(&[-1.0]),
            Err(EvalError::Domain {
                function: "sqrt".into()
            })
        );
        assert!(Function::Log.call(&[0.0]).is_err());
        assert!(Function::Acos.call(&[2.0]).is_err());
        assert!(Function::Exp.call(&[1000.0]).is_err());
    }

    #[test]
    fn round_uses_half_even() {
        assert_eq!(Function::Round.call(&[2.5]), Ok(2.0));
        assert_eq!(Function::Round.call(&[3.5]), Ok(4.0));
        assert_eq!(Function::Round.call(&[1.25, 1.0]), Ok(1.2));
    }

    #[test]
    fn min_max_take_any_number_of_arguments() {
        assert_eq!(Function::Min.call(&[3.0, 1.0, 2.0]), Ok(1.0));
        assert_eq!(Function::Max.call(&[3.0, 1.0, 2.0]), Ok(3.0));
        assert_eq!(Function::Max.call(&[7.0]), Ok(7.0));
    }

    #[test]
    fn log_accepts_a_base() {
        assert_eq!(Function::Log.call(&[8.0, 2.0]), Ok(3.0));
    }
}
