use std::fmt;

use thiserror::Error;

use crate::tolerance::Tolerance;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RationalError {
    #[error("Value must be a finite number, got {0}")]
    NonFinite(f64),
    #[error("Value {0} does not fit a 64-bit fraction")]
    OutOfRange(f64),
    #[error("Denominator must not be zero")]
    ZeroDenominator,
}

/// Settings for the continued-fraction approximation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxConfig {
    /// Stop once a convergent is closer than this to the input
    pub tolerance: Tolerance,
    /// Upper bound on the number of convergents computed
    pub max_iterations: usize,
}

impl Default for ApproxConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_iterations: 1000,
        }
    }
}

/// A reduced fraction with a positive denominator.
///
/// Only used to display tableau entries; the pivot arithmetic stays in `f64`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, RationalError> {
        if denominator == 0 {
            return Err(RationalError::ZeroDenominator);
        }

        // Widen so that negating i64::MIN cannot overflow
        let mut n = numerator as i128;
        let mut d = denominator as i128;
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd(n.unsigned_abs(), d.unsigned_abs()) as i128;
        let (n, d) = (n / g, d / g);

        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(numerator), Ok(denominator)) => Ok(Self { numerator, denominator }),
            _ => Err(RationalError::OutOfRange(numerator as f64 / denominator as f64)),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    /// Best small-denominator approximation of `value` with default settings
    pub fn from_f64(value: f64) -> Result<Self, RationalError> {
        Self::from_f64_with(value, ApproxConfig::default())
    }

    /// Continued-fraction expansion of `value`.
    ///
    /// Returns the first convergent within `config.tolerance` of `value`. When
    /// the iteration budget runs out, or the next convergent would no longer fit
    /// in an `i64`, the last convergent computed is returned instead.
    pub fn from_f64_with(value: f64, config: ApproxConfig) -> Result<Self, RationalError> {
        if !value.is_finite() {
            return Err(RationalError::NonFinite(value));
        }
        if value.abs() >= i64::MAX as f64 {
            return Err(RationalError::OutOfRange(value));
        }

        // Convergents h(n-1)/k(n-1) and h(n-2)/k(n-2), seeded with 1/0 and 0/1
        let (mut numerator, mut denominator) = (1i64, 0i64);
        let (mut prev_numerator, mut prev_denominator) = (0i64, 1i64);
        let mut remainder = value;

        for _ in 0..config.max_iterations {
            let whole = remainder.floor();
            if !whole.is_finite() || whole.abs() >= i64::MAX as f64 {
                break;
            }
            let a = whole as i64;

            let next = a
                .checked_mul(numerator)
                .and_then(|h| h.checked_add(prev_numerator))
                .zip(a.checked_mul(denominator).and_then(|k| k.checked_add(prev_denominator)));
            let Some((next_numerator, next_denominator)) = next else {
                break;
            };
            if next_denominator == 0 {
                break;
            }

            prev_numerator = numerator;
            prev_denominator = denominator;
            numerator = next_numerator;
            denominator = next_denominator;

            let approx = numerator as f64 / denominator as f64;
            if config.tolerance.approx_eq(value, approx) {
                break;
            }

            let fraction = remainder - whole;
            if fraction == 0.0 {
                break;
            }
            remainder = 1.0 / fraction;
        }

        if denominator == 0 {
            // No convergent was produced (zero iteration budget)
            return Ok(Self::integer(value.round() as i64));
        }
        Self::new(numerator, denominator)
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render to a String first so width and alignment flags apply to the whole fraction
        let text = if self.is_integer() {
            self.numerator.to_string()
        } else {
            format!("{}/{}", self.numerator, self.denominator)
        };
        f.pad(&text)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    // gcd(0, 0) only arises for 0/0, which `new` rejects earlier
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let r = Rational::new(6, -4).unwrap();
        assert_eq!(r.numerator(), -3);
        assert_eq!(r.denominator(), 2);

        let zero = Rational::new(0, -7).unwrap();
        assert_eq!(zero.numerator(), 0);
        assert_eq!(zero.denominator(), 1);
    }

    #[test]
    fn test_zero_denominator() {
        assert_eq!(Rational::new(1, 0), Err(RationalError::ZeroDenominator));
    }

    #[test]
    fn test_min_numerator_does_not_overflow() {
        let r = Rational::new(i64::MIN, 2).unwrap();
        assert_eq!(r.numerator(), i64::MIN / 2);
        assert_eq!(r.denominator(), 1);
        assert!(Rational::new(i64::MIN, -1).is_err());
    }

    #[test]
    fn test_one_third() {
        let r = Rational::from_f64(0.3333333333).unwrap();
        assert_eq!(r, Rational::new(1, 3).unwrap());
        assert_eq!(r.to_string(), "1/3");
    }

    #[test]
    fn test_integers_and_negatives() {
        assert_eq!(Rational::from_f64(0.0).unwrap().to_string(), "0");
        assert_eq!(Rational::from_f64(-4.0).unwrap().to_string(), "-4");
        assert_eq!(Rational::from_f64(12.0).unwrap().to_string(), "12");
        assert_eq!(Rational::from_f64(-0.5).unwrap().to_string(), "-1/2");
        assert_eq!(Rational::from_f64(-2.0 / 3.0).unwrap().to_string(), "-2/3");
    }

    #[test]
    fn test_pivot_noise() {
        // Typical accumulated error after a few Gauss-Jordan steps
        let r = Rational::from_f64(7.0 / 3.0 + 1e-13).unwrap();
        assert_eq!(r, Rational::new(7, 3).unwrap());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(Rational::from_f64(f64::NAN), Err(RationalError::NonFinite(_))));
        assert!(matches!(
            Rational::from_f64(f64::INFINITY),
            Err(RationalError::NonFinite(_))
        ));
        assert!(matches!(Rational::from_f64(1e300), Err(RationalError::OutOfRange(_))));
    }

    #[test]
    fn test_irrational_close_enough() {
        let pi = std::f64::consts::PI;
        let r = Rational::from_f64(pi).unwrap();
        assert!((r.to_f64() - pi).abs() < 1e-10, "{} is not close to pi", r);
    }

    #[test]
    fn test_iteration_budget() {
        let config = ApproxConfig {
            tolerance: Tolerance::new(1e-12),
            max_iterations: 1,
        };
        // Only the integer part fits in a single convergent
        let r = Rational::from_f64_with(2.75, config).unwrap();
        assert_eq!(r, Rational::integer(2));
    }

    #[test]
    fn test_display_padding() {
        let r = Rational::new(-5, 2).unwrap();
        assert_eq!(format!("{:>10}", r), "      -5/2");
    }
}
