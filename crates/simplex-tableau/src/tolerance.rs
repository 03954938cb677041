/// Default epsilon below which a value is treated as zero
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Numerical tolerance used by the decision predicates of the solver.
///
/// Pivot arithmetic never consults it; only optimality and equality tests do.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl Tolerance {
    /// Negative or NaN epsilons are clamped to zero.
    pub fn new(epsilon: f64) -> Self {
        if epsilon.is_nan() || epsilon < 0.0 {
            Self(0.0)
        } else {
            Self(epsilon)
        }
    }

    pub fn epsilon(self) -> f64 {
        self.0
    }

    pub fn is_positive(self, value: f64) -> bool {
        value > self.0
    }

    pub fn is_zero(self, value: f64) -> bool {
        value.abs() < self.0
    }

    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.0
    }
}

impl From<f64> for Tolerance {
    fn from(epsilon: f64) -> Self {
        Self::new(epsilon)
    }
}
