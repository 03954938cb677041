mod rational;
mod result;
mod simplex;
mod tableau;
mod tolerance;

pub use rational::{ApproxConfig, Rational, RationalError};
pub use result::{CalculationResult, Status};
pub use simplex::{DEFAULT_MAX_PIVOTS, Simplex, SimplexConfig, calculate};
pub use tableau::{Pivot, PivotSelection, Tableau, TableauError};
pub use tolerance::{DEFAULT_TOLERANCE, Tolerance};
