use tracing::{debug, info, warn};

use crate::result::{CalculationResult, Status};
use crate::tableau::{PivotSelection, Tableau};
use crate::tolerance::Tolerance;

/// Default pivot budget
pub const DEFAULT_MAX_PIVOTS: usize = 100;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexConfig {
    /// Tolerance for the optimality test
    pub tolerance: Tolerance,
    /// Maximum pivots before giving up
    pub max_pivots: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_pivots: DEFAULT_MAX_PIVOTS,
        }
    }
}

/// Simplex driver over an already feasible tableau
#[derive(Debug, Clone, Default)]
pub struct Simplex {
    config: SimplexConfig,
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SimplexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_pivots(mut self, max: usize) -> Self {
        self.config.max_pivots = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.config.tolerance = Tolerance::new(tol);
        self
    }

    pub fn config(&self) -> &SimplexConfig {
        &self.config
    }

    /// Pivot until optimal, unbounded, or out of budget.
    ///
    /// The input is never modified. Every intermediate tableau is kept in the
    /// result, starting with a copy of `input`.
    pub fn calculate(&self, input: &Tableau) -> CalculationResult {
        let mut tableau = input.clone();
        let mut result = CalculationResult::new(input.clone());

        let status = loop {
            if tableau.is_optimal(self.config.tolerance) {
                break Status::Optimal;
            }
            match tableau.select_pivot() {
                // An admissible pivot exists but the budget is spent
                PivotSelection::Found(_) if result.pivot_count() >= self.config.max_pivots => {
                    warn!(max_pivots = self.config.max_pivots, "pivot budget exhausted");
                    break Status::MaxPivotsExceeded;
                }
                PivotSelection::Found(pivot) => {
                    debug!(
                        step = result.pivot_count() + 1,
                        row = pivot.row,
                        column = pivot.column,
                        element = tableau[(pivot.row, pivot.column)],
                        "pivot selected"
                    );
                    tableau.apply_pivot(pivot);
                    result.record(pivot, tableau.clone());
                }
                PivotSelection::NoImprovingColumn => {
                    debug!("no improving column left");
                    break Status::SolutionNotFound;
                }
                PivotSelection::Unbounded { columns } => {
                    debug!(?columns, "every improving column is unbounded");
                    break Status::SolutionNotFound;
                }
            }
        };

        info!(status = ?status, pivots = result.pivot_count(), "calculation finished");
        result.finish(status);
        result
    }
}

/// Run [`Simplex::calculate`] with the default configuration
pub fn calculate(tableau: &Tableau) -> CalculationResult {
    Simplex::new().calculate(tableau)
}
