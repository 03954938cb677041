use std::fmt;

use crate::tableau::{Pivot, Tableau};

/// How a calculation ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Every cost coefficient is non-positive
    #[default]
    Optimal,
    /// No admissible pivot exists; the problem is unbounded
    SolutionNotFound,
    /// The pivot budget ran out before reaching optimality
    MaxPivotsExceeded,
}

impl Status {
    pub fn description(&self) -> &'static str {
        match self {
            Status::Optimal => "Optimal solution found",
            Status::SolutionNotFound => "Solution not found",
            Status::MaxPivotsExceeded => "Max attempts exceeded",
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, Status::Optimal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Trace of one simplex run.
///
/// `snapshots[0]` is the input tableau and `snapshots[k]` the tableau after
/// `pivots[k - 1]` was applied.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    snapshots: Vec<Tableau>,
    pivots: Vec<Pivot>,
    status: Status,
}

impl CalculationResult {
    pub(crate) fn new(initial: Tableau) -> Self {
        Self {
            snapshots: vec![initial],
            pivots: Vec::new(),
            status: Status::Optimal,
        }
    }

    pub(crate) fn record(&mut self, pivot: Pivot, snapshot: Tableau) {
        self.pivots.push(pivot);
        self.snapshots.push(snapshot);
    }

    pub(crate) fn finish(&mut self, status: Status) {
        self.status = status;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn snapshots(&self) -> &[Tableau] {
        &self.snapshots
    }

    pub fn pivots(&self) -> &[Pivot] {
        &self.pivots
    }

    pub fn pivot_count(&self) -> usize {
        self.pivots.len()
    }

    pub fn initial(&self) -> &Tableau {
        &self.snapshots[0]
    }

    /// Tableau after the last pivot performed
    pub fn last(&self) -> &Tableau {
        // Never empty: the initial snapshot is stored on construction
        &self.snapshots[self.snapshots.len() - 1]
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tableau in &self.snapshots {
            writeln!(f, "{}", tableau)?;
        }
        if !self.status.is_optimal() {
            writeln!(f, "{}", self.status)?;
        }
        Ok(())
    }
}
