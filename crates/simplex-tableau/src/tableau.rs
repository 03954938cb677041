use std::collections::BTreeSet;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, trace};

use crate::rational::Rational;
use crate::tolerance::Tolerance;

/// Width of one rendered cell
const CELL_WIDTH: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableauError {
    #[error("Tableau must contain at least one row and one column")]
    Empty,
    #[error("Entry at row {row}, column {column} is not finite: {value}")]
    NonFinite { row: usize, column: usize, value: f64 },
}

/// Row and column of the element a simplex step pivots on
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pivot {
    /// Constraint row of the leaving variable
    pub row: usize,
    /// Column of the entering variable
    pub column: usize,
}

impl Pivot {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Outcome of the pivot search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotSelection {
    Found(Pivot),
    /// No variable column has a positive cost coefficient
    NoImprovingColumn,
    /// Every improving column lacks a positive constraint entry
    Unbounded { columns: Vec<usize> },
}

/// The simplex dictionary for an LP in standard form.
///
/// The last row is the cost row and the last column is the right-hand side
/// (RHS). Positive cost coefficients mark improving columns. The matrix is
/// always rectangular, finite, and never resized after construction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
}

impl Tableau {
    /// Build from in-memory rows, zero-padding ragged rows to the widest one.
    pub fn new(mut data: Vec<Vec<f64>>) -> Result<Self, TableauError> {
        let columns = data.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Err(TableauError::Empty);
        }

        for (i, row) in data.iter_mut().enumerate() {
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(TableauError::NonFinite {
                    row: i,
                    column: j,
                    value: row[j],
                });
            }
            row.resize(columns, 0.0);
        }

        Ok(Self { data })
    }

    /// Parse the text format: one row per line, values separated by spaces
    /// and/or commas, braces ignored.
    ///
    /// Tokens that are not numbers are skipped. Input ends at the first blank
    /// line after the first row.
    pub fn parse(text: &str) -> Result<Self, TableauError> {
        Self::from_lines(text.lines())
    }

    pub fn from_lines<'a, I>(lines: I) -> Result<Self, TableauError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let rows: Vec<Vec<f64>> = lines
            .into_iter()
            .skip_while(|line| line.trim().is_empty())
            .take_while(|line| !line.trim().is_empty())
            .map(parse_row)
            .collect();
        Self::new(rows)
    }

    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn columns(&self) -> usize {
        self.data[0].len()
    }

    pub fn constraint_rows(&self) -> usize {
        self.rows() - 1
    }

    pub fn variable_columns(&self) -> usize {
        self.columns() - 1
    }

    pub fn cost_row(&self) -> usize {
        self.rows() - 1
    }

    /// Index of the RHS ("B") column
    pub fn rhs_column(&self) -> usize {
        self.columns() - 1
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.data.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    /// All entries in row-major order
    pub fn entries(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.clone()
    }

    /// True when no variable column can still improve the objective
    pub fn is_optimal(&self, tolerance: Tolerance) -> bool {
        let cost = &self.data[self.cost_row()];
        cost[..self.variable_columns()]
            .iter()
            .all(|&c| !tolerance.is_positive(c))
    }

    /// Column with the largest cost coefficient among those not excluded.
    ///
    /// The first column wins ties. `None` when the best coefficient is not
    /// positive or every column is excluded.
    pub fn select_entering_column(&self, excluded: &BTreeSet<usize>) -> Option<usize> {
        let cost = &self.data[self.cost_row()];
        let mut best: Option<(usize, f64)> = None;

        for (j, &c) in cost[..self.variable_columns()].iter().enumerate() {
            if excluded.contains(&j) {
                continue;
            }
            match best {
                Some((_, max)) if c <= max => {}
                _ => best = Some((j, c)),
            }
        }

        best.filter(|&(_, max)| max > 0.0).map(|(j, _)| j)
    }

    /// Minimum-ratio test on `column`.
    ///
    /// Only rows with a strictly positive entry take part, and only a strictly
    /// smaller ratio replaces the current minimum. When no row qualifies the
    /// column is unbounded: it is added to `excluded` and `None` is returned.
    pub fn select_leaving_row(&self, column: usize, excluded: &mut BTreeSet<usize>) -> Option<usize> {
        let rhs = self.rhs_column();
        let mut best: Option<(usize, f64)> = None;

        for (i, row) in self.data[..self.constraint_rows()].iter().enumerate() {
            let entry = row[column];
            if entry <= 0.0 {
                continue;
            }
            let ratio = row[rhs] / entry;
            match best {
                Some((_, min)) if ratio >= min => {}
                _ => best = Some((i, ratio)),
            }
        }

        if best.is_none() {
            debug!(column, "column is unbounded");
            excluded.insert(column);
        }
        best.map(|(i, _)| i)
    }

    /// Find the next pivot, skipping columns found to be unbounded.
    pub fn select_pivot(&self) -> PivotSelection {
        let mut excluded = BTreeSet::new();

        while let Some(column) = self.select_entering_column(&excluded) {
            if let Some(row) = self.select_leaving_row(column, &mut excluded) {
                return PivotSelection::Found(Pivot { row, column });
            }
        }

        if excluded.is_empty() {
            PivotSelection::NoImprovingColumn
        } else {
            PivotSelection::Unbounded {
                columns: excluded.into_iter().collect(),
            }
        }
    }

    /// Divide the pivot row by the pivot element
    pub fn normalize_pivot_row(&mut self, pivot: Pivot) {
        let row = &mut self.data[pivot.row];
        let pivot_val = row[pivot.column];
        for v in row.iter_mut() {
            *v /= pivot_val;
        }
    }

    /// Subtract multiples of the pivot row so the pivot column is zero
    /// everywhere else
    pub fn eliminate_other_rows(&mut self, pivot: Pivot) {
        let pivot_row = self.data[pivot.row].clone();
        for (i, row) in self.data.iter_mut().enumerate() {
            if i == pivot.row {
                continue;
            }
            let factor = row[pivot.column];
            if factor == 0.0 {
                continue;
            }
            for (v, &p) in row.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
        }
    }

    /// One Gauss-Jordan step on `pivot`
    pub fn apply_pivot(&mut self, pivot: Pivot) {
        trace!(
            row = pivot.row,
            column = pivot.column,
            element = self.data[pivot.row][pivot.column],
            "applying pivot"
        );
        self.normalize_pivot_row(pivot);
        self.eliminate_other_rows(pivot);
    }

    /// Current objective value: the negated RHS entry of the cost row
    pub fn objective_value(&self) -> f64 {
        let value = -self.data[self.cost_row()][self.rhs_column()];
        // Avoid rendering -0
        if value == 0.0 { 0.0 } else { value }
    }

    /// Value of each variable column in the current basic solution.
    ///
    /// A column that is a unit vector over the constraint rows is basic and
    /// takes the RHS of the row holding its 1; every other column is zero.
    pub fn basic_solution(&self, tolerance: Tolerance) -> Vec<f64> {
        let rhs = self.rhs_column();
        let constraints = &self.data[..self.constraint_rows()];
        let mut claimed = vec![false; constraints.len()];

        (0..self.variable_columns())
            .map(|j| {
                let mut unit_row = None;
                for (i, row) in constraints.iter().enumerate() {
                    let v = row[j];
                    if tolerance.approx_eq(v, 1.0) && unit_row.is_none() {
                        unit_row = Some(i);
                    } else if !tolerance.is_zero(v) {
                        return 0.0;
                    }
                }
                match unit_row {
                    // Two identical unit columns: only the first one is basic
                    Some(i) if !claimed[i] => {
                        claimed[i] = true;
                        constraints[i][rhs]
                    }
                    _ => 0.0,
                }
            })
            .collect()
    }

    /// Entrywise comparison within `tolerance`
    pub fn approx_eq(&self, other: &Tableau, tolerance: Tolerance) -> bool {
        self.rows() == other.rows()
            && self.columns() == other.columns()
            && self.entries().zip(other.entries()).all(|(a, b)| tolerance.approx_eq(a, b))
    }
}

fn parse_row(line: &str) -> Vec<f64> {
    line.replace(['{', '}'], "")
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

impl Index<(usize, usize)> for Tableau {
    type Output = f64;

    fn index(&self, (row, column): (usize, usize)) -> &f64 {
        &self.data[row][column]
    }
}

impl FromStr for Tableau {
    type Err = TableauError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Tableau {
    type Error = TableauError;

    fn try_from(data: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<Tableau> for Vec<Vec<f64>> {
    fn from(tableau: Tableau) -> Self {
        tableau.data
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.data {
            for &v in row {
                match Rational::from_f64(v) {
                    Ok(r) => write!(f, "{:>width$}", r, width = CELL_WIDTH)?,
                    Err(_) => write!(f, "{:>width$}", v, width = CELL_WIDTH)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tableau {
        Tableau::new(vec![
            vec![1.0, 1.0, 1.0, 0.0, 4.0],
            vec![1.0, 3.0, 0.0, 1.0, 6.0],
            vec![3.0, 5.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_ragged() {
        let t = Tableau::parse("1 2\n3 4 5\n").unwrap();
        assert_eq!(t.to_rows(), vec![vec![1.0, 2.0, 0.0], vec![3.0, 4.0, 5.0]]);
    }

    #[test]
    fn test_parse_braces_commas_and_junk() {
        let t: Tableau = "{{1, 2, 3},\n{4,x,5, 6}}".parse().unwrap();
        assert_eq!(t.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_parse_stops_at_blank_line() {
        let t = Tableau::parse("\n\n1 2\r\n3 4\r\n\r\n5 6\n").unwrap();
        assert_eq!(t.rows(), 2);
        assert_eq!(t[(1, 0)], 3.0);
    }

    #[test]
    fn test_parse_all_junk_row_is_zero() {
        let t = Tableau::parse("1 2\nfoo bar").unwrap();
        assert_eq!(t.row(1), &[0.0, 0.0]);
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(Tableau::parse(""), Err(TableauError::Empty));
        assert_eq!(Tableau::parse("a b\nc"), Err(TableauError::Empty));
        assert!(matches!(
            Tableau::parse("1 inf"),
            Err(TableauError::NonFinite { row: 0, column: 1, .. })
        ));
    }

    #[test]
    fn test_dimensions() {
        let t = sample();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.columns(), 5);
        assert_eq!(t.cost_row(), 2);
        assert_eq!(t.rhs_column(), 4);
        assert_eq!(t.variable_columns(), 4);
        assert_eq!(t.get(2, 1), Some(5.0));
        assert_eq!(t.get(3, 0), None);
        assert_eq!(t.entries().count(), 15);
    }

    #[test]
    fn test_is_optimal_uses_tolerance() {
        let t = Tableau::new(vec![vec![1.0, 1.0, 2.0], vec![1e-12, -3.0, -7.0]]).unwrap();
        assert!(t.is_optimal(Tolerance::default()));
        assert!(!t.is_optimal(Tolerance::new(0.0)));
    }

    #[test]
    fn test_entering_column_tie_break() {
        let t = Tableau::new(vec![vec![1.0, 1.0, 1.0, 1.0], vec![2.0, 5.0, 5.0, 0.0]]).unwrap();
        let mut excluded = BTreeSet::new();
        assert_eq!(t.select_entering_column(&excluded), Some(1));
        excluded.insert(1);
        assert_eq!(t.select_entering_column(&excluded), Some(2));
        excluded.insert(2);
        assert_eq!(t.select_entering_column(&excluded), Some(0));
        excluded.insert(0);
        assert_eq!(t.select_entering_column(&excluded), None);
    }

    #[test]
    fn test_entering_column_requires_positive() {
        let t = Tableau::new(vec![vec![1.0, 1.0, 1.0], vec![-1.0, 0.0, 0.0]]).unwrap();
        assert_eq!(t.select_entering_column(&BTreeSet::new()), None);
    }

    #[test]
    fn test_leaving_row_min_ratio() {
        // Ratios in column 1: 4/1 = 4, 6/3 = 2, 2/1 = 2 (tie keeps row 1)
        let t = Tableau::new(vec![
            vec![1.0, 1.0, 4.0],
            vec![1.0, 3.0, 6.0],
            vec![0.0, 1.0, 2.0],
            vec![0.0, -2.0, 0.0],
            vec![3.0, 5.0, 0.0],
        ])
        .unwrap();
        let mut excluded = BTreeSet::new();
        assert_eq!(t.select_leaving_row(1, &mut excluded), Some(1));
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_leaving_row_marks_unbounded() {
        let t = Tableau::new(vec![vec![-1.0, 1.0, 4.0], vec![0.0, 1.0, 6.0], vec![2.0, 1.0, 0.0]]).unwrap();
        let mut excluded = BTreeSet::new();
        assert_eq!(t.select_leaving_row(0, &mut excluded), None);
        assert!(excluded.contains(&0));
    }

    #[test]
    fn test_select_pivot_skips_unbounded_column() {
        // Column 0 is the most improving but has no positive entry
        let t = Tableau::new(vec![vec![-1.0, 2.0, 4.0], vec![0.0, 1.0, 6.0], vec![5.0, 1.0, 0.0]]).unwrap();
        assert_eq!(t.select_pivot(), PivotSelection::Found(Pivot::new(0, 1)));
    }

    #[test]
    fn test_select_pivot_unbounded() {
        let t = Tableau::new(vec![vec![-1.0, 1.0, 4.0], vec![2.0, 0.0, 0.0]]).unwrap();
        assert_eq!(t.select_pivot(), PivotSelection::Unbounded { columns: vec![0] });
    }

    #[test]
    fn test_select_pivot_no_improving_column() {
        let t = Tableau::new(vec![vec![1.0, 1.0, 4.0], vec![-2.0, 0.0, 0.0]]).unwrap();
        assert_eq!(t.select_pivot(), PivotSelection::NoImprovingColumn);
    }

    #[test]
    fn test_apply_pivot() {
        let mut t = sample();
        let pivot = Pivot::new(1, 1);
        t.apply_pivot(pivot);

        assert!((t[(1, 1)] - 1.0).abs() < 1e-12);
        for i in [0, 2] {
            assert!(t[(i, 1)].abs() < 1e-12, "row {} not eliminated: {}", i, t[(i, 1)]);
        }
        // Row 1 became [1/3, 1, 0, 1/3, 2]
        assert!((t[(1, 4)] - 2.0).abs() < 1e-12);
        // Cost row: [3 - 5/3, 0, 0, -5/3, -10]
        assert!((t[(2, 0)] - 4.0 / 3.0).abs() < 1e-12);
        assert!((t[(2, 4)] + 10.0).abs() < 1e-12);
        assert!((t.objective_value() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_basic_solution() {
        let mut t = sample();
        assert_eq!(t.basic_solution(Tolerance::default()), vec![0.0, 0.0, 4.0, 6.0]);

        t.apply_pivot(Pivot::new(1, 1));
        let values = t.basic_solution(Tolerance::default());
        assert!((values[1] - 2.0).abs() < 1e-9, "y = {} (expected 2)", values[1]);
        assert!((values[2] - 2.0).abs() < 1e-9, "s1 = {} (expected 2)", values[2]);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.apply_pivot(Pivot::new(0, 0));
        assert_eq!(original, sample());
        assert_ne!(original, copy);
    }

    #[test]
    fn test_approx_eq() {
        let a = sample();
        let b = Tableau::new(
            a.to_rows()
                .into_iter()
                .map(|row| row.into_iter().map(|v| v + 1e-12).collect())
                .collect(),
        )
        .unwrap();
        assert!(a.approx_eq(&b, Tolerance::default()));
        assert!(!a.approx_eq(&b, Tolerance::new(1e-13)));
    }

    #[test]
    fn test_display() {
        let t = Tableau::new(vec![vec![0.5, -2.0], vec![1.0 / 3.0, 0.0]]).unwrap();
        let expected = format!(
            "{:>10}{:>10}\n{:>10}{:>10}\n",
            "1/2", "-2", "1/3", "0"
        );
        assert_eq!(t.to_string(), expected);
    }
}
