//! Kuhn-Munkres (Hungarian) minimum-cost perfect matching.
//!
//! The solver works on starred and primed zeros of a reduced cost matrix:
//! starred zeros form the current matching, primed zeros are candidates for
//! the next augmenting path.

use tracing::trace;

use crate::matrix::{check_cost_range, Matrix};
use crate::model::entity::Cost;
use crate::{Error, Result};

/// Matched cells of a solved cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    selected: Matrix<bool>,
}

impl Solution {
    #[cfg(test)]
    pub(crate) fn from_selection(selected: Matrix<bool>) -> Solution {
        Solution { selected }
    }

    pub fn rows(&self) -> usize {
        self.selected.rows()
    }

    pub fn columns(&self) -> usize {
        self.selected.columns()
    }

    pub fn is_selected(&self, row: usize, column: usize) -> bool {
        self.selected[(row, column)]
    }

    /// Rows matched to `column`, in row order.
    pub fn selected_rows(&self, column: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows()).filter(move |&row| self.selected[(row, column)])
    }

    /// `(row, column)` of every matched cell, row-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows()).flat_map(move |row| {
            (0..self.columns()).filter(move |&column| self.selected[(row, column)]).map(move |column| (row, column))
        })
    }

    /// Sum of `costs` over the matched cells.
    pub fn total_cost(&self, costs: &Matrix<Cost>) -> Cost {
        self.pairs().map(|cell| costs[cell]).sum()
    }
}

/// Solves the assignment problem on a working copy of the cost matrix.
///
/// The matrix must have at least as many rows as columns. Extra rows are
/// balanced by padding columns with the matrix maximum, which every padded
/// column pays once and so leaves the optimum unchanged. Ties between equally
/// cheap matchings are broken by row-major scan order. Costs beyond
/// [`MAX_COST`](crate::model::entity::MAX_COST) are rejected.
pub fn solve(working: Matrix<Cost>) -> Result<Solution> {
    let (rows, columns) = (working.rows(), working.columns());
    if rows < columns {
        return Err(Error::InfeasibleProblem { rows, columns });
    }
    check_cost_range(working.iter())?;

    let mut munkres = Munkres::new(pad_to_square(working));
    munkres.run();

    let selected = Matrix::from_fn(rows, columns, |row, column| munkres.marks[(row, column)] == Mark::Star);
    Ok(Solution { selected })
}

fn pad_to_square(matrix: Matrix<Cost>) -> Matrix<Cost> {
    if matrix.rows() == matrix.columns() {
        return matrix;
    }
    let fill = matrix.iter().copied().max().unwrap_or(0);
    let n = matrix.rows();
    Matrix::from_fn(n, n, |row, column| {
        if column < matrix.columns() {
            matrix[(row, column)]
        } else {
            fill
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Star,
    Prime,
}

enum Step {
    CoverStarred,
    PrimeZeros,
    Augment { row: usize, column: usize },
    AdjustCosts,
    Done,
}

struct Munkres {
    cost: Matrix<Cost>,
    marks: Matrix<Mark>,
    row_covered: Vec<bool>,
    column_covered: Vec<bool>,
}

impl Munkres {
    fn new(cost: Matrix<Cost>) -> Munkres {
        let n = cost.rows();
        Munkres {
            cost,
            marks: Matrix::new(n, n, Mark::None),
            row_covered: vec![false; n],
            column_covered: vec![false; n],
        }
    }

    fn size(&self) -> usize {
        self.cost.rows()
    }

    fn run(&mut self) {
        if self.size() == 0 {
            return;
        }
        self.reduce_rows();
        self.reduce_columns();
        self.star_zeros();

        let mut step = Step::CoverStarred;
        loop {
            step = match step {
                Step::CoverStarred => self.cover_starred_columns(),
                Step::PrimeZeros => self.prime_zeros(),
                Step::Augment { row, column } => self.augment(row, column),
                Step::AdjustCosts => self.adjust_costs(),
                Step::Done => break,
            };
        }
    }

    fn reduce_rows(&mut self) {
        for row in 0..self.size() {
            let values = self.cost.row_mut(row);
            let min = values.iter().copied().min().unwrap_or(0);
            values.iter_mut().for_each(|value| *value -= min);
        }
    }

    fn reduce_columns(&mut self) {
        for column in 0..self.size() {
            let min = self.cost.column(column).copied().min().unwrap_or(0);
            for row in 0..self.size() {
                self.cost[(row, column)] -= min;
            }
        }
    }

    /// Greedily stars zeros that share no row or column with another star.
    fn star_zeros(&mut self) {
        let n = self.size();
        for row in 0..n {
            for column in 0..n {
                if self.cost[(row, column)] == 0 && !self.row_covered[row] && !self.column_covered[column] {
                    self.marks[(row, column)] = Mark::Star;
                    self.row_covered[row] = true;
                    self.column_covered[column] = true;
                }
            }
        }
        self.clear_covers();
    }

    fn cover_starred_columns(&mut self) -> Step {
        let n = self.size();
        for column in 0..n {
            if self.find_in_column(column, Mark::Star).is_some() {
                self.column_covered[column] = true;
            }
        }
        let covered = self.column_covered.iter().filter(|&&c| c).count();
        trace!(covered, size = n, "covered starred columns");
        if covered == n {
            Step::Done
        } else {
            Step::PrimeZeros
        }
    }

    fn prime_zeros(&mut self) -> Step {
        while let Some((row, column)) = self.find_uncovered_zero() {
            self.marks[(row, column)] = Mark::Prime;
            match self.find_in_row(row, Mark::Star) {
                Some(star_column) => {
                    self.row_covered[row] = true;
                    self.column_covered[star_column] = false;
                }
                None => return Step::Augment { row, column },
            }
        }
        Step::AdjustCosts
    }

    /// Flips stars and primes along the alternating path that starts at the
    /// uncovered prime `(row, column)`.
    fn augment(&mut self, row: usize, column: usize) -> Step {
        let mut path = vec![(row, column)];
        let mut column = column;
        while let Some(star_row) = self.find_in_column(column, Mark::Star) {
            path.push((star_row, column));
            // the row of a star on the path was covered when its prime was set
            let Some(prime_column) = self.find_in_row(star_row, Mark::Prime) else {
                break;
            };
            path.push((star_row, prime_column));
            column = prime_column;
        }

        for cell in path {
            self.marks[cell] = match self.marks[cell] {
                Mark::Star => Mark::None,
                _ => Mark::Star,
            };
        }
        for row in 0..self.size() {
            for column in 0..self.size() {
                if self.marks[(row, column)] == Mark::Prime {
                    self.marks[(row, column)] = Mark::None;
                }
            }
        }
        self.clear_covers();
        Step::CoverStarred
    }

    /// Creates a new uncovered zero without disturbing starred or primed ones.
    fn adjust_costs(&mut self) -> Step {
        let n = self.size();
        let mut uncovered_min = None;
        for row in (0..n).filter(|&row| !self.row_covered[row]) {
            for column in (0..n).filter(|&column| !self.column_covered[column]) {
                let value = self.cost[(row, column)];
                uncovered_min = Some(uncovered_min.map_or(value, |min: Cost| min.min(value)));
            }
        }
        let Some(min) = uncovered_min else {
            return Step::Done;
        };

        for row in 0..n {
            for column in 0..n {
                match (self.row_covered[row], self.column_covered[column]) {
                    (false, false) => self.cost[(row, column)] -= min,
                    (true, true) => self.cost[(row, column)] += min,
                    _ => {}
                }
            }
        }
        Step::PrimeZeros
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        let n = self.size();
        for row in (0..n).filter(|&row| !self.row_covered[row]) {
            for column in (0..n).filter(|&column| !self.column_covered[column]) {
                if self.cost[(row, column)] == 0 {
                    return Some((row, column));
                }
            }
        }
        None
    }

    fn find_in_row(&self, row: usize, mark: Mark) -> Option<usize> {
        self.marks.row(row).iter().position(|&m| m == mark)
    }

    fn find_in_column(&self, column: usize, mark: Mark) -> Option<usize> {
        self.marks.column(column).position(|&m| m == mark)
    }

    fn clear_covers(&mut self) {
        self.row_covered.iter_mut().for_each(|c| *c = false);
        self.column_covered.iter_mut().for_each(|c| *c = false);
    }
}
