//! Dense matrices and the replicated cost matrix builder.

use std::fmt;
use std::ops::{Index, IndexMut};

use itertools::Itertools;

use crate::model::entity::{Cost, GroupId, Participant, MAX_COST};
use crate::{Error, Result};

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    rows: usize,
    columns: usize,
    data: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    pub fn new(rows: usize, columns: usize, value: T) -> Matrix<T> {
        Matrix { rows, columns, data: vec![value; rows * columns] }
    }
}

impl<T> Matrix<T> {
    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> T) -> Matrix<T> {
        let data = (0..rows)
            .cartesian_product(0..columns)
            .map(|(row, column)| f(row, column))
            .collect();
        Matrix { rows, columns, data }
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Matrix<T>> {
        let columns = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|r| r.len() != columns) {
            return Err(Error::Configuration(format!(
                "row {row} has {} columns, expected {columns}",
                rows[row].len()
            )));
        }
        let n_rows = rows.len();
        Ok(Matrix { rows: n_rows, columns, data: rows.into_iter().flatten().collect() })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.columns..(row + 1) * self.columns]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.columns..(row + 1) * self.columns]
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = &T> + '_ {
        (0..self.rows).map(move |row| &self[(row, column)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, column): (usize, usize)) -> &T {
        assert!(row < self.rows && column < self.columns, "index ({row}, {column}) out of bounds");
        &self.data[row * self.columns + column]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut T {
        assert!(row < self.rows && column < self.columns, "index ({row}, {column}) out of bounds");
        &mut self.data[row * self.columns + column]
    }
}

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            writeln!(f, "{}", self.row(row).iter().join("\t"))?;
        }
        Ok(())
    }
}

/// Maps a (possibly replicated) matrix row back to the group it stands for.
pub fn logical_group(row: usize, group_count: usize) -> GroupId {
    row % group_count
}

/// Seats per group: `ceil(participants / groups)`.
pub fn group_size(participant_count: usize, group_count: usize) -> usize {
    participant_count.div_ceil(group_count)
}

/// Rejects costs whose magnitude exceeds [`MAX_COST`].
pub fn check_cost_range<'a>(costs: impl IntoIterator<Item = &'a Cost>) -> Result<()> {
    match costs.into_iter().find(|cost| cost.unsigned_abs() > MAX_COST.unsigned_abs()) {
        Some(cost) => Err(Error::Configuration(format!("cost {cost} is outside [-{MAX_COST}, {MAX_COST}]"))),
        None => Ok(()),
    }
}

/// Builds the seat x participant cost matrix.
///
/// Every group gets `group_size` rows carrying the same costs, so the matching
/// can place up to that many participants in one group.
pub fn build_cost_matrix(participants: &[Participant], group_count: usize) -> Result<Matrix<Cost>> {
    if group_count == 0 {
        return Err(Error::Configuration("group count must be at least 1".to_string()));
    }
    if let Some(p) = participants.iter().find(|p| p.preferences.len() != group_count) {
        return Err(Error::Configuration(format!(
            "participant '{}' has {} preferences, expected {group_count}",
            p.id,
            p.preferences.len()
        )));
    }
    check_cost_range(participants.iter().flat_map(|p| &p.preferences))?;
    let rows = group_count * group_size(participants.len(), group_count);
    Ok(Matrix::from_fn(rows, participants.len(), |row, column| {
        participants[column].preferences[logical_group(row, group_count)]
    }))
}
