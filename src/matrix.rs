//! Bin Matrix - dense rows x bins view of a binned spike train
//!
//! Row-major storage of per-bin values. A clipped matrix holds 0/1
//! occupancy, an unclipped matrix holds spike counts.

use crate::error::{BinningError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense `rows x columns` matrix of bin values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinMatrix {
    rows: usize,
    columns: usize,
    values: Vec<u32>,
}

impl BinMatrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            values: vec![0; rows * columns],
        }
    }

    /// Create from nested rows. Every row must have the same length.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * columns);
        for row in rows {
            if row.len() != columns {
                return Err(BinningError::ShapeMismatch {
                    left_rows: rows.len(),
                    left_columns: columns,
                    right_rows: 1,
                    right_columns: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            values,
        })
    }

    /// Number of rows (spike trains).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (bins).
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Value at `(row, column)`, `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<u32> {
        if row < self.rows && column < self.columns {
            Some(self.values[row * self.columns + column])
        } else {
            None
        }
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Option<&[u32]> {
        if row < self.rows {
            let offset = row * self.columns;
            Some(&self.values[offset..offset + self.columns])
        } else {
            None
        }
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks_exact panics on zero, and a zero-column matrix has no values anyway.
        self.values.chunks_exact(self.columns.max(1)).take(self.rows)
    }

    /// Raw row-major values.
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    /// Nested copy of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.iter_rows().map(<[u32]>::to_vec).collect()
    }

    /// Mark `(row, column)` as occupied.
    pub(crate) fn mark(&mut self, row: usize, column: usize) -> Result<()> {
        let cell = self.cell_mut(row, column)?;
        *cell = 1;
        Ok(())
    }

    /// Add one event at `(row, column)`.
    pub(crate) fn increment(&mut self, row: usize, column: usize) -> Result<()> {
        let cell = self.cell_mut(row, column)?;
        *cell = cell.saturating_add(1);
        Ok(())
    }

    fn cell_mut(&mut self, row: usize, column: usize) -> Result<&mut u32> {
        if column >= self.columns || row >= self.rows {
            return Err(BinningError::ColumnIndex {
                row,
                column,
                columns: self.columns,
            });
        }
        Ok(&mut self.values[row * self.columns + column])
    }

    /// Sum of all values.
    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }

    /// Count of non-zero cells.
    pub fn non_zero_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0).count()
    }

    /// Per-column sums (population count per bin).
    pub fn column_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.columns];
        for row in self.iter_rows() {
            for (sum, &v) in sums.iter_mut().zip(row) {
                *sum += u64::from(v);
            }
        }
        sums
    }

    /// Check if all values are zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0)
    }
}
