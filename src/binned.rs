//! Binned Spike Train - the core binning engine
//!
//! Maps each input train onto a shared, validated time grid and keeps, per
//! row, the list of bin indices its spikes fall into (`filled`). Dense
//! matrices are derived views over `filled`, optionally cached.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::ops::{Add, Sub};

use tracing::{debug, trace};

use crate::config::BinningConfig;
use crate::error::{BinningError, Result};
use crate::matrix::BinMatrix;
use crate::quantity::Quantity;
use crate::spec::BinningSpec;
use crate::train::EventSequence;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a matrix view is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Materialize {
    /// Recompute on every call, keep nothing.
    OnDemand,
    /// Compute once and return the stored matrix until `filled` changes.
    Cached,
}

/// Which dense view of `filled` to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixKind {
    /// 1 where a row has at least one spike in a bin, else 0.
    Clipped,
    /// Number of spikes a row has in each bin.
    Unclipped,
}

impl MatrixKind {
    #[inline]
    fn slot(self) -> usize {
        match self {
            MatrixKind::Clipped => 0,
            MatrixKind::Unclipped => 1,
        }
    }
}

/// Spike trains discretized onto a common grid of equal-width bins.
///
/// A series like `[0.5, 0.7, 1.2, 3.1, 4.3, 5.5, 6.7] s` binned from 0 s in
/// 1 s steps is stored as `[0, 0, 1, 3, 4, 5, 6]`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinnedSpikeTrain {
    /// Resolved, validated grid.
    spec: BinningSpec,

    /// Number of input trains.
    rows: usize,

    /// Bin indices per row. Duplicates kept until pruned.
    filled: Vec<Vec<usize>>,

    /// Default policy for the matrix views.
    store_mat: bool,

    /// One slot per [`MatrixKind`].
    #[cfg_attr(feature = "serde", serde(skip))]
    cache: [OnceCell<BinMatrix>; 2],
}

impl BinnedSpikeTrain {
    /// Bin `trains` according to `config`.
    ///
    /// Resolves the missing parameter, checks that every train covers the
    /// binned window, then assigns every spike to its bin. Spikes at or past
    /// the final edge are dropped.
    pub fn new<S: EventSequence>(trains: &[S], config: &BinningConfig) -> Result<Self> {
        if trains.is_empty() {
            return Err(BinningError::NoSpikeTrains);
        }
        let spec = config.resolve(trains)?;
        spec.validate_against(trains)?;

        let filled: Vec<Vec<usize>> = trains
            .iter()
            .enumerate()
            .map(|(row, train)| {
                let indices = spec.assign(train);
                let dropped = train.len() - indices.len();
                if dropped > 0 {
                    trace!(row, dropped, "spikes outside binned window");
                }
                indices
            })
            .collect();

        debug!(
            rows = trains.len(),
            num_bins = spec.num_bins(),
            bin_size = %spec.bin_size(),
            t_start = %spec.t_start(),
            "binned spike trains"
        );

        Ok(Self {
            spec,
            rows: trains.len(),
            filled,
            store_mat: config.store_mat,
            cache: Default::default(),
        })
    }

    /// Bin a single train.
    pub fn from_train<S: EventSequence>(train: &S, config: &BinningConfig) -> Result<Self> {
        Self::new(std::slice::from_ref(train), config)
    }

    /// Instance sharing this grid and shape but holding `filled`.
    ///
    /// Skips input validation: the grid was already validated and `filled`
    /// comes from operands with the same shape.
    fn derive_with(&self, filled: Vec<Vec<usize>>) -> Self {
        Self {
            spec: self.spec,
            rows: self.rows,
            filled,
            store_mat: self.store_mat,
            cache: Default::default(),
        }
    }

    // =========================================================================
    // PARAMETERS
    // =========================================================================

    /// Resolved grid.
    pub fn spec(&self) -> &BinningSpec {
        &self.spec
    }

    /// Left edge of the first bin.
    pub fn t_start(&self) -> Quantity {
        self.spec.t_start()
    }

    /// Right edge of the last bin.
    pub fn t_stop(&self) -> Quantity {
        self.spec.t_stop()
    }

    /// Bin width.
    pub fn bin_size(&self) -> Quantity {
        self.spec.bin_size()
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.spec.num_bins()
    }

    /// Number of rows (input trains).
    pub fn matrix_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (bins).
    pub fn matrix_columns(&self) -> usize {
        self.spec.num_bins()
    }

    // =========================================================================
    // FILLED
    // =========================================================================

    /// Bin indices per row.
    pub fn filled(&self) -> &[Vec<usize>] {
        &self.filled
    }

    /// Replace `filled` wholesale.
    ///
    /// Row count must match and every index must lie in `[0, num_bins)`.
    /// Cached matrices are dropped.
    pub fn set_filled(&mut self, filled: Vec<Vec<usize>>) -> Result<()> {
        if filled.len() != self.rows {
            return Err(BinningError::ShapeMismatch {
                left_rows: self.rows,
                left_columns: self.num_bins(),
                right_rows: filled.len(),
                right_columns: self.num_bins(),
            });
        }
        let columns = self.num_bins();
        for (row, indices) in filled.iter().enumerate() {
            if let Some(&column) = indices.iter().find(|&&c| c >= columns) {
                return Err(BinningError::ColumnIndex {
                    row,
                    column,
                    columns,
                });
            }
        }
        self.filled = filled;
        self.invalidate();
        Ok(())
    }

    /// Remove duplicate indices within each row (sorted ascending).
    ///
    /// Idempotent.
    pub fn prune(&mut self) -> &mut Self {
        for row in &mut self.filled {
            row.sort_unstable();
            row.dedup();
        }
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.cache = Default::default();
    }

    // =========================================================================
    // MATRICES
    // =========================================================================

    /// Default policy taken from the configuration.
    pub fn default_policy(&self) -> Materialize {
        if self.store_mat {
            Materialize::Cached
        } else {
            Materialize::OnDemand
        }
    }

    /// Binary occupancy matrix under the default policy.
    pub fn matrix_clipped(&self) -> Result<Cow<'_, BinMatrix>> {
        self.matrix(MatrixKind::Clipped, self.default_policy())
    }

    /// Binary occupancy matrix under `policy`.
    pub fn matrix_clipped_with(&self, policy: Materialize) -> Result<Cow<'_, BinMatrix>> {
        self.matrix(MatrixKind::Clipped, policy)
    }

    /// Spike count matrix under the default policy.
    pub fn matrix_unclipped(&self) -> Result<Cow<'_, BinMatrix>> {
        self.matrix(MatrixKind::Unclipped, self.default_policy())
    }

    /// Spike count matrix under `policy`.
    pub fn matrix_unclipped_with(&self, policy: Materialize) -> Result<Cow<'_, BinMatrix>> {
        self.matrix(MatrixKind::Unclipped, policy)
    }

    /// Matrix view of `kind`.
    ///
    /// A stored matrix is returned whenever one exists, whatever `policy`
    /// asks for. `Cached` fills the slot at most once per `filled`.
    pub fn matrix(&self, kind: MatrixKind, policy: Materialize) -> Result<Cow<'_, BinMatrix>> {
        let slot = &self.cache[kind.slot()];
        if let Some(stored) = slot.get() {
            return Ok(Cow::Borrowed(stored));
        }
        let matrix = self.render(kind)?;
        match policy {
            Materialize::OnDemand => Ok(Cow::Owned(matrix)),
            Materialize::Cached => {
                trace!(?kind, rows = self.rows, "caching matrix");
                Ok(Cow::Borrowed(slot.get_or_init(|| matrix)))
            }
        }
    }

    /// Whether a matrix of `kind` is stored.
    pub fn is_cached(&self, kind: MatrixKind) -> bool {
        self.cache[kind.slot()].get().is_some()
    }

    fn render(&self, kind: MatrixKind) -> Result<BinMatrix> {
        let mut matrix = BinMatrix::zeros(self.rows, self.num_bins());
        for (row, indices) in self.filled.iter().enumerate() {
            for &column in indices {
                match kind {
                    MatrixKind::Clipped => matrix.mark(row, column)?,
                    MatrixKind::Unclipped => matrix.increment(row, column)?,
                }
            }
        }
        Ok(matrix)
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// All bin borders, `num_bins + 1` values in [`Self::bin_size`]'s unit.
    pub fn edges(&self) -> Vec<f64> {
        self.spec.edges()
    }

    /// Left border of every bin.
    pub fn left_edges(&self) -> Vec<f64> {
        self.spec.left_edges()
    }

    /// Right border of every bin.
    pub fn right_edges(&self) -> Vec<f64> {
        self.spec.right_edges()
    }

    /// Center of every bin.
    pub fn center_edges(&self) -> Vec<f64> {
        self.spec.center_edges()
    }

    // =========================================================================
    // ALGEBRA
    // =========================================================================

    fn check_shape(&self, other: &Self) -> Result<()> {
        if self.rows != other.rows || self.num_bins() != other.num_bins() {
            return Err(BinningError::ShapeMismatch {
                left_rows: self.rows,
                left_columns: self.num_bins(),
                right_rows: other.rows,
                right_columns: other.num_bins(),
            });
        }
        Ok(())
    }

    /// Multiset union: each row holds both operands' indices, duplicates kept.
    ///
    /// The grid is copied from `self`.
    pub fn union(&self, other: &Self) -> Result<Self> {
        self.check_shape(other)?;
        let filled: Vec<Vec<usize>> = self
            .filled
            .iter()
            .zip(&other.filled)
            .map(|(a, b)| a.iter().chain(b).copied().collect::<Vec<_>>())
            .collect();
        Ok(self.derive_with(filled))
    }

    /// Per-row symmetric set difference, each index once, ascending.
    ///
    /// A row with no residual bins becomes an empty list.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self> {
        self.check_shape(other)?;
        let filled: Vec<Vec<usize>> = self
            .filled
            .iter()
            .zip(&other.filled)
            .map(|(a, b)| {
                let a: BTreeSet<usize> = a.iter().copied().collect();
                let b: BTreeSet<usize> = b.iter().copied().collect();
                a.symmetric_difference(&b).copied().collect::<Vec<_>>()
            })
            .collect();
        Ok(self.derive_with(filled))
    }

    /// Replace `self` with `self.union(other)`.
    pub fn union_assign(&mut self, other: &Self) -> Result<()> {
        *self = self.union(other)?;
        Ok(())
    }

    /// Replace `self` with `self.symmetric_difference(other)`.
    pub fn symmetric_difference_assign(&mut self, other: &Self) -> Result<()> {
        *self = self.symmetric_difference(other)?;
        Ok(())
    }
}

/// Equal when `filled` matches row by row, in stored order.
impl PartialEq for BinnedSpikeTrain {
    fn eq(&self, other: &Self) -> bool {
        self.filled == other.filled
    }
}

impl Add for &BinnedSpikeTrain {
    type Output = Result<BinnedSpikeTrain>;

    fn add(self, rhs: &BinnedSpikeTrain) -> Self::Output {
        self.union(rhs)
    }
}

impl Sub for &BinnedSpikeTrain {
    type Output = Result<BinnedSpikeTrain>;

    fn sub(self, rhs: &BinnedSpikeTrain) -> Self::Output {
        self.symmetric_difference(rhs)
    }
}
