//! Resolved binning grid: validation against inputs, bin indices, edges
//!
//! A [`BinningSpec`] stores every coordinate in the unit of its bin size.
//! All index arithmetic goes through [`tolerant_floor`], so a ratio such as
//! `0.3 / 0.1 = 2.9999999999999996` lands on bin 3, not bin 2.

use crate::error::{BinningError, Result};
use crate::quantity::{Quantity, TimeUnit};
use crate::train::{aligned_window, EventSequence};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance to the nearest integer, in bin widths, below which a ratio snaps
/// to it.
pub const FLOOR_TOLERANCE: f64 = 1e-9;

/// Floor that treats ratios within [`FLOOR_TOLERANCE`] of an integer as that
/// integer.
///
/// The window widens to four ulps of `x` once that exceeds the fixed
/// tolerance, so it tracks the rounding error of the ratio and never grows
/// with the bin index itself.
pub fn tolerant_floor(x: f64) -> f64 {
    let nearest = x.round();
    let tolerance = FLOOR_TOLERANCE.max(4.0 * f64::EPSILON * x.abs());
    if (x - nearest).abs() <= tolerance {
        nearest
    } else {
        x.floor()
    }
}

/// Fully resolved binning parameters.
///
/// Invariants once constructed through [`crate::BinningConfig::resolve`] and
/// validated: `bin_size > 0`, `t_start < t_stop`, `num_bins >= 1` and
/// `num_bins == floor((t_stop - t_start) / bin_size)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinningSpec {
    t_start: f64,
    t_stop: f64,
    bin_size: f64,
    num_bins: usize,
    unit: TimeUnit,
}

impl BinningSpec {
    /// Assemble a spec, rescaling start and stop into `bin_size`'s unit.
    ///
    /// No validation happens here.
    pub(crate) fn from_parts(
        t_start: Quantity,
        t_stop: Quantity,
        bin_size: Quantity,
        num_bins: usize,
    ) -> Self {
        let unit = bin_size.unit();
        Self {
            t_start: t_start.magnitude_in(unit),
            t_stop: t_stop.magnitude_in(unit),
            bin_size: bin_size.magnitude(),
            num_bins,
            unit,
        }
    }

    /// Start of the first bin (inclusive).
    pub fn t_start(&self) -> Quantity {
        Quantity::new(self.t_start, self.unit)
    }

    /// End of the last bin (exclusive).
    pub fn t_stop(&self) -> Quantity {
        Quantity::new(self.t_stop, self.unit)
    }

    /// Width of every bin.
    pub fn bin_size(&self) -> Quantity {
        Quantity::new(self.bin_size, self.unit)
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Unit shared by every coordinate of this spec.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Bin count derivable from the window and width.
    fn derived_num_bins(&self) -> f64 {
        tolerant_floor((self.t_stop - self.t_start) / self.bin_size)
    }

    // =========================================================================
    // CONSISTENCY
    // =========================================================================

    /// Check this spec against the windows of `trains`, failing on the first
    /// violation.
    ///
    /// Every train must cover `[t_start, t_stop)`, otherwise binning would
    /// silently drop or misattribute events.
    pub fn validate_against<S: EventSequence>(&self, trains: &[S]) -> Result<()> {
        let (max_start, min_stop) = aligned_window(trains).ok_or(BinningError::NoSpikeTrains)?;
        let start = self.t_start();
        let stop = self.t_stop();

        if max_start >= min_stop {
            return Err(BinningError::DisjointIntervals);
        }
        if start < max_start || start > min_stop {
            return Err(BinningError::StartOutOfRange {
                t_start: start.to_string(),
            });
        }

        let expected = self.derived_num_bins();
        if !expected.is_finite() || expected != self.num_bins as f64 {
            return Err(BinningError::InconsistentParameters {
                t_start: start.to_string(),
                t_stop: stop.to_string(),
                bin_size: self.bin_size().to_string(),
                num_bins: self.num_bins,
                expected: expected as i64,
            });
        }
        if !(start < stop && stop <= min_stop) {
            return Err(BinningError::StopTooLarge {
                t_stop: stop.to_string(),
            });
        }
        // num_bins is a usize, so the non-negative integer check holds by type.
        if stop > min_stop || stop < max_start {
            return Err(BinningError::StopOutOfRange {
                t_stop: stop.to_string(),
            });
        }
        if self.num_bins < 1 {
            return Err(BinningError::EmptyRange {
                num_bins: self.num_bins,
            });
        }
        Ok(())
    }

    // =========================================================================
    // BIN ASSIGNMENT
    // =========================================================================

    /// Bin holding the time `t` (a magnitude in [`BinningSpec::unit`]).
    ///
    /// Bins are half-open `[edge_i, edge_i+1)`. Times before `t_start` or at
    /// and beyond the last edge map to `None`.
    #[inline]
    pub fn bin_index(&self, t: f64) -> Option<usize> {
        let idx = tolerant_floor((t - self.t_start) / self.bin_size);
        if idx >= 0.0 && idx < self.num_bins as f64 {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Bin indices for every event of `train`, duplicates kept.
    pub fn assign<S: EventSequence>(&self, train: &S) -> Vec<usize> {
        let own = train.unit();
        train
            .times()
            .iter()
            .filter_map(|&t| self.bin_index(own.convert(t, self.unit)))
            .collect()
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// All `num_bins + 1` bin borders from `t_start` to `t_stop` inclusive.
    ///
    /// Each edge is computed from its index, so repeated calls never drift.
    pub fn edges(&self) -> Vec<f64> {
        let step = (self.t_stop - self.t_start) / self.num_bins as f64;
        (0..=self.num_bins)
            .map(|i| {
                if i == self.num_bins {
                    self.t_stop
                } else {
                    self.t_start + i as f64 * step
                }
            })
            .collect()
    }

    /// Left border of every bin.
    pub fn left_edges(&self) -> Vec<f64> {
        let mut edges = self.edges();
        edges.truncate(self.num_bins);
        edges
    }

    /// Right border of every bin (`left + bin_size`).
    pub fn right_edges(&self) -> Vec<f64> {
        self.left_edges()
            .into_iter()
            .map(|e| e + self.bin_size)
            .collect()
    }

    /// Center of every bin (`left + bin_size / 2`).
    pub fn center_edges(&self) -> Vec<f64> {
        let half = self.bin_size / 2.0;
        self.left_edges().into_iter().map(|e| e + half).collect()
    }
}
