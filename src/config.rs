//! Binning configuration and parameter resolution

use crate::error::{BinningError, Result};
use crate::quantity::Quantity;
use crate::spec::{tolerant_floor, BinningSpec};
use crate::train::{aligned_window, EventSequence};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Partially specified binning parameters.
///
/// Any three of `t_start`, `t_stop`, `bin_size` and `num_bins` determine the
/// fourth. With fewer than three, the missing window bounds are taken from
/// the inputs (latest start, earliest stop).
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinningConfig {
    /// Left edge of the first bin (inclusive).
    pub t_start: Option<Quantity>,

    /// Right edge of the last bin (exclusive).
    pub t_stop: Option<Quantity>,

    /// Width of each bin.
    pub bin_size: Option<Quantity>,

    /// Number of bins.
    pub num_bins: Option<usize>,

    /// Cache materialized matrices by default.
    pub store_mat: bool,
}

impl BinningConfig {
    /// Configuration with only a bin width.
    pub fn with_bin_size(bin_size: Quantity) -> Self {
        Self {
            bin_size: Some(bin_size),
            ..Self::default()
        }
    }

    /// Configuration with only a bin count.
    pub fn with_num_bins(num_bins: usize) -> Self {
        Self {
            num_bins: Some(num_bins),
            ..Self::default()
        }
    }

    /// Set the start of the binned window.
    pub fn t_start(mut self, t_start: Quantity) -> Self {
        self.t_start = Some(t_start);
        self
    }

    /// Set the stop of the binned window.
    pub fn t_stop(mut self, t_stop: Quantity) -> Self {
        self.t_stop = Some(t_stop);
        self
    }

    /// Set the bin width.
    pub fn bin_size(mut self, bin_size: Quantity) -> Self {
        self.bin_size = Some(bin_size);
        self
    }

    /// Set the bin count.
    pub fn num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = Some(num_bins);
        self
    }

    /// Cache matrices on first materialization.
    pub fn store_mat(mut self, store: bool) -> Self {
        self.store_mat = store;
        self
    }

    /// Number of parameters given.
    pub fn param_count(&self) -> usize {
        [
            self.t_start.is_some(),
            self.t_stop.is_some(),
            self.bin_size.is_some(),
            self.num_bins.is_some(),
        ]
        .iter()
        .filter(|&&given| given)
        .count()
    }

    /// Local sanity checks that need no inputs.
    pub fn validate(&self) -> Result<()> {
        for q in [self.t_start, self.t_stop, self.bin_size].into_iter().flatten() {
            if !q.is_finite() {
                return Err(BinningError::type_mismatch("binning parameters must be finite"));
            }
        }
        if let Some(width) = self.bin_size {
            if width.magnitude() <= 0.0 {
                return Err(BinningError::InvalidBinSize {
                    bin_size: width.to_string(),
                });
            }
        }
        if self.num_bins == Some(0) {
            return Err(BinningError::EmptyRange { num_bins: 0 });
        }
        Ok(())
    }

    fn insufficient(&self) -> BinningError {
        fn show<T: ToString>(v: Option<T>) -> String {
            v.map_or_else(|| "None".to_string(), |v| v.to_string())
        }
        BinningError::InsufficientParameters {
            t_start: show(self.t_start),
            t_stop: show(self.t_stop),
            bin_size: show(self.bin_size),
            num_bins: show(self.num_bins),
        }
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Derive the missing parameter, using `trains` for window bounds when
    /// fewer than three are given.
    ///
    /// The result is expressed in the unit of the bin width and is not yet
    /// checked against the inputs; see [`BinningSpec::validate_against`].
    pub fn resolve<S: EventSequence>(&self, trains: &[S]) -> Result<BinningSpec> {
        self.validate()?;

        let mut params = self.clone();
        if params.param_count() < 3 {
            let (start, stop) = aligned_window(trains).ok_or(BinningError::NoSpikeTrains)?;
            params.t_start.get_or_insert(start);
            params.t_stop.get_or_insert(stop);
        }
        if params.param_count() < 3 {
            return Err(params.insufficient());
        }

        let spec = match (params.t_start, params.t_stop, params.bin_size, params.num_bins) {
            (None, Some(stop), Some(width), Some(n)) => {
                let stop = stop.rescale(width.unit());
                BinningSpec::from_parts(stop - width * n as f64, stop, width, n)
            }
            (Some(start), None, Some(width), Some(n)) => {
                let start = start.rescale(width.unit());
                BinningSpec::from_parts(start, start + width * n as f64, width, n)
            }
            (Some(start), Some(stop), Some(width), None) => {
                let n = calc_num_bins(start, stop, width)?;
                BinningSpec::from_parts(start, stop, width, n)
            }
            (Some(start), Some(stop), None, Some(n)) => {
                let width = calc_bin_size(start, stop, n)?;
                BinningSpec::from_parts(start, stop, width, n)
            }
            (Some(start), Some(stop), Some(width), Some(n)) => {
                BinningSpec::from_parts(start, stop, width, n)
            }
            _ => return Err(params.insufficient()),
        };
        Ok(spec)
    }
}

/// `floor((t_stop - t_start) / bin_size)`, with the window rescaled into the
/// bin width's unit first.
pub fn calc_num_bins(t_start: Quantity, t_stop: Quantity, bin_size: Quantity) -> Result<usize> {
    if t_stop < t_start {
        return Err(BinningError::Ordering {
            t_start: t_start.to_string(),
            t_stop: t_stop.to_string(),
        });
    }
    let ratio = tolerant_floor((t_stop - t_start).ratio(&bin_size));
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(BinningError::NonIntegerBinCount { value: ratio });
    }
    Ok(ratio as usize)
}

/// `(t_stop - t_start) / num_bins`, in the unit of `t_start`.
pub fn calc_bin_size(t_start: Quantity, t_stop: Quantity, num_bins: usize) -> Result<Quantity> {
    if t_stop < t_start {
        return Err(BinningError::Ordering {
            t_start: t_start.to_string(),
            t_stop: t_stop.to_string(),
        });
    }
    if num_bins == 0 {
        return Err(BinningError::EmptyRange { num_bins });
    }
    Ok((t_stop - t_start) / num_bins as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::TimeUnit;
    use crate::train::SpikeTrain;

    fn trains() -> Vec<SpikeTrain> {
        vec![SpikeTrain::with_stop(vec![0.5, 0.7, 1.2], Quantity::seconds(10.0)).unwrap()]
    }

    #[test]
    fn test_resolve_start() {
        let spec = BinningConfig::with_num_bins(5)
            .bin_size(Quantity::seconds(1.0))
            .t_stop(Quantity::seconds(10.0))
            .resolve(&trains())
            .unwrap();
        assert_eq!(spec.t_start(), Quantity::seconds(5.0));
    }

    #[test]
    fn test_resolve_stop_in_bin_unit() {
        let spec = BinningConfig::with_num_bins(4)
            .bin_size(Quantity::millis(250.0))
            .t_start(Quantity::seconds(1.0))
            .resolve(&trains())
            .unwrap();
        assert_eq!(spec.unit(), TimeUnit::Millisecond);
        assert_eq!(spec.t_start().magnitude(), 1000.0);
        assert_eq!(spec.t_stop().magnitude(), 2000.0);
    }

    #[test]
    fn test_resolve_num_bins() {
        let spec = BinningConfig::with_bin_size(Quantity::seconds(0.1))
            .t_start(Quantity::seconds(0.0))
            .t_stop(Quantity::seconds(0.3))
            .resolve(&trains())
            .unwrap();
        assert_eq!(spec.num_bins(), 3);
    }

    #[test]
    fn test_resolve_bin_size() {
        let spec = BinningConfig::with_num_bins(8)
            .t_start(Quantity::seconds(0.0))
            .t_stop(Quantity::seconds(2.0))
            .resolve(&trains())
            .unwrap();
        assert_eq!(spec.bin_size(), Quantity::seconds(0.25));
    }

    #[test]
    fn test_window_taken_from_inputs() {
        let spec = BinningConfig::with_bin_size(Quantity::seconds(1.0))
            .resolve(&trains())
            .unwrap();
        assert_eq!(spec.t_start(), Quantity::seconds(0.0));
        assert_eq!(spec.t_stop(), Quantity::seconds(10.0));
        assert_eq!(spec.num_bins(), 10);
    }

    #[test]
    fn test_insufficient_parameters() {
        let result = BinningConfig::default().resolve(&trains());
        assert!(matches!(result, Err(BinningError::InsufficientParameters { .. })));
    }

    #[test]
    fn test_ordering_errors() {
        let one = Quantity::seconds(1.0);
        let result = calc_num_bins(Quantity::seconds(5.0), one, one);
        assert!(matches!(result, Err(BinningError::Ordering { .. })));

        let result = calc_bin_size(Quantity::seconds(5.0), Quantity::seconds(1.0), 4);
        assert!(matches!(result, Err(BinningError::Ordering { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_width() {
        let config = BinningConfig::with_bin_size(Quantity::seconds(0.0));
        assert!(matches!(config.validate(), Err(BinningError::InvalidBinSize { .. })));

        let config = BinningConfig::with_bin_size(Quantity::seconds(-1.0));
        assert!(matches!(config.validate(), Err(BinningError::InvalidBinSize { .. })));
    }

    #[test]
    fn test_param_count() {
        let config = BinningConfig::with_num_bins(3).t_start(Quantity::seconds(0.0));
        assert_eq!(config.param_count(), 2);
    }
}
