//! Spike trains - immutable, time-ordered event sequences
//!
//! The binning engine only needs the [`EventSequence`] shape: ordered
//! timestamps plus a validity window `[t_start, t_stop]` and a unit.
//! [`SpikeTrain`] is the validated implementation used by the generators
//! and the conversion helpers.

use crate::error::{BinningError, Result};
use crate::quantity::{Quantity, TimeUnit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered sequence of event times with a validity window.
pub trait EventSequence {
    /// Event times as magnitudes in [`EventSequence::unit`], ascending.
    fn times(&self) -> &[f64];

    /// Unit of the magnitudes returned by [`EventSequence::times`].
    fn unit(&self) -> TimeUnit;

    /// Start of the validity window.
    fn t_start(&self) -> Quantity;

    /// Stop of the validity window.
    fn t_stop(&self) -> Quantity;

    /// Number of events.
    fn len(&self) -> usize {
        self.times().len()
    }

    /// Whether the sequence holds no events.
    fn is_empty(&self) -> bool {
        self.times().is_empty()
    }

    /// Event times rescaled into `unit`.
    fn times_in(&self, unit: TimeUnit) -> Vec<f64> {
        let own = self.unit();
        self.times().iter().map(|&t| own.convert(t, unit)).collect()
    }
}

/// A validated spike train.
///
/// Times are sorted, finite and lie within `[t_start, t_stop]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeTrain {
    times: Vec<f64>,
    unit: TimeUnit,
    t_start: f64,
    t_stop: f64,
}

impl SpikeTrain {
    /// Create a spike train from magnitudes in `unit`.
    ///
    /// `t_start` and `t_stop` are rescaled into `unit`.
    pub fn new(
        times: Vec<f64>,
        unit: TimeUnit,
        t_start: Quantity,
        t_stop: Quantity,
    ) -> Result<Self> {
        let t_start = t_start.magnitude_in(unit);
        let t_stop = t_stop.magnitude_in(unit);

        if !t_start.is_finite() || !t_stop.is_finite() {
            return Err(BinningError::type_mismatch("window bounds must be finite"));
        }
        if t_start > t_stop {
            return Err(BinningError::type_mismatch("t_start lies after t_stop"));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(BinningError::type_mismatch("spike times must be finite"));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(BinningError::type_mismatch("spike times must be sorted"));
        }
        if let (Some(&first), Some(&last)) = (times.first(), times.last()) {
            if first < t_start || last > t_stop {
                return Err(BinningError::type_mismatch(
                    "spike times must lie within [t_start, t_stop]",
                ));
            }
        }

        Ok(Self {
            times,
            unit,
            t_start,
            t_stop,
        })
    }

    /// Create a spike train starting at zero in the unit of `t_stop`.
    pub fn with_stop(times: Vec<f64>, t_stop: Quantity) -> Result<Self> {
        let unit = t_stop.unit();
        Self::new(times, unit, Quantity::new(0.0, unit), t_stop)
    }

    /// Create a spike train from individual quantities, expressed in `unit`.
    ///
    /// Times are sorted before validation.
    pub fn from_quantities(
        times: &[Quantity],
        unit: TimeUnit,
        t_start: Quantity,
        t_stop: Quantity,
    ) -> Result<Self> {
        let mut magnitudes: Vec<f64> = times.iter().map(|q| q.magnitude_in(unit)).collect();
        magnitudes.sort_by(f64::total_cmp);
        Self::new(magnitudes, unit, t_start, t_stop)
    }

    /// Same train with every magnitude expressed in `unit`.
    pub fn rescale(&self, unit: TimeUnit) -> Self {
        Self {
            times: self.times_in(unit),
            unit,
            t_start: self.unit.convert(self.t_start, unit),
            t_stop: self.unit.convert(self.t_stop, unit),
        }
    }

    /// Window length `t_stop - t_start`.
    pub fn duration(&self) -> Quantity {
        Quantity::new(self.t_stop - self.t_start, self.unit)
    }
}

impl EventSequence for SpikeTrain {
    fn times(&self) -> &[f64] {
        &self.times
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn t_start(&self) -> Quantity {
        Quantity::new(self.t_start, self.unit)
    }

    fn t_stop(&self) -> Quantity {
        Quantity::new(self.t_stop, self.unit)
    }
}

/// Latest start and earliest stop across `trains`.
///
/// Returns `None` for an empty slice.
pub fn aligned_window<S: EventSequence>(trains: &[S]) -> Option<(Quantity, Quantity)> {
    let (first, rest) = trains.split_first()?;
    Some(rest.iter().fold(
        (first.t_start(), first.t_stop()),
        |(start, stop), train| (start.max(train.t_start()), stop.min(train.t_stop())),
    ))
}
