//! Sampled firing-rate profiles

use crate::error::{BinningError, Result};
use crate::quantity::{Quantity, TimeUnit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piecewise-constant rate signal in Hz, sampled every `sampling_period`
/// from `t_start`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateProfile {
    rates_hz: Vec<f64>,
    sampling_period: Quantity,
    t_start: Quantity,
}

impl RateProfile {
    /// Create a profile. Rates must be finite and non-negative, the period positive.
    pub fn new(
        rates_hz: Vec<f64>,
        sampling_period: Quantity,
        t_start: Quantity,
    ) -> Result<Self> {
        if rates_hz.is_empty() {
            return Err(BinningError::generator("rate profile is empty"));
        }
        if rates_hz.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(BinningError::generator("rates must be finite and non-negative"));
        }
        if !(sampling_period.magnitude() > 0.0) || !sampling_period.is_finite() {
            return Err(BinningError::generator("sampling period must be positive"));
        }
        Ok(Self {
            rates_hz,
            sampling_period,
            t_start,
        })
    }

    /// Samples in Hz.
    pub fn rates_hz(&self) -> &[f64] {
        &self.rates_hz
    }

    /// Spacing between samples.
    pub fn sampling_period(&self) -> Quantity {
        self.sampling_period
    }

    /// Time of the first sample.
    pub fn t_start(&self) -> Quantity {
        self.t_start
    }

    /// End of the last sample interval.
    pub fn t_stop(&self) -> Quantity {
        let period = self.sampling_period.rescale(self.t_start.unit());
        self.t_start + period * self.rates_hz.len() as f64
    }

    /// Largest sample.
    pub fn max_rate(&self) -> f64 {
        self.rates_hz.iter().copied().fold(0.0, f64::max)
    }

    /// Rate in effect at `t`, or `None` outside the profile.
    pub fn rate_at(&self, t: Quantity) -> Option<f64> {
        let offset = (t - self.t_start).ratio(&self.sampling_period);
        if offset < 0.0 {
            return None;
        }
        self.rates_hz.get(offset.floor() as usize).copied()
    }

    /// Sampling period in seconds.
    pub(crate) fn dt_seconds(&self) -> f64 {
        self.sampling_period.magnitude_in(TimeUnit::Second)
    }
}
