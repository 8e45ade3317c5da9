//! Time quantities - a scalar tagged with a time unit
//!
//! Rescaling between units goes through exact powers of ten, so
//! `1000 ms -> 1 s` does not pick up the error of multiplying by `0.001`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Time units supported by the binning engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeUnit {
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
}

impl TimeUnit {
    /// Power of ten relative to one second.
    pub fn exponent(self) -> i32 {
        match self {
            TimeUnit::Second => 0,
            TimeUnit::Millisecond => -3,
            TimeUnit::Microsecond => -6,
            TimeUnit::Nanosecond => -9,
        }
    }

    /// Short symbol used in display output.
    pub fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }

    /// Convert a magnitude expressed in `self` into `target`.
    pub fn convert(self, magnitude: f64, target: TimeUnit) -> f64 {
        let shift = self.exponent() - target.exponent();
        match shift.cmp(&0) {
            Ordering::Equal => magnitude,
            Ordering::Greater => magnitude * 10f64.powi(shift),
            Ordering::Less => magnitude / 10f64.powi(-shift),
        }
    }

    /// The finer (smaller) of two units.
    pub fn finer(self, other: TimeUnit) -> TimeUnit {
        if other.exponent() < self.exponent() {
            other
        } else {
            self
        }
    }

    /// Length of one unit in seconds.
    pub fn seconds(self) -> f64 {
        self.convert(1.0, TimeUnit::Second)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A scalar time value tagged with its unit.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quantity {
    magnitude: f64,
    unit: TimeUnit,
}

impl Quantity {
    /// Create a quantity.
    pub const fn new(magnitude: f64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Quantity in seconds.
    pub const fn seconds(magnitude: f64) -> Self {
        Self::new(magnitude, TimeUnit::Second)
    }

    /// Quantity in milliseconds.
    pub const fn millis(magnitude: f64) -> Self {
        Self::new(magnitude, TimeUnit::Millisecond)
    }

    /// Quantity in microseconds.
    pub const fn micros(magnitude: f64) -> Self {
        Self::new(magnitude, TimeUnit::Microsecond)
    }

    /// Quantity in nanoseconds.
    pub const fn nanos(magnitude: f64) -> Self {
        Self::new(magnitude, TimeUnit::Nanosecond)
    }

    /// Raw magnitude in this quantity's own unit.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Unit of this quantity.
    #[inline]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Magnitude expressed in `unit`.
    #[inline]
    pub fn magnitude_in(&self, unit: TimeUnit) -> f64 {
        self.unit.convert(self.magnitude, unit)
    }

    /// Same duration expressed in `unit`.
    pub fn rescale(&self, unit: TimeUnit) -> Self {
        Self::new(self.magnitude_in(unit), unit)
    }

    /// Dimensionless ratio `self / other`.
    pub fn ratio(&self, other: &Quantity) -> f64 {
        self.magnitude_in(other.unit) / other.magnitude
    }

    /// Whether the magnitude is finite.
    pub fn is_finite(&self) -> bool {
        self.magnitude.is_finite()
    }

    /// The larger of two quantities, in the unit of whichever wins.
    pub fn max(self, other: Quantity) -> Quantity {
        if other > self {
            other
        } else {
            self
        }
    }

    /// The smaller of two quantities, in the unit of whichever wins.
    pub fn min(self, other: Quantity) -> Quantity {
        if other < self {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        let unit = self.unit.finer(other.unit);
        self.magnitude_in(unit) == other.magnitude_in(unit)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let unit = self.unit.finer(other.unit);
        self.magnitude_in(unit)
            .partial_cmp(&other.magnitude_in(unit))
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.magnitude + rhs.magnitude_in(self.unit), self.unit)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity::new(self.magnitude - rhs.magnitude_in(self.unit), self.unit)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.magnitude * rhs, self.unit)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity::new(self.magnitude / rhs, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_is_exact_for_decimal_steps() {
        assert_eq!(Quantity::millis(1000.0).magnitude_in(TimeUnit::Second), 1.0);
        assert_eq!(Quantity::seconds(1.5).magnitude_in(TimeUnit::Millisecond), 1500.0);
        assert_eq!(Quantity::nanos(250.0).magnitude_in(TimeUnit::Microsecond), 0.25);
    }

    #[test]
    fn test_cross_unit_comparison() {
        assert_eq!(Quantity::seconds(1.0), Quantity::millis(1000.0));
        assert!(Quantity::millis(999.0) < Quantity::seconds(1.0));
        assert!(Quantity::micros(1.0) > Quantity::nanos(999.0));
    }

    #[test]
    fn test_arithmetic_keeps_left_unit() {
        let sum = Quantity::seconds(1.0) + Quantity::millis(500.0);
        assert_eq!(sum.unit(), TimeUnit::Second);
        assert!((sum.magnitude() - 1.5).abs() < 1e-12);

        let diff = Quantity::millis(2000.0) - Quantity::seconds(0.5);
        assert_eq!(diff.unit(), TimeUnit::Millisecond);
        assert!((diff.magnitude() - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio() {
        let window = Quantity::seconds(10.0);
        let width = Quantity::millis(250.0);
        assert!((window.ratio(&width) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_max() {
        let a = Quantity::seconds(2.0);
        let b = Quantity::millis(1500.0);
        assert_eq!(a.max(b), a);
        assert_eq!(a.min(b), b);
        assert_eq!(a.min(b).unit(), TimeUnit::Millisecond);
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::millis(5.0).to_string(), "5 ms");
    }
}
