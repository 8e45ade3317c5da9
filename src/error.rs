//! Error taxonomy for binning, conversion and generation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BinningError>;

/// Errors raised while resolving, validating, materializing or combining
/// binned spike trains.
///
/// All of these are deterministic input errors. They are raised at
/// construction or combination time, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BinningError {
    /// Fewer than three of {t_start, t_stop, bin_size, num_bins} could be resolved.
    #[error(
        "insufficient binning parameters: need at least three of t_start ({t_start}), \
         t_stop ({t_stop}), bin_size ({bin_size}), num_bins ({num_bins})"
    )]
    InsufficientParameters {
        /// Display form of t_start, or "None".
        t_start: String,
        /// Display form of t_stop, or "None".
        t_stop: String,
        /// Display form of bin_size, or "None".
        bin_size: String,
        /// Display form of num_bins, or "None".
        num_bins: String,
    },

    /// t_stop lies before t_start where a forward window is required.
    #[error("t_stop ({t_stop}) is smaller than t_start ({t_start})")]
    Ordering {
        /// Requested start.
        t_start: String,
        /// Requested stop.
        t_stop: String,
    },

    /// The latest input start is not before the earliest input stop.
    #[error("starting time of each spike train must be smaller than each stopping time")]
    DisjointIntervals,

    /// t_start lies outside the window covered by every input.
    #[error("some spike trains are not defined at t_start ({t_start})")]
    StartOutOfRange {
        /// Requested start.
        t_start: String,
    },

    /// t_stop lies outside the window covered by every input.
    #[error("some spike trains are not defined at t_stop ({t_stop})")]
    StopOutOfRange {
        /// Requested stop.
        t_stop: String,
    },

    /// Too many or too large bins: the window runs past an input's stop.
    #[error("too many / too large time bins: some spike trains end before t_stop ({t_stop})")]
    StopTooLarge {
        /// Resolved stop.
        t_stop: String,
    },

    /// The four resolved parameters contradict each other.
    #[error(
        "inconsistent arguments t_start ({t_start}), t_stop ({t_stop}), bin_size ({bin_size}) \
         and num_bins ({num_bins}); derivable num_bins is {expected}"
    )]
    InconsistentParameters {
        /// Resolved start.
        t_start: String,
        /// Resolved stop.
        t_stop: String,
        /// Resolved bin width.
        bin_size: String,
        /// Requested bin count.
        num_bins: usize,
        /// Bin count derivable from the window and width.
        expected: i64,
    },

    /// The bin count could not be derived as a non-negative integer.
    #[error("number of bins is not a non-negative integer: {value}")]
    NonIntegerBinCount {
        /// The offending ratio.
        value: f64,
    },

    /// The bin width is zero or negative.
    #[error("bin_size must be positive, got {bin_size}")]
    InvalidBinSize {
        /// Requested bin width.
        bin_size: String,
    },

    /// Resolution produced fewer than one bin.
    #[error("number of bins is smaller than 1 ({num_bins}); check the input parameters")]
    EmptyRange {
        /// Resolved bin count.
        num_bins: usize,
    },

    /// A stored bin index does not fit the matrix width.
    #[error(
        "bin index {column} in row {row} is outside [0, {columns}); \
         the matrix would be inconsistent in size"
    )]
    ColumnIndex {
        /// Row holding the bad index.
        row: usize,
        /// The bad index.
        column: usize,
        /// Matrix width (num_bins).
        columns: usize,
    },

    /// Operands of a combination have different shapes.
    #[error("shape mismatch: {left_rows}x{left_columns} vs {right_rows}x{right_columns}")]
    ShapeMismatch {
        /// Rows of the left operand.
        left_rows: usize,
        /// Columns of the left operand.
        left_columns: usize,
        /// Rows of the right operand.
        right_rows: usize,
        /// Columns of the right operand.
        right_columns: usize,
    },

    /// An input does not have the shape of an event sequence.
    #[error("not an event sequence: {reason}")]
    TypeMismatch {
        /// What was wrong with the input.
        reason: &'static str,
    },

    /// No spike trains were supplied.
    #[error("at least one spike train is required")]
    NoSpikeTrains,

    /// Generator arguments out of range.
    #[error("invalid generator parameter: {reason}")]
    InvalidGeneratorParameter {
        /// Which constraint was violated.
        reason: &'static str,
    },

    /// An id list does not match the number of rows.
    #[error("expected {expected} ids, got {actual}")]
    LengthMismatch {
        /// Number of rows.
        expected: usize,
        /// Number of ids supplied.
        actual: usize,
    },
}

impl BinningError {
    pub(crate) fn type_mismatch(reason: &'static str) -> Self {
        Self::TypeMismatch { reason }
    }

    pub(crate) fn generator(reason: &'static str) -> Self {
        Self::InvalidGeneratorParameter { reason }
    }
}
