//! Binned Spikes - discretise spike trains into fixed-width time bins
//!
//! Many spike trains, one time grid.
//!
//! # Core Types
//!
//! - **Quantity / TimeUnit**: Magnitudes with an explicit time unit
//! - **SpikeTrain**: Sorted event times inside a `[t_start, t_stop]` window
//! - **BinningConfig**: Three of `t_start`, `t_stop`, `bin_size`, `num_bins`
//! - **BinningSpec**: The resolved, validated grid
//! - **BinnedSpikeTrain**: Per-train bin indices with clipped and unclipped matrices
//!
//! # Architecture: Config / Spec / Binned
//!
//! 1. **Config** - What the caller knows about the grid
//! 2. **Spec** - The grid once the missing parameter is derived and checked
//! 3. **Binned** - Bin indices for every train, plus the matrix views
//!
//! Bins are half-open `[left, right)`. Events outside the grid are dropped
//! silently. Floor operations snap ratios within a few ulps (at least `1e-9`
//! bin widths) of an integer, so events that sit on an edge up to rounding
//! error land in the bin that edge opens.
//!
//! # Example
//!
//! ```rust
//! use binned_spikes::{BinnedSpikeTrain, BinningConfig, Quantity, SpikeTrain};
//!
//! let stop = Quantity::seconds(10.0);
//! let a = SpikeTrain::with_stop(vec![0.5, 0.7, 1.2, 3.1, 4.3, 5.5, 6.7], stop).unwrap();
//! let b = SpikeTrain::with_stop(vec![0.1, 0.7, 1.2, 2.2, 4.3, 5.5, 8.0], stop).unwrap();
//!
//! let config = BinningConfig::with_bin_size(Quantity::seconds(1.0)).store_mat(true);
//! let binned = BinnedSpikeTrain::new(&[a, b], &config).unwrap();
//!
//! assert_eq!(binned.num_bins(), 10);
//! assert_eq!(binned.filled()[0], vec![0, 0, 1, 3, 4, 5, 6]);
//!
//! let clipped = binned.matrix_clipped().unwrap();
//! assert_eq!(clipped.row(0), Some(&[1, 1, 0, 1, 1, 1, 1, 0, 0, 0][..]));
//!
//! let counts = binned.matrix_unclipped().unwrap();
//! assert_eq!(counts.row(0), Some(&[2, 1, 0, 1, 1, 1, 1, 0, 0, 0][..]));
//! ```

mod binned;
mod config;
mod error;
mod matrix;
mod quantity;
mod rate;
mod spec;
mod train;

pub mod convert;
pub mod generate;

pub use binned::{BinnedSpikeTrain, Materialize, MatrixKind};
pub use config::{calc_bin_size, calc_num_bins, BinningConfig};
pub use error::{BinningError, Result};
pub use matrix::BinMatrix;
pub use quantity::{Quantity, TimeUnit};
pub use rate::RateProfile;
pub use spec::{tolerant_floor, BinningSpec, FLOOR_TOLERANCE};
pub use train::{aligned_window, EventSequence, SpikeTrain};
