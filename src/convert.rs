//! Conversions between spike trains, binned views and export formats
//!
//! Thin helpers over the binning engine: gdf rows, co-occurrence
//! transactions, train reconstruction from binned rows, single-train
//! histograms and operational-time transposition.

use crate::binned::BinnedSpikeTrain;
use crate::config::BinningConfig;
use crate::error::{BinningError, Result};
use crate::quantity::{Quantity, TimeUnit};
use crate::rate::RateProfile;
use crate::spec::FLOOR_TOLERANCE;
use crate::train::{aligned_window, EventSequence, SpikeTrain};

/// Where a reconstructed spike sits inside its bin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Left border of the bin.
    #[default]
    Left,
    /// Bin center.
    Center,
    /// Right border of the bin.
    Right,
}

impl Alignment {
    /// Offset from the left border, as a fraction of the bin width.
    pub fn shift(self) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => 0.5,
            Alignment::Right => 1.0,
        }
    }
}

/// Bin specification for [`train_to_binned`].
#[derive(Clone, Debug, PartialEq)]
pub enum Bins {
    /// Equal-width bins spanning the train window.
    Count(usize),
    /// Fixed-width bins from `t_start`; the last one is cut at `t_stop`.
    Width(Quantity),
    /// Explicit ascending edges.
    Edges(Vec<Quantity>),
}

/// Half-open arithmetic sequence `[t_start, t_stop)` in `step`'s unit.
pub fn time_axis(t_start: Quantity, t_stop: Quantity, step: Quantity) -> Result<Vec<f64>> {
    if !(step.magnitude() > 0.0) {
        return Err(BinningError::InvalidBinSize {
            bin_size: step.to_string(),
        });
    }
    let unit = step.unit();
    let start = t_start.magnitude_in(unit);
    let stop = t_stop.magnitude_in(unit);
    let width = step.magnitude();

    Ok((0..)
        .map(|i| start + i as f64 * width)
        .take_while(|&t| stop - t > FLOOR_TOLERANCE * width)
        .collect())
}

// =========================================================================
// EXPORT
// =========================================================================

/// Flatten trains into `(id, time)` rows sorted by time.
///
/// Times are expressed in the finest unit among the inputs, which is
/// returned alongside. Ids default to `0..n`.
pub fn gdf<S: EventSequence>(
    trains: &[S],
    ids: Option<&[usize]>,
) -> Result<(Vec<(usize, f64)>, TimeUnit)> {
    let first = trains.first().ok_or(BinningError::NoSpikeTrains)?;
    let unit = trains
        .iter()
        .fold(first.unit(), |unit, train| unit.finer(train.unit()));

    let default_ids: Vec<usize>;
    let ids: &[usize] = match ids {
        Some(ids) if ids.len() != trains.len() => {
            return Err(BinningError::LengthMismatch {
                expected: trains.len(),
                actual: ids.len(),
            })
        }
        Some(ids) => ids,
        None => {
            default_ids = (0..trains.len()).collect();
            &default_ids
        }
    };

    let mut rows: Vec<(usize, f64)> = ids
        .iter()
        .zip(trains)
        .flat_map(|(&id, train)| train.times_in(unit).into_iter().map(move |t| (id, t)))
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok((rows, unit))
}

/// For each bin, the ids of the rows with at least one spike in it.
pub fn transactions<T: Clone>(binned: &BinnedSpikeTrain, ids: &[T]) -> Result<Vec<Vec<T>>> {
    if ids.len() != binned.matrix_rows() {
        return Err(BinningError::LengthMismatch {
            expected: binned.matrix_rows(),
            actual: ids.len(),
        });
    }
    let clipped = binned.matrix_clipped()?;
    Ok((0..binned.num_bins())
        .map(|bin| {
            ids.iter()
                .zip(clipped.iter_rows())
                .filter(|(_, row)| row[bin] > 0)
                .map(|(id, _)| id.clone())
                .collect()
        })
        .collect())
}

/// Bin `trains` with `bin_size` and export their transactions.
///
/// An omitted `t_start` (`t_stop`) requires every train to share the same
/// start (stop). An explicit one must lie inside every train's window.
pub fn transactions_from_trains<S: EventSequence, T: Clone>(
    trains: &[S],
    bin_size: Quantity,
    t_start: Option<Quantity>,
    t_stop: Option<Quantity>,
    ids: &[T],
) -> Result<Vec<Vec<T>>> {
    let (max_start, min_stop) = aligned_window(trains).ok_or(BinningError::NoSpikeTrains)?;
    let min_start = trains
        .iter()
        .map(EventSequence::t_start)
        .fold(max_start, Quantity::min);
    let max_stop = trains
        .iter()
        .map(EventSequence::t_stop)
        .fold(min_stop, Quantity::max);

    let start = match t_start {
        None if min_start != max_start => {
            return Err(BinningError::StartOutOfRange {
                t_start: "None (spike trains start at different times)".to_string(),
            })
        }
        None => max_start,
        Some(t) if t < max_start => {
            return Err(BinningError::StartOutOfRange { t_start: t.to_string() })
        }
        Some(t) => t,
    };
    let stop = match t_stop {
        None if min_stop != max_stop => {
            return Err(BinningError::StopOutOfRange {
                t_stop: "None (spike trains stop at different times)".to_string(),
            })
        }
        None => min_stop,
        Some(t) if t > min_stop => {
            return Err(BinningError::StopOutOfRange { t_stop: t.to_string() })
        }
        Some(t) => t,
    };

    let config = BinningConfig::with_bin_size(bin_size).t_start(start).t_stop(stop);
    let binned = BinnedSpikeTrain::new(trains, &config)?;
    transactions(&binned, ids)
}

// =========================================================================
// RECONSTRUCTION
// =========================================================================

/// Rebuild a spike train from one binned row.
///
/// Every bin with a positive value yields one spike at
/// `start + (i + shift) * bin_size`. `start` defaults to zero and `stop` to
/// `start + row.len() * bin_size`; both are expressed in `bin_size`'s unit.
pub fn binned_to_train(
    row: &[u32],
    bin_size: Quantity,
    align: Alignment,
    start: Option<Quantity>,
    stop: Option<Quantity>,
) -> Result<SpikeTrain> {
    let unit = bin_size.unit();
    let width = bin_size.magnitude();
    let start = start.unwrap_or(Quantity::new(0.0, unit)).rescale(unit);
    let stop = stop.unwrap_or(start + bin_size * row.len() as f64);
    let shift = align.shift();

    let times = row
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .map(|(i, _)| start.magnitude() + (i as f64 + shift) * width)
        .collect();
    SpikeTrain::new(times, unit, start, stop)
}

/// Histogram a single train.
///
/// Bins are half-open `[a, b)` except the last, which also counts spikes
/// exactly at its right edge. Returns the per-bin values (0/1 when `clip`)
/// and the edges as quantities in the train's unit.
pub fn train_to_binned<S: EventSequence>(
    train: &S,
    bins: &Bins,
    clip: bool,
) -> Result<(Vec<u32>, Vec<Quantity>)> {
    let unit = train.unit();
    let start = train.t_start().magnitude();
    let stop = train.t_stop().magnitude();

    let edges: Vec<f64> = match bins {
        Bins::Count(0) => return Err(BinningError::EmptyRange { num_bins: 0 }),
        Bins::Count(n) => {
            let step = (stop - start) / *n as f64;
            (0..=*n)
                .map(|i| if i == *n { stop } else { start + i as f64 * step })
                .collect()
        }
        Bins::Width(width) => {
            let step = Quantity::new(width.magnitude_in(unit), unit);
            let mut edges = time_axis(train.t_start(), train.t_stop(), step)?;
            edges.push(stop);
            edges
        }
        Bins::Edges(edges) => edges.iter().map(|q| q.magnitude_in(unit)).collect(),
    };
    if edges.len() < 2 {
        return Err(BinningError::EmptyRange { num_bins: 0 });
    }
    if edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(BinningError::type_mismatch("bin edges must be strictly ascending"));
    }

    let last = edges.len() - 2;
    let mut counts = vec![0u32; edges.len() - 1];
    for &t in train.times() {
        if t < edges[0] || t > edges[last + 1] {
            continue;
        }
        let bin = (edges.partition_point(|&e| e <= t) - 1).min(last);
        counts[bin] += 1;
    }
    if clip {
        for c in &mut counts {
            *c = (*c).min(1);
        }
    }
    Ok((counts, edges.into_iter().map(|e| Quantity::new(e, unit)).collect()))
}

// =========================================================================
// OPERATIONAL TIME
// =========================================================================

/// Map spike times onto the cumulative rate: `t_k -> dt * sum(rate[..=floor(t_k/dt)])`.
///
/// Times are taken in seconds relative to the profile start; spikes beyond
/// the profile are dropped. The result lives in `[0, dt * sum(rate)]` seconds.
pub fn to_operational_time<S: EventSequence>(train: &S, rate: &RateProfile) -> Result<SpikeTrain> {
    let dt = rate.dt_seconds();
    let origin = rate.t_start().magnitude_in(TimeUnit::Second);
    let cumulative: Vec<f64> = rate
        .rates_hz()
        .iter()
        .scan(0.0, |acc, &r| {
            *acc += r;
            Some(*acc)
        })
        .collect();

    let times = train
        .times_in(TimeUnit::Second)
        .into_iter()
        .filter_map(|t| {
            let k = ((t - origin) / dt).floor();
            if k < 0.0 {
                return None;
            }
            cumulative.get(k as usize).map(|c| c * dt)
        })
        .collect();

    let total = cumulative.last().copied().unwrap_or(0.0) * dt;
    SpikeTrain::new(times, TimeUnit::Second, Quantity::seconds(0.0), Quantity::seconds(total))
}
