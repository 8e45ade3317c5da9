//! Stochastic point-process generators for null-hypothesis data
//!
//! Every generator returns validated [`SpikeTrain`]s and draws from a
//! caller-supplied [`Rng`], so seeded runs are reproducible. Stationary
//! generators express their output in the unit of `t_stop`; generators
//! driven by a [`RateProfile`] use the unit of the profile's start.
//!
//! # Families
//!
//! - **Renewal**: [`poisson`], [`gamma`], [`gamma_thinning`]
//! - **Rate-modulated**: [`inhomogeneous_poisson`], [`gamma_nonstationary`]
//! - **Injected coincidences**: [`sip`], [`msip`]
//! - **Compound**: [`cpp`], [`cpp_heterogeneous`], [`cpp_nonstationary`],
//!   [`cgp`], [`cgp_nonstationary`]
//!
//! Compound processes draw one mother process and copy each of its events
//! into `j` of the output trains, with `j` drawn from an amplitude
//! distribution `A` where `A[j]` is the probability of exactly `j` copies.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use rand_distr::{Exp, Gamma};
use tracing::debug;

use crate::error::{BinningError, Result};
use crate::quantity::{Quantity, TimeUnit};
use crate::rate::RateProfile;
use crate::train::SpikeTrain;

/// Tolerance on the total probability mass of an amplitude distribution.
pub const AMPLITUDE_TOLERANCE: f64 = 1e-9;

/// How a time-varying rate is imposed on a point process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NonstationaryMethod {
    /// Draw in operational time (unit rate) and map each event back through
    /// the cumulative rate.
    #[default]
    TimeRescaling,
    /// Draw at the peak rate and keep each event with probability
    /// `rate(t) / peak`.
    Thinning,
}

// =========================================================================
// VALIDATION
// =========================================================================

fn check_rate(rate_hz: f64) -> Result<()> {
    if !rate_hz.is_finite() || rate_hz < 0.0 {
        return Err(BinningError::generator("rates must be finite and non-negative"));
    }
    Ok(())
}

fn check_order(shape: u32) -> Result<()> {
    if shape == 0 {
        return Err(BinningError::generator("gamma order must be at least 1"));
    }
    Ok(())
}

/// Validate `amplitudes` and return the mean number of copies per event.
fn check_amplitudes(amplitudes: &[f64]) -> Result<f64> {
    if amplitudes.is_empty() {
        return Err(BinningError::generator("amplitude distribution is empty"));
    }
    if amplitudes.iter().any(|a| !a.is_finite() || *a < 0.0) {
        return Err(BinningError::generator("amplitudes must be non-negative"));
    }
    if (amplitudes.iter().sum::<f64>() - 1.0).abs() > AMPLITUDE_TOLERANCE {
        return Err(BinningError::generator("amplitudes must sum to 1"));
    }
    Ok(amplitudes.iter().enumerate().map(|(j, a)| j as f64 * a).sum())
}

/// Every event landing in every train only works when all rates agree.
fn check_synchrony(amplitudes: &[f64], equal_rates: bool) -> Result<()> {
    let n = amplitudes.len() - 1;
    if n > 1 && amplitudes[n] >= 1.0 - AMPLITUDE_TOLERANCE && !equal_rates {
        return Err(BinningError::generator(
            "fully synchronous trains must share one rate",
        ));
    }
    Ok(())
}

/// Window `[t_start, t_stop)` as magnitudes in `t_stop`'s unit.
fn window(t_start: Quantity, t_stop: Quantity) -> Result<(TimeUnit, f64, f64)> {
    let unit = t_stop.unit();
    let start = t_start.magnitude_in(unit);
    let stop = t_stop.magnitude();
    if !start.is_finite() || !stop.is_finite() || start >= stop {
        return Err(BinningError::generator("t_start must be smaller than t_stop"));
    }
    Ok((unit, start, stop))
}

// =========================================================================
// BUILDING BLOCKS
// =========================================================================

/// Renewal process: successive gaps drawn from `isi` until `stop`.
fn renewal<R, D>(start: f64, stop: f64, isi: &D, rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
    D: Distribution<f64>,
{
    let mut times = Vec::new();
    let mut t = start + isi.sample(rng);
    while t < stop {
        times.push(t);
        t += isi.sample(rng);
    }
    times
}

fn poisson_times<R: Rng + ?Sized>(
    rate_per_unit: f64,
    start: f64,
    stop: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if rate_per_unit == 0.0 {
        return Ok(Vec::new());
    }
    let isi = Exp::new(rate_per_unit)
        .map_err(|_| BinningError::generator("invalid Poisson rate"))?;
    Ok(renewal(start, stop, &isi, rng))
}

fn gamma_times<R: Rng + ?Sized>(
    shape: f64,
    rate_per_unit: f64,
    start: f64,
    stop: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if rate_per_unit == 0.0 {
        return Ok(Vec::new());
    }
    let isi = Gamma::new(shape, 1.0 / (shape * rate_per_unit))
        .map_err(|_| BinningError::generator("invalid gamma parameters"))?;
    Ok(renewal(start, stop, &isi, rng))
}

/// Keep every `k`-th event, starting from a uniformly drawn phase.
fn every_kth<R: Rng + ?Sized>(times: Vec<f64>, k: u32, rng: &mut R) -> Vec<f64> {
    let k = k as usize;
    let phase = rng.gen_range(0..k);
    times.into_iter().skip(phase).step_by(k).collect()
}

/// Poisson process with rate `scale * profile(t)`.
fn modulated_poisson<R: Rng + ?Sized>(
    scale: f64,
    profile: &RateProfile,
    method: NonstationaryMethod,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let (unit, start, stop) = window(profile.t_start(), profile.t_stop())?;
    let peak = profile.max_rate();
    if peak == 0.0 || scale == 0.0 {
        return Ok(Vec::new());
    }

    match method {
        NonstationaryMethod::Thinning => {
            let candidates = poisson_times(scale * peak * unit.seconds(), start, stop, rng)?;
            Ok(candidates
                .into_iter()
                .filter(|&t| {
                    let rate = profile.rate_at(Quantity::new(t, unit)).unwrap_or(0.0);
                    rng.gen::<f64>() * peak < rate
                })
                .collect())
        }
        NonstationaryMethod::TimeRescaling => {
            let dt = profile.sampling_period().magnitude_in(unit);
            let per_unit = unit.seconds();
            // Expected events per sample interval at unit scale.
            let mass: Vec<f64> = profile.rates_hz().iter().map(|r| r * per_unit * dt).collect();
            let total: f64 = mass.iter().sum();

            let operational = poisson_times(scale, 0.0, total, rng)?;
            let mut times = Vec::with_capacity(operational.len());
            let mut k = 0;
            let mut acc = 0.0;
            for u in operational {
                while k < mass.len() && acc + mass[k] <= u {
                    acc += mass[k];
                    k += 1;
                }
                if k == mass.len() {
                    break;
                }
                times.push((start + (k as f64 + (u - acc) / mass[k]) * dt).min(stop));
            }
            Ok(times)
        }
    }
}

/// Mother events per child event, or `None` when no copies are ever made.
fn mother_scale(n: usize, mean_amplitude: f64) -> Option<f64> {
    if n == 0 || mean_amplitude <= 0.0 {
        None
    } else {
        Some(n as f64 / mean_amplitude)
    }
}

/// Copy every mother event into `j ~ amplitudes` distinct children.
fn spread<R: Rng + ?Sized>(
    mother: &[f64],
    amplitudes: &[f64],
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    let n = amplitudes.len() - 1;
    let mut children: Vec<Vec<f64>> = vec![Vec::new(); n];
    if n == 0 || mother.is_empty() {
        return Ok(children);
    }
    let copies: WeightedIndex<f64> = WeightedIndex::new(amplitudes)
        .map_err(|_| BinningError::generator("invalid amplitude distribution"))?;
    for &t in mother {
        let j = copies.sample(rng);
        for target in index::sample(rng, n, j).iter() {
            children[target].push(t);
        }
    }
    debug!(mother = mother.len(), trains = n, "spread compound events");
    Ok(children)
}

fn merge_into(times: &mut Vec<f64>, extra: &[f64]) {
    if extra.is_empty() {
        return;
    }
    times.extend_from_slice(extra);
    times.sort_by(f64::total_cmp);
}

fn into_trains(
    children: Vec<Vec<f64>>,
    unit: TimeUnit,
    t_start: Quantity,
    t_stop: Quantity,
) -> Result<Vec<SpikeTrain>> {
    children
        .into_iter()
        .map(|times| SpikeTrain::new(times, unit, t_start, t_stop))
        .collect()
}

fn aligned(a: &RateProfile, b: &RateProfile) -> bool {
    a.t_start() == b.t_start()
        && a.sampling_period() == b.sampling_period()
        && a.rates_hz().len() == b.rates_hz().len()
}

// =========================================================================
// RENEWAL
// =========================================================================

/// Homogeneous Poisson process with rate `rate_hz` on `[t_start, t_stop)`.
pub fn poisson<R: Rng + ?Sized>(
    rate_hz: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<SpikeTrain> {
    check_rate(rate_hz)?;
    let (unit, start, stop) = window(t_start, t_stop)?;
    let times = poisson_times(rate_hz * unit.seconds(), start, stop, rng)?;
    SpikeTrain::new(times, unit, t_start, t_stop)
}

/// `n` independent Poisson trains.
pub fn poisson_trains<R: Rng + ?Sized>(
    n: usize,
    rate_hz: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    (0..n).map(|_| poisson(rate_hz, t_start, t_stop, rng)).collect()
}

/// Gamma renewal process with the given `shape` and mean rate `rate_hz`.
///
/// Shape 1 is a Poisson process; larger shapes are more regular.
pub fn gamma<R: Rng + ?Sized>(
    shape: f64,
    rate_hz: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<SpikeTrain> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(BinningError::generator("gamma shape must be positive"));
    }
    check_rate(rate_hz)?;
    let (unit, start, stop) = window(t_start, t_stop)?;
    let times = gamma_times(shape, rate_hz * unit.seconds(), start, stop, rng)?;
    SpikeTrain::new(times, unit, t_start, t_stop)
}

/// `n` gamma processes of integer order `shape`, built by keeping every
/// `shape`-th event of a Poisson process at `shape * rate_hz`.
pub fn gamma_thinning<R: Rng + ?Sized>(
    shape: u32,
    rate_hz: f64,
    n: usize,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    check_order(shape)?;
    check_rate(rate_hz)?;
    let (unit, start, stop) = window(t_start, t_stop)?;
    let dense_rate = f64::from(shape) * rate_hz * unit.seconds();

    let mut trains = Vec::with_capacity(n);
    for _ in 0..n {
        let dense = poisson_times(dense_rate, start, stop, rng)?;
        trains.push(SpikeTrain::new(every_kth(dense, shape, rng), unit, t_start, t_stop)?);
    }
    Ok(trains)
}

// =========================================================================
// RATE-MODULATED
// =========================================================================

/// Inhomogeneous Poisson process following `profile`, by thinning.
///
/// Candidates are drawn at the profile's peak rate and kept with
/// probability `rate(t) / peak`.
pub fn inhomogeneous_poisson<R: Rng + ?Sized>(
    profile: &RateProfile,
    rng: &mut R,
) -> Result<SpikeTrain> {
    let times = modulated_poisson(1.0, profile, NonstationaryMethod::Thinning, rng)?;
    debug!(spikes = times.len(), peak = profile.max_rate(), "thinned inhomogeneous Poisson");
    SpikeTrain::new(times, profile.t_start().unit(), profile.t_start(), profile.t_stop())
}

/// `n` gamma processes of integer order `shape` whose rate follows
/// `profile`.
pub fn gamma_nonstationary<R: Rng + ?Sized>(
    shape: u32,
    profile: &RateProfile,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    check_order(shape)?;
    let unit = profile.t_start().unit();
    let mut trains = Vec::with_capacity(n);
    for _ in 0..n {
        let dense = modulated_poisson(
            f64::from(shape),
            profile,
            NonstationaryMethod::Thinning,
            rng,
        )?;
        let times = every_kth(dense, shape, rng);
        trains.push(SpikeTrain::new(times, unit, profile.t_start(), profile.t_stop())?);
    }
    Ok(trains)
}

// =========================================================================
// INJECTED COINCIDENCES
// =========================================================================

/// Single interaction process.
///
/// Generates `n` trains with total rate `rate_b`. The first `m` share a
/// common coincidence train of rate `rate_c` on top of independent
/// background at `rate_b - rate_c`. Returns the trains and the coincidence
/// times.
pub fn sip<R: Rng + ?Sized>(
    m: usize,
    n: usize,
    rate_b: f64,
    rate_c: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<(Vec<SpikeTrain>, SpikeTrain)> {
    if m > n {
        return Err(BinningError::generator(
            "cannot inject coincidences into more trains than generated",
        ));
    }
    let group: Vec<usize> = (0..m).collect();
    let (trains, mut coincidences) = msip(&[group], n, rate_b, &[rate_c], t_start, t_stop, rng)?;
    let coincidences = coincidences
        .pop()
        .ok_or(BinningError::generator("missing coincidence train"))?;
    Ok((trains, coincidences))
}

/// Multiple interaction process: several SIP groups over `n` trains.
///
/// `groups[g]` lists the train indices that receive the coincidence train
/// of rate `rates_c[g]`. Groups may overlap. Each train's background rate
/// is `rate_b` minus the coincidence rates of its groups, so every train
/// fires at `rate_b` in total. Returns the trains and one coincidence train
/// per group.
pub fn msip<R: Rng + ?Sized>(
    groups: &[Vec<usize>],
    n: usize,
    rate_b: f64,
    rates_c: &[f64],
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<(Vec<SpikeTrain>, Vec<SpikeTrain>)> {
    if groups.len() != rates_c.len() {
        return Err(BinningError::LengthMismatch {
            expected: groups.len(),
            actual: rates_c.len(),
        });
    }
    check_rate(rate_b)?;
    for &rate_c in rates_c {
        check_rate(rate_c)?;
    }

    let mut memberships: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (g, group) in groups.iter().enumerate() {
        for &member in group {
            let owned = memberships
                .get_mut(member)
                .ok_or(BinningError::generator("group member out of range"))?;
            if !owned.contains(&g) {
                owned.push(g);
            }
        }
    }
    let mut background = Vec::with_capacity(n);
    for owned in &memberships {
        let rate = rate_b - owned.iter().map(|&g| rates_c[g]).sum::<f64>();
        if rate < -AMPLITUDE_TOLERANCE * rate_b.max(1.0) {
            return Err(BinningError::generator("coincidence rates exceed total rate"));
        }
        background.push(rate.max(0.0));
    }

    let (unit, start, stop) = window(t_start, t_stop)?;
    let per_unit = unit.seconds();
    let mut coincidences = Vec::with_capacity(groups.len());
    for &rate_c in rates_c {
        coincidences.push(poisson_times(rate_c * per_unit, start, stop, rng)?);
    }

    let mut trains = Vec::with_capacity(n);
    for (owned, &rate) in memberships.iter().zip(&background) {
        let mut times = poisson_times(rate * per_unit, start, stop, rng)?;
        for &g in owned {
            merge_into(&mut times, &coincidences[g]);
        }
        trains.push(SpikeTrain::new(times, unit, t_start, t_stop)?);
    }
    debug!(groups = groups.len(), n, "generated MIP");

    let coincidences = into_trains(coincidences, unit, t_start, t_stop)?;
    Ok((trains, coincidences))
}

// =========================================================================
// COMPOUND
// =========================================================================

/// Homogeneous compound Poisson process.
///
/// Produces `amplitudes.len() - 1` trains. Targets are chosen uniformly
/// without replacement. The mother rate is
/// `n * rate_hz / sum_j(j * amplitudes[j])`, so every output train fires at
/// `rate_hz`.
pub fn cpp<R: Rng + ?Sized>(
    amplitudes: &[f64],
    rate_hz: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    check_amplitudes(amplitudes)?;
    check_rate(rate_hz)?;
    let rates = vec![rate_hz; amplitudes.len() - 1];
    cpp_heterogeneous(amplitudes, &rates, t_start, t_stop, rng)
}

/// Compound Poisson process with one rate per output train.
///
/// A homogeneous compound process at the smallest rate carries the
/// correlations. Each train then receives independent Poisson spikes at
/// its excess over that minimum.
pub fn cpp_heterogeneous<R: Rng + ?Sized>(
    amplitudes: &[f64],
    rates_hz: &[f64],
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    let mean_amplitude = check_amplitudes(amplitudes)?;
    let n = amplitudes.len() - 1;
    if rates_hz.len() != n {
        return Err(BinningError::LengthMismatch {
            expected: n,
            actual: rates_hz.len(),
        });
    }
    for &rate in rates_hz {
        check_rate(rate)?;
    }
    let (unit, start, stop) = window(t_start, t_stop)?;
    let per_unit = unit.seconds();

    let floor = rates_hz.iter().copied().fold(f64::INFINITY, f64::min);
    check_synchrony(amplitudes, rates_hz.iter().all(|&r| r == floor))?;

    let mut children = match mother_scale(n, mean_amplitude) {
        Some(scale) if floor > 0.0 => {
            let mother = poisson_times(scale * floor * per_unit, start, stop, rng)?;
            spread(&mother, amplitudes, rng)?
        }
        _ => vec![Vec::new(); n],
    };
    for (child, &rate) in children.iter_mut().zip(rates_hz) {
        let excess = poisson_times((rate - floor) * per_unit, start, stop, rng)?;
        merge_into(child, &excess);
    }
    into_trains(children, unit, t_start, t_stop)
}

/// Compound Poisson process with time-varying rates.
///
/// `profiles` holds either one profile shared by every train or one per
/// train; all must share start, sampling period and length. The pointwise
/// minimum drives the correlated part and each train receives its excess
/// as an independent inhomogeneous Poisson process.
pub fn cpp_nonstationary<R: Rng + ?Sized>(
    amplitudes: &[f64],
    profiles: &[RateProfile],
    method: NonstationaryMethod,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    let mean_amplitude = check_amplitudes(amplitudes)?;
    let n = amplitudes.len() - 1;
    let first = profiles
        .first()
        .ok_or(BinningError::generator("no rate profile given"))?;
    let shared = profiles.len() == 1;
    if !shared && profiles.len() != n {
        return Err(BinningError::LengthMismatch {
            expected: n,
            actual: profiles.len(),
        });
    }
    if profiles.iter().any(|p| !aligned(first, p)) {
        return Err(BinningError::generator(
            "rate profiles must share start, sampling period and length",
        ));
    }

    let floor_rates: Vec<f64> = (0..first.rates_hz().len())
        .map(|k| {
            profiles
                .iter()
                .map(|p| p.rates_hz()[k])
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    check_synchrony(
        amplitudes,
        profiles.iter().all(|p| p.rates_hz() == floor_rates.as_slice()),
    )?;
    let floor = RateProfile::new(floor_rates, first.sampling_period(), first.t_start())?;

    let mut children = match mother_scale(n, mean_amplitude) {
        Some(scale) => {
            let mother = modulated_poisson(scale, &floor, method, rng)?;
            spread(&mother, amplitudes, rng)?
        }
        None => vec![Vec::new(); n],
    };
    if !shared {
        for (child, profile) in children.iter_mut().zip(profiles) {
            let excess: Vec<f64> = profile
                .rates_hz()
                .iter()
                .zip(floor.rates_hz())
                .map(|(r, f)| r - f)
                .collect();
            let excess = RateProfile::new(excess, first.sampling_period(), first.t_start())?;
            merge_into(child, &modulated_poisson(1.0, &excess, method, rng)?);
        }
    }
    into_trains(children, first.t_start().unit(), first.t_start(), first.t_stop())
}

/// Compound gamma process: the mother is a gamma process of integer order
/// `shape`, copied into the output trains as in [`cpp`].
pub fn cgp<R: Rng + ?Sized>(
    amplitudes: &[f64],
    shape: u32,
    rate_hz: f64,
    t_start: Quantity,
    t_stop: Quantity,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    let mean_amplitude = check_amplitudes(amplitudes)?;
    check_order(shape)?;
    check_rate(rate_hz)?;
    let (unit, start, stop) = window(t_start, t_stop)?;
    let n = amplitudes.len() - 1;

    let children = match mother_scale(n, mean_amplitude) {
        Some(scale) => {
            let mother_rate = scale * rate_hz * unit.seconds();
            let mother = gamma_times(f64::from(shape), mother_rate, start, stop, rng)?;
            spread(&mother, amplitudes, rng)?
        }
        None => vec![Vec::new(); n],
    };
    into_trains(children, unit, t_start, t_stop)
}

/// Compound gamma process whose per-train rate follows `profile`.
///
/// The mother keeps every `shape`-th event of a Poisson process modulated
/// at `shape` times the mother rate.
pub fn cgp_nonstationary<R: Rng + ?Sized>(
    amplitudes: &[f64],
    shape: u32,
    profile: &RateProfile,
    rng: &mut R,
) -> Result<Vec<SpikeTrain>> {
    let mean_amplitude = check_amplitudes(amplitudes)?;
    check_order(shape)?;
    let n = amplitudes.len() - 1;

    let children = match mother_scale(n, mean_amplitude) {
        Some(scale) => {
            let dense = modulated_poisson(
                scale * f64::from(shape),
                profile,
                NonstationaryMethod::Thinning,
                rng,
            )?;
            let mother = every_kth(dense, shape, rng);
            spread(&mother, amplitudes, rng)?
        }
        None => vec![Vec::new(); n],
    };
    into_trains(children, profile.t_start().unit(), profile.t_start(), profile.t_stop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::EventSequence;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn secs(start: f64, stop: f64) -> (Quantity, Quantity) {
        (Quantity::seconds(start), Quantity::seconds(stop))
    }

    fn flat(rate: f64, samples: usize) -> RateProfile {
        RateProfile::new(vec![rate; samples], Quantity::millis(1.0), Quantity::seconds(5.0))
            .unwrap()
    }

    fn mean_rate(trains: &[SpikeTrain], seconds: f64) -> f64 {
        trains.iter().map(|t| t.len()).sum::<usize>() as f64 / (trains.len() as f64 * seconds)
    }

    #[test]
    fn test_poisson_window_and_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        let train =
            poisson(10.0, Quantity::seconds(0.0), Quantity::millis(1000.0), &mut rng).unwrap();
        assert_eq!(train.unit(), TimeUnit::Millisecond);
        assert!(train.times().iter().all(|&t| (0.0..1000.0).contains(&t)));
    }

    #[test]
    fn test_poisson_mean_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let (t0, t1) = secs(0.0, 1.0);
        let trains = poisson_trains(200, 20.0, t0, t1, &mut rng).unwrap();
        let mean = mean_rate(&trains, 1.0);
        assert!((mean - 20.0).abs() < 2.0, "mean count {mean}");
    }

    #[test]
    fn test_zero_rate_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let (t0, t1) = secs(0.0, 5.0);
        let train = poisson(0.0, t0, t1, &mut rng).unwrap();
        assert!(train.is_empty());
    }

    #[test]
    fn test_generator_argument_errors() {
        let mut rng = StdRng::seed_from_u64(1);
        let (t0, t1) = secs(0.0, 1.0);
        assert!(poisson(-1.0, t0, t1, &mut rng).is_err());
        assert!(poisson(1.0, Quantity::seconds(2.0), t1, &mut rng).is_err());
        assert!(poisson(1.0, t1, t1, &mut rng).is_err());
        assert!(gamma(0.0, 1.0, t0, t1, &mut rng).is_err());
    }

    #[test]
    fn test_gamma_mean_rate() {
        let mut rng = StdRng::seed_from_u64(3);
        let (t0, t1) = secs(0.0, 20.0);
        let train = gamma(4.0, 50.0, t0, t1, &mut rng).unwrap();
        let rate = train.len() as f64 / 20.0;
        assert!((rate - 50.0).abs() < 5.0, "rate {rate}");
    }

    #[test]
    fn test_gamma_thinning_outputs() {
        let mut rng = StdRng::seed_from_u64(13);
        let t_start = Quantity::seconds(0.0);
        let t_stop = Quantity::millis(10000.0);

        let trains = gamma_thinning(3, 10.0, 3, t_start, t_stop, &mut rng).unwrap();
        assert_eq!(trains.len(), 3);
        for train in &trains {
            assert_eq!(train.t_start(), t_start);
            assert_eq!(train.t_stop(), t_stop);
            assert_eq!(train.unit(), TimeUnit::Millisecond);
        }
        let rate = mean_rate(&trains, 10.0);
        assert!((rate - 10.0).abs() < 2.0, "rate {rate}");

        let silent = gamma_thinning(3, 0.0, 1, t_start, t_stop, &mut rng).unwrap();
        assert!(silent[0].is_empty());
    }

    #[test]
    fn test_gamma_thinning_errors() {
        let mut rng = StdRng::seed_from_u64(13);
        let (t0, t1) = secs(0.0, 5.0);
        assert!(gamma_thinning(3, 3.0, 1, Quantity::seconds(10.0), t1, &mut rng).is_err());
        assert!(gamma_thinning(3, 3.0, 1, t1, t1, &mut rng).is_err());
        assert!(gamma_thinning(3, -3.0, 1, t0, t1, &mut rng).is_err());
        assert!(gamma_thinning(0, 3.0, 2, t0, t1, &mut rng).is_err());
    }

    #[test]
    fn test_inhomogeneous_follows_profile() {
        let mut rng = StdRng::seed_from_u64(11);
        let profile =
            RateProfile::new(vec![0.0, 200.0], Quantity::seconds(1.0), Quantity::seconds(0.0))
                .unwrap();
        let train = inhomogeneous_poisson(&profile, &mut rng).unwrap();
        assert!(train.times().iter().all(|&t| t >= 1.0));
        assert!(train.len() > 100);
    }

    #[test]
    fn test_gamma_nonstationary_outputs() {
        let mut rng = StdRng::seed_from_u64(17);
        let profile = flat(3.0, 10_000);
        let trains = gamma_nonstationary(3, &profile, 3, &mut rng).unwrap();
        assert_eq!(trains.len(), 3);
        for train in &trains {
            assert_eq!(train.t_start(), profile.t_start());
            assert_eq!(train.t_stop(), profile.t_stop());
            assert_eq!(train.unit(), TimeUnit::Second);
        }

        let silent = gamma_nonstationary(3, &flat(0.0, 10_000), 1, &mut rng).unwrap();
        assert!(silent[0].is_empty());
        assert!(gamma_nonstationary(0, &profile, 1, &mut rng).is_err());
    }

    #[test]
    fn test_sip_shares_coincidences() {
        let mut rng = StdRng::seed_from_u64(5);
        let (t0, t1) = secs(0.0, 10.0);
        let (trains, coinc) = sip(2, 4, 10.0, 2.0, t0, t1, &mut rng).unwrap();
        assert_eq!(trains.len(), 4);
        for &c in coinc.times() {
            assert!(trains[0].times().contains(&c));
            assert!(trains[1].times().contains(&c));
        }
        assert!(sip(5, 4, 10.0, 2.0, t0, t1, &mut rng).is_err());
        assert!(sip(1, 4, 1.0, 2.0, t0, t1, &mut rng).is_err());
    }

    #[test]
    fn test_msip_groups() {
        let mut rng = StdRng::seed_from_u64(23);
        let (t0, t1) = secs(0.0, 1.0);
        let groups = vec![vec![1, 2, 3], vec![4, 5]];
        let (trains, coinc) = msip(&groups, 6, 5.0, &[2.0, 3.0], t0, t1, &mut rng).unwrap();
        assert_eq!(trains.len(), 6);
        assert_eq!(coinc.len(), 2);
        for (group, times) in groups.iter().zip(&coinc) {
            for &member in group {
                for &c in times.times() {
                    assert!(trains[member].times().contains(&c));
                }
            }
        }
        for train in &trains {
            assert_eq!(train.unit(), TimeUnit::Second);
        }
    }

    #[test]
    fn test_msip_errors() {
        let mut rng = StdRng::seed_from_u64(23);
        let (t0, t1) = secs(0.0, 1.0);
        let groups = vec![vec![0, 1], vec![1, 2]];
        assert!(matches!(
            msip(&groups, 3, 5.0, &[1.0], t0, t1, &mut rng),
            Err(BinningError::LengthMismatch { .. })
        ));
        assert!(msip(&groups, 2, 5.0, &[1.0, 1.0], t0, t1, &mut rng).is_err());
        // Train 1 sits in both groups: 3 + 3 exceeds 5.
        assert!(msip(&groups, 3, 5.0, &[3.0, 3.0], t0, t1, &mut rng).is_err());
    }

    #[test]
    fn test_cpp_outputs() {
        let mut rng = StdRng::seed_from_u64(9);
        let t_start = Quantity::seconds(5.0);
        let t_stop = Quantity::millis(10000.0);

        let trains = cpp(&[0.0, 0.9, 0.1], 3.0, t_start, t_stop, &mut rng).unwrap();
        assert_eq!(trains.len(), 2);
        for train in &trains {
            assert_eq!(train.unit(), TimeUnit::Millisecond);
            assert_eq!(train.t_start(), t_start);
            assert_eq!(train.t_stop(), t_stop);
        }

        let synced = cpp(&[0.0, 0.0, 1.0], 3.0, t_start, t_stop, &mut rng).unwrap();
        assert_eq!(synced[0], synced[1]);

        let silent = cpp(&[0.0, 0.9, 0.1], 0.0, t_start, t_stop, &mut rng).unwrap();
        assert!(silent.iter().all(SpikeTrain::is_empty));

        let no_copies = cpp(&[1.0, 0.0, 0.0], 3.0, t_start, t_stop, &mut rng).unwrap();
        assert!(no_copies.iter().all(SpikeTrain::is_empty));

        assert!(cpp(&[1.0], 3.0, t_start, t_stop, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_cpp_child_rate() {
        let mut rng = StdRng::seed_from_u64(21);
        let (t0, t1) = secs(0.0, 50.0);
        let trains = cpp(&[0.0, 0.5, 0.5], 20.0, t0, t1, &mut rng).unwrap();
        for train in &trains {
            let rate = train.len() as f64 / 50.0;
            assert!((rate - 20.0).abs() < 3.0, "rate {rate}");
        }
    }

    #[test]
    fn test_cpp_errors() {
        let mut rng = StdRng::seed_from_u64(9);
        let (t0, t1) = secs(0.0, 10.0);
        assert!(cpp(&[], 3.0, t0, t1, &mut rng).is_err());
        assert!(cpp(&[1.0, 1.0, 1.0], 3.0, t0, t1, &mut rng).is_err());
        assert!(cpp(&[-1.0, 1.0, 1.0], 3.0, t0, t1, &mut rng).is_err());
        assert!(cpp(&[0.0, 1.0, 0.0], -3.0, t0, t1, &mut rng).is_err());
        assert!(cpp(&[0.0, 1.0, 0.0], 3.0, Quantity::seconds(15.0), t1, &mut rng).is_err());
        assert!(cpp(&[0.0, 1.0, 0.0], 3.0, t1, t1, &mut rng).is_err());
    }

    #[test]
    fn test_cpp_heterogeneous_outputs() {
        let mut rng = StdRng::seed_from_u64(31);
        let (t_start, t_stop) = secs(5.0, 10.0);

        let trains =
            cpp_heterogeneous(&[0.0, 0.9, 0.1], &[3.0, 4.0], t_start, t_stop, &mut rng).unwrap();
        assert_eq!(trains.len(), 2);
        for train in &trains {
            assert_eq!(train.t_start(), t_start);
            assert_eq!(train.t_stop(), t_stop);
        }

        let no_copies =
            cpp_heterogeneous(&[1.0, 0.0, 0.0], &[3.0, 4.0], t_start, t_stop, &mut rng).unwrap();
        assert!(no_copies[0].is_empty());

        let silent =
            cpp_heterogeneous(&[0.0, 0.9, 0.1], &[0.0, 0.0], t_start, t_stop, &mut rng).unwrap();
        assert!(silent.iter().all(SpikeTrain::is_empty));

        let synced =
            cpp_heterogeneous(&[0.0, 0.0, 1.0], &[3.0, 3.0], t_start, t_stop, &mut rng).unwrap();
        assert_eq!(synced[0], synced[1]);
    }

    #[test]
    fn test_cpp_heterogeneous_rates() {
        let mut rng = StdRng::seed_from_u64(37);
        let (t0, t1) = secs(0.0, 100.0);
        let trains = cpp_heterogeneous(&[0.0, 0.5, 0.5], &[10.0, 20.0], t0, t1, &mut rng).unwrap();
        let r0 = trains[0].len() as f64 / 100.0;
        let r1 = trains[1].len() as f64 / 100.0;
        assert!((r0 - 10.0).abs() < 1.5, "rate {r0}");
        assert!((r1 - 20.0).abs() < 2.0, "rate {r1}");
    }

    #[test]
    fn test_cpp_heterogeneous_errors() {
        let mut rng = StdRng::seed_from_u64(31);
        let (t0, t1) = secs(0.0, 10.0);
        let rates = [3.0, 4.0];
        assert!(cpp_heterogeneous(&[], &rates, t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[1.0, 1.0, 1.0], &rates, t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[0.0, 1.0, 0.0], &[-3.0, 4.0], t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[0.0, 1.0, 0.0], &[], t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[0.0, 1.0], &rates, t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[0.0, 0.0, 1.0], &rates, t0, t1, &mut rng).is_err());
        assert!(cpp_heterogeneous(&[0.0, 1.0, 0.0], &rates, t1, t1, &mut rng).is_err());
    }

    #[test]
    fn test_cpp_nonstationary_outputs() {
        for method in [NonstationaryMethod::TimeRescaling, NonstationaryMethod::Thinning] {
            let mut rng = StdRng::seed_from_u64(41);
            let profile = flat(3.0, 10_000);

            let trains = cpp_nonstationary(&[0.0, 0.9, 0.1], &[profile.clone()], method, &mut rng)
                .unwrap();
            assert_eq!(trains.len(), 2);
            for train in &trains {
                assert_eq!(train.t_start(), profile.t_start());
                assert_eq!(train.t_stop(), profile.t_stop());
            }

            let empty = cpp_nonstationary(&[1.0], &[profile.clone()], method, &mut rng).unwrap();
            assert!(empty.is_empty());

            let silent = [flat(0.0, 10_000)];
            let trains = cpp_nonstationary(&[0.0, 0.9, 0.1], &silent, method, &mut rng).unwrap();
            assert!(trains.iter().all(SpikeTrain::is_empty));

            let synced =
                cpp_nonstationary(&[0.0, 0.0, 1.0], &[profile.clone()], method, &mut rng).unwrap();
            assert_eq!(synced[0], synced[1]);

            let per_train = [flat(3.0, 10_000), flat(4.0, 10_000)];
            let trains =
                cpp_nonstationary(&[1.0, 0.0, 0.0], &per_train, method, &mut rng).unwrap();
            assert_eq!(trains.len(), 2);
            assert!(trains[0].is_empty());
        }
    }

    #[test]
    fn test_time_rescaling_follows_profile() {
        let mut rng = StdRng::seed_from_u64(43);
        let profile =
            RateProfile::new(vec![0.0, 300.0], Quantity::seconds(1.0), Quantity::seconds(0.0))
                .unwrap();
        let trains = cpp_nonstationary(
            &[0.0, 1.0],
            &[profile],
            NonstationaryMethod::TimeRescaling,
            &mut rng,
        )
        .unwrap();
        let times = trains[0].times();
        assert!(times.iter().all(|&t| (1.0..=2.0).contains(&t)));
        assert!((times.len() as f64 - 300.0).abs() < 60.0, "count {}", times.len());
    }

    #[test]
    fn test_cpp_nonstationary_errors() {
        let mut rng = StdRng::seed_from_u64(41);
        let method = NonstationaryMethod::default();
        let profile = flat(3.0, 100);
        let pair = [flat(3.0, 100), flat(4.0, 100)];
        assert!(cpp_nonstationary(&[], &[profile.clone()], method, &mut rng).is_err());
        assert!(cpp_nonstationary(&[1.0, 1.0, 1.0], &[profile.clone()], method, &mut rng).is_err());
        assert!(cpp_nonstationary(&[0.0, 1.0, 0.0], &[], method, &mut rng).is_err());
        assert!(cpp_nonstationary(&[0.0, 1.0], &pair, method, &mut rng).is_err());
        assert!(cpp_nonstationary(&[0.0, 0.0, 1.0], &pair, method, &mut rng).is_err());

        let misaligned = [flat(3.0, 100), flat(4.0, 50)];
        assert!(cpp_nonstationary(&[0.0, 1.0, 0.0], &misaligned, method, &mut rng).is_err());
    }

    #[test]
    fn test_cgp_outputs() {
        let mut rng = StdRng::seed_from_u64(47);
        let t_start = Quantity::seconds(5.0);
        let t_stop = Quantity::millis(10000.0);

        let trains = cgp(&[0.0, 0.9, 0.1], 3, 3.0, t_start, t_stop, &mut rng).unwrap();
        assert_eq!(trains.len(), 2);
        for train in &trains {
            assert_eq!(train.unit(), TimeUnit::Millisecond);
            assert_eq!(train.t_start(), t_start);
            assert_eq!(train.t_stop(), t_stop);
        }

        let silent = cgp(&[0.0, 0.9, 0.1], 3, 0.0, t_start, t_stop, &mut rng).unwrap();
        assert!(silent.iter().all(SpikeTrain::is_empty));
    }

    #[test]
    fn test_cgp_errors() {
        let mut rng = StdRng::seed_from_u64(47);
        let (t0, t1) = secs(0.0, 10.0);
        assert!(cgp(&[], 3, 3.0, t0, t1, &mut rng).is_err());
        assert!(cgp(&[1.0, 1.0, 1.0], 3, 3.0, t0, t1, &mut rng).is_err());
        assert!(cgp(&[-1.0, 1.0, 1.0], 3, 3.0, t0, t1, &mut rng).is_err());
        assert!(cgp(&[0.0, 1.0, 0.0], 3, 3.0, Quantity::seconds(15.0), t1, &mut rng).is_err());
        assert!(cgp(&[0.0, 0.9, 0.1], 3, 3.0, t1, t1, &mut rng).is_err());
        assert!(cgp(&[0.0, 1.0, 0.0], 3, -3.0, t0, t1, &mut rng).is_err());
        assert!(cgp(&[0.0, 1.0, 0.0], 0, 3.0, t0, t1, &mut rng).is_err());
    }

    #[test]
    fn test_cgp_nonstationary() {
        let mut rng = StdRng::seed_from_u64(53);
        let profile = flat(3.0, 10_000);
        let trains = cgp_nonstationary(&[0.0, 0.9, 0.1], 3, &profile, &mut rng).unwrap();
        assert_eq!(trains.len(), 2);
        for train in &trains {
            assert_eq!(train.t_start(), profile.t_start());
            assert_eq!(train.t_stop(), profile.t_stop());
        }

        let silent = cgp_nonstationary(&[0.0, 0.9, 0.1], 3, &flat(0.0, 10_000), &mut rng).unwrap();
        assert!(silent.iter().all(SpikeTrain::is_empty));

        assert!(cgp_nonstationary(&[], 3, &profile, &mut rng).is_err());
        assert!(cgp_nonstationary(&[1.0, 1.0, 1.0], 3, &profile, &mut rng).is_err());
        assert!(cgp_nonstationary(&[0.0, 1.0, 0.0], 0, &profile, &mut rng).is_err());
    }
}
