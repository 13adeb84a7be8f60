//! Contiguous belief storage for the ranker.
//!
//! Every item's belief is held as a normalized probability vector over
//! `NUM_BINS` quality bins. All items share one flat buffer of
//! `n_items * NUM_BINS` scalars indexed arithmetically, so a venue with
//! thousands of items costs a single allocation.

use rayon::prelude::*;

use super::belief::{Belief, NUM_BINS};

/// Floor applied to posterior widths so beliefs never collapse to a point.
pub const MIN_STDEV: f64 = 1e-6;

/// Floor for probabilities entering a logarithm.
const LOG_FLOOR: f64 = 1e-300;

/// Flat `n_items x NUM_BINS` density buffer.
pub struct BeliefArena {
    mass: Vec<f64>,
    n: usize,
}

impl BeliefArena {
    /// Seeds one normalized Gaussian row per belief.
    pub fn from_beliefs(beliefs: &[Belief]) -> Self {
        let n = beliefs.len();
        let mut mass = vec![0.0; n * NUM_BINS];
        mass.par_chunks_mut(NUM_BINS)
            .zip(beliefs.par_iter())
            .for_each(|(row, belief)| seed_gaussian(row, belief));
        Self { mass, n }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.mass[index * NUM_BINS..(index + 1) * NUM_BINS]
    }

    pub fn set_row(&mut self, index: usize, row: &[f64]) {
        self.mass[index * NUM_BINS..(index + 1) * NUM_BINS].copy_from_slice(row);
    }

    /// Posterior moments of one item's belief.
    pub fn moments(&self, index: usize) -> Belief {
        moments_of(self.row(index))
    }

    /// Prefix-sum CDF of one item's belief.
    pub fn cdf(&self, index: usize) -> Vec<f64> {
        cdf_of(self.row(index))
    }
}

fn seed_gaussian(row: &mut [f64], belief: &Belief) {
    let sigma = belief.stdev.max(MIN_STDEV);
    let mut total = 0.0;
    for (bin, weight) in row.iter_mut().enumerate() {
        let z = (bin as f64 - belief.mean) / sigma;
        *weight = (-0.5 * z * z).exp();
        total += *weight;
    }
    if total <= 0.0 {
        // Mean far outside the scale or width below resolution: collapse to
        // the nearest representable bin.
        let bin = belief.mean.round().clamp(0.0, (NUM_BINS - 1) as f64) as usize;
        row.fill(0.0);
        row[bin] = 1.0;
    } else {
        for weight in row.iter_mut() {
            *weight /= total;
        }
    }
}

/// Mean and standard deviation of a bin-mass vector.
pub fn moments_of(row: &[f64]) -> Belief {
    let mut mean = 0.0;
    for (bin, weight) in row.iter().enumerate() {
        mean += bin as f64 * weight;
    }
    let mut variance = 0.0;
    for (bin, weight) in row.iter().enumerate() {
        let d = bin as f64 - mean;
        variance += d * d * weight;
    }
    Belief::new(mean, variance.sqrt().max(MIN_STDEV))
}

/// Running prefix sums of a bin-mass vector, clamped into `[0, 1]`.
pub fn cdf_of(row: &[f64]) -> Vec<f64> {
    let mut cdf = Vec::with_capacity(row.len());
    let mut total = 0.0;
    for weight in row {
        total += weight;
        cdf.push(total.min(1.0));
    }
    cdf
}

/// Exact `P(q_a < q_b)` for two independent bin distributions; mass landing
/// on a shared bin counts half.
pub fn prob_less(row_a: &[f64], cdf_a: &[f64], row_b: &[f64]) -> f64 {
    let mut p = 0.0;
    for bin in 0..row_b.len() {
        let below = if bin == 0 { 0.0 } else { cdf_a[bin - 1] };
        p += row_b[bin] * (below + 0.5 * row_a[bin]);
    }
    p.clamp(0.0, 1.0)
}

/// `ln` with a floor, so zero-mass bins stay finite.
pub fn safe_ln(x: f64) -> f64 {
    x.max(LOG_FLOOR).ln()
}
