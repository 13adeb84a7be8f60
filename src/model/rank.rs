//! Listwise Bayesian ranker over discretised Gaussian beliefs.
//!
//! `Rank` holds one belief vector per item and supports four operations:
//! an annealed listwise update from an observed ordering, informativeness
//! sampling for the next review task, and two consistency scores for a
//! reviewer's ordering against the current beliefs.
//!
//! # Update rule
//!
//! For an ordering `o[0] < ... < o[m-1]` (lowest observed quality first) the
//! likelihood that item `o[k]` sits at quality bin `b` is
//!
//! ```text
//! L_k(b) = prod_{j<k} F_j(b) * prod_{j>k} (1 - F_j(b))
//! ```
//!
//! with `F_j` the CDF of item `o[j]`'s belief before the update. The
//! posterior is the annealed product `p'_k(b) ∝ p_k(b) * L_k(b)^alpha`;
//! smaller `alpha` means a smaller step. All posteriors condition on the
//! same pre-update snapshot, so the result does not depend on the order the
//! listed items are refreshed in.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use ordered_float::OrderedFloat;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::belief::{Belief, NUM_BINS};
use super::cost::CostModel;
use super::histogram::{prob_less, safe_ln, BeliefArena};
use crate::data::models::ItemId;
use crate::error::{RankError, Result};

/// Posterior summary for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemEstimate {
    /// `100 * (N - i) / N` for the item ranked `i`-th by posterior mean,
    /// best first.
    pub percentile: f64,
    pub mean: f64,
    pub stdev: f64,
}

pub struct Rank {
    items: Vec<ItemId>,
    index: HashMap<ItemId, usize>,
    arena: BeliefArena,
    cost: CostModel,
    alpha: f64,
    rng: StdRng,
}

impl Rank {
    /// Builds a ranker from parallel item/belief slices.
    pub fn from_beliefs(
        items: Vec<ItemId>,
        beliefs: &[Belief],
        cost: CostModel,
        alpha: f64,
    ) -> Result<Self> {
        if items.len() != beliefs.len() {
            return Err(RankError::InvalidParameter(format!(
                "{} items but {} beliefs",
                items.len(),
                beliefs.len()
            )));
        }
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(RankError::InvalidParameter(format!(
                "annealing {alpha} outside (0, 1]"
            )));
        }
        let index: HashMap<ItemId, usize> =
            items.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        if index.len() != items.len() {
            return Err(RankError::InvalidParameter(
                "duplicate item id in ranker pool".into(),
            ));
        }
        Ok(Self {
            items,
            index,
            arena: BeliefArena::from_beliefs(beliefs),
            cost,
            alpha,
            rng: StdRng::from_entropy(),
        })
    }

    /// Replaces the internal random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Applies one observed ordering (lowest quality first) and returns the
    /// refreshed estimates for every item the ranker was built with.
    ///
    /// `alpha` overrides the construction-time annealing for this update
    /// only. `new_item` marks the element the reviewer had not seen before;
    /// it takes a compounded step `1 - (1 - alpha)^2`. Ordering entries the
    /// ranker does not know are dropped; if fewer than two remain the model
    /// is left untouched.
    pub fn update(
        &mut self,
        ordering: &[ItemId],
        new_item: Option<ItemId>,
        alpha: Option<f64>,
    ) -> HashMap<ItemId, ItemEstimate> {
        let step = alpha.unwrap_or(self.alpha).clamp(0.0, 1.0);
        let listed: Vec<usize> = ordering
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .unique()
            .collect();
        if listed.len() >= 2 && step > 0.0 {
            let new_index = new_item.and_then(|id| self.index.get(&id).copied());
            self.apply_listwise(&listed, new_index, step);
        }
        self.estimates()
    }

    fn apply_listwise(&mut self, listed: &[usize], new_index: Option<usize>, alpha: f64) {
        let m = listed.len();
        // Snapshot the CDFs so every posterior conditions on the same prior
        // state.
        let cdfs: Vec<Vec<f64>> = listed.iter().map(|&i| self.arena.cdf(i)).collect();

        // below[k][b] = sum_{j<k} ln F_j(b), above[k][b] = sum_{j>k} ln (1 - F_j(b)).
        let mut below = vec![vec![0.0f64; NUM_BINS]; m];
        for k in 1..m {
            for b in 0..NUM_BINS {
                below[k][b] = below[k - 1][b] + safe_ln(cdfs[k - 1][b]);
            }
        }
        let mut above = vec![vec![0.0f64; NUM_BINS]; m];
        for k in (0..m.saturating_sub(1)).rev() {
            for b in 0..NUM_BINS {
                above[k][b] = above[k + 1][b] + safe_ln(1.0 - cdfs[k + 1][b]);
            }
        }

        let arena = &self.arena;
        let posteriors: Vec<(usize, Vec<f64>)> = (0..m)
            .into_par_iter()
            .map(|k| {
                let i = listed[k];
                let step = if new_index == Some(i) {
                    // One extra damped application of the same evidence.
                    1.0 - (1.0 - alpha).powi(2)
                } else {
                    alpha
                };
                let prior = arena.row(i);
                let mut log_post = vec![0.0f64; NUM_BINS];
                for b in 0..NUM_BINS {
                    log_post[b] = safe_ln(prior[b]) + step * (below[k][b] + above[k][b]);
                }
                let peak = log_post.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mut total = 0.0;
                for v in log_post.iter_mut() {
                    *v = (*v - peak).exp();
                    total += *v;
                }
                for v in log_post.iter_mut() {
                    *v /= total;
                }
                (i, log_post)
            })
            .collect();

        for (i, row) in posteriors {
            self.arena.set_row(i, &row);
        }
    }

    /// Current `(percentile, mean, stdev)` for every item.
    pub fn estimates(&self) -> HashMap<ItemId, ItemEstimate> {
        let n = self.items.len();
        let moments: Vec<Belief> = (0..n).map(|i| self.arena.moments(i)).collect();
        let mut order: Vec<usize> = (0..n).collect();
        // Best first; ties broken by item id for determinism.
        order.sort_by_key(|&i| (OrderedFloat(-moments[i].mean), self.items[i]));
        let mut out = HashMap::with_capacity(n);
        for (position, &i) in order.iter().enumerate() {
            out.insert(
                self.items[i],
                ItemEstimate {
                    percentile: 100.0 * (n - position) as f64 / n as f64,
                    mean: moments[i].mean,
                    stdev: moments[i].stdev,
                },
            );
        }
        out
    }

    /// Draws the next item to offer, preferring candidates whose comparison
    /// against `old_items` is most informative: the weight of a candidate is
    /// its accumulated mistake probability against the already-seen items,
    /// discounted by the cost model. Never returns an id in `old_items` or
    /// `black_items`; with no informative signal the draw is uniform.
    pub fn sample_item(&mut self, old_items: &[ItemId], black_items: &[ItemId]) -> Option<ItemId> {
        let excluded: HashSet<ItemId> =
            old_items.iter().chain(black_items.iter()).copied().collect();
        let candidates: Vec<usize> = (0..self.items.len())
            .filter(|&i| !excluded.contains(&self.items[i]))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let old: Vec<usize> = old_items
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();
        if old.is_empty() {
            return candidates.choose(&mut self.rng).map(|&i| self.items[i]);
        }

        let rank_fraction = self.rank_fractions();
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&c| {
                let cdf_c = self.arena.cdf(c);
                let mistakes: f64 = old
                    .iter()
                    .map(|&o| {
                        let p = prob_less(self.arena.row(c), &cdf_c, self.arena.row(o));
                        p.min(1.0 - p)
                    })
                    .sum();
                mistakes / self.cost.penalty(rank_fraction[c])
            })
            .collect();

        if weights.iter().sum::<f64>() <= 0.0 {
            return candidates.choose(&mut self.rng).map(|&i| self.items[i]);
        }
        let distribution = WeightedIndex::new(&weights).ok()?;
        let pick = candidates[self.rng.sample(&distribution)];
        Some(self.items[pick])
    }

    /// How consistent an ordering (lowest quality first) is with the current
    /// beliefs: the sum over adjacent pairs of the probability that the pair
    /// is correctly ordered. Range `[0, len - 1]`.
    pub fn evaluate_ordering(&self, ordering: &[ItemId]) -> f64 {
        self.pair_agreements(ordering).iter().sum()
    }

    /// Normalized consistency in `(0, 1)`: the Beta-posterior mean of the
    /// adjacent-pair agreements, `(sum + 1) / (pairs + 2)`. Returns 0 for
    /// orderings with fewer than two known items.
    pub fn evaluate_ordering_using_dirichlet(&self, ordering: &[ItemId]) -> f64 {
        let agreements = self.pair_agreements(ordering);
        if agreements.is_empty() {
            return 0.0;
        }
        let total: f64 = agreements.iter().sum();
        (total + 1.0) / (agreements.len() as f64 + 2.0)
    }

    fn pair_agreements(&self, ordering: &[ItemId]) -> Vec<f64> {
        let listed: Vec<usize> = ordering
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();
        listed
            .iter()
            .tuple_windows()
            .map(|(&low, &high)| {
                let cdf_low = self.arena.cdf(low);
                prob_less(self.arena.row(low), &cdf_low, self.arena.row(high))
            })
            .collect()
    }

    /// Rank position of each item as a fraction in `[0, 1]`, 0 = top. A
    /// single item sits mid-rank.
    fn rank_fractions(&self) -> Vec<f64> {
        let n = self.items.len();
        if n <= 1 {
            return vec![0.5; n];
        }
        let mut order: Vec<usize> = (0..n).collect();
        let means: Vec<f64> = (0..n).map(|i| self.arena.moments(i).mean).collect();
        order.sort_by_key(|&i| (OrderedFloat(-means[i]), self.items[i]));
        let mut fractions = vec![0.0; n];
        for (position, &i) in order.iter().enumerate() {
            fractions[i] = position as f64 / (n - 1) as f64;
        }
        fractions
    }
}
