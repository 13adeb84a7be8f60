//! The reputation fixed point.
//!
//! Submission quality and reviewer reputation depend on each other; the loop
//! resolves the cycle by rebuilding the ranker from the default prior at the
//! start of every outer iteration, re-weighting each reviewer's orderings by
//! their evolving reputation, then refreshing reputation from the resulting
//! ranking and ordering consistency.

use std::collections::HashMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{grades, RankingEngine};
use crate::config::RankerConfig;
use crate::data::models::{
    DateOrder, GradeRow, ItemId, UserAccuracyRecord, UserId, VenueId, VenueTouch,
};
use crate::error::Result;
use crate::model::{Belief, CostModel, ItemEstimate, Rank};
use crate::ports::VenueStore;

/// Percentile rank assigned to reviewers with no submission of their own.
pub const UNKNOWN_REVIEWER_RANK: f64 = 0.5;

/// Parameters for one reputation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReputationParams {
    /// Base annealing; also the reputation every user starts from.
    pub annealing: f64,
    /// Outer iterations of the fixed point.
    pub iterations: usize,
    /// `Some(k)`: small-alpha mode, `k` shuffled passes over each reviewer's
    /// latest ordering per outer iteration. `None`: one chronological pass
    /// over all comparisons per outer iteration.
    pub last_comparisons: Option<usize>,
}

impl Default for ReputationParams {
    fn default() -> Self {
        Self { annealing: 0.5, iterations: 4, last_comparisons: Some(10) }
    }
}

impl ReputationParams {
    pub fn from_config(config: &RankerConfig) -> Self {
        Self {
            annealing: config.annealing,
            iterations: config.iterations,
            last_comparisons: config.last_comparisons,
        }
    }

    fn description(&self) -> &'static str {
        match (self.last_comparisons, self.iterations) {
            (None, 1) => {
                "Ranking without reputation system. All comparisons are used in chronological order"
            }
            (None, _) => "Reputation system on all comparisons in chronological order",
            (Some(_), 1) => "Small alpha on last comparisons without reputation iterations",
            (Some(_), _) => "Reputation system with small alpha and only last comparisons",
        }
    }
}

/// Venue state a reputation run works from.
struct RepInputs {
    /// Submitters first (submission order), then reviewers.
    users: Vec<UserId>,
    items: Vec<ItemId>,
    submission_of: HashMap<UserId, ItemId>,
    /// Orderings to apply per inner pass, already reversed to
    /// lowest-quality-first. Chronological mode holds every valid
    /// comparison in date order; small-alpha mode one entry per reviewer.
    orderings: Vec<(Vec<ItemId>, UserId)>,
    /// Each reviewer's latest valid ordering, for accuracy scoring.
    last_ordering: HashMap<UserId, Vec<ItemId>>,
}

impl<S: VenueStore> RankingEngine<S> {
    /// Runs the reputation fixed point and persists submission beliefs,
    /// reviewer accuracy/reputation and the venue's final grades in one
    /// batch.
    pub async fn run_reputation(&self, venue: VenueId, params: ReputationParams) -> Result<()> {
        let inputs = self.read_reputation_inputs(venue, params.last_comparisons).await?;
        if inputs.items.is_empty() {
            info!(venue, "reputation run skipped: no submissions");
            return Ok(());
        }
        let default_beliefs = vec![Belief::prior(); inputs.items.len()];
        let mut rng = self.rng();

        let mut reputation: HashMap<UserId, f64> =
            inputs.users.iter().map(|&u| (u, params.annealing)).collect();
        let mut accuracy: HashMap<UserId, f64> =
            inputs.users.iter().map(|&u| (u, 0.0)).collect();

        let mut result: Option<HashMap<ItemId, ItemEstimate>> = None;
        for _ in 0..params.iterations.max(1) {
            // Restart from the prior so earlier iterations leave no drift.
            let mut rank = Rank::from_beliefs(
                inputs.items.clone(),
                &default_beliefs,
                CostModel::None,
                params.annealing,
            )?;
            match params.last_comparisons {
                None => {
                    for (ordering, user) in &inputs.orderings {
                        let alpha = reputation[user];
                        result = Some(rank.update(ordering, None, Some(alpha)));
                    }
                }
                Some(passes) => {
                    for _ in 0..passes.max(1) {
                        let mut order: Vec<usize> = (0..inputs.orderings.len()).collect();
                        order.shuffle(&mut rng);
                        for index in order {
                            let (ordering, user) = &inputs.orderings[index];
                            // Damped so that `passes` repeats of one ordering
                            // approximate a single reputation-weighted step.
                            let alpha = 1.0
                                - (1.0 - reputation[user]).powf(1.0 / (4.0 * passes as f64));
                            result = Some(rank.update(ordering, None, Some(alpha)));
                        }
                    }
                }
            }
            let Some(estimates) = result.as_ref() else {
                info!(venue, "reputation run skipped: no usable comparisons");
                return Ok(());
            };
            for user in &inputs.users {
                let rank_score = inputs
                    .submission_of
                    .get(user)
                    .and_then(|item| estimates.get(item))
                    .map(|e| e.percentile / 100.0)
                    .unwrap_or(UNKNOWN_REVIEWER_RANK);
                let consistency = inputs
                    .last_ordering
                    .get(user)
                    .map(|ordering| rank.evaluate_ordering_using_dirichlet(ordering))
                    .unwrap_or(0.0);
                accuracy.insert(*user, consistency);
                reputation.insert(*user, (rank_score * consistency).sqrt());
            }
        }
        let Some(estimates) = result else {
            return Ok(());
        };

        // Final grades from submission percentiles and converged reputation.
        let submission_grade: HashMap<UserId, f64> = inputs
            .submission_of
            .iter()
            .filter_map(|(user, item)| {
                estimates.get(item).map(|e| (*user, e.percentile / 100.0))
            })
            .collect();
        let (grade_percentile, final_grade) =
            grades::final_grades(&inputs.users, &submission_grade, &reputation);

        for item in &inputs.items {
            if let Some(estimate) = estimates.get(item) {
                self.store
                    .write_item_belief(
                        venue,
                        *item,
                        Belief::new(estimate.mean, estimate.stdev),
                        Some(estimate.percentile),
                    )
                    .await?;
            }
        }
        for user in &inputs.users {
            let n_ratings = inputs.last_ordering.get(user).map(|o| o.len()).unwrap_or(0);
            self.store
                .upsert_user_accuracy(
                    venue,
                    *user,
                    UserAccuracyRecord {
                        accuracy: accuracy[user],
                        reputation: Some(reputation[user]),
                        n_ratings,
                    },
                )
                .await?;
        }
        let rows: Vec<GradeRow> = inputs
            .users
            .iter()
            .map(|user| GradeRow {
                user: *user,
                grade: final_grade[user],
                percentile: grade_percentile[user],
            })
            .collect();
        self.store.replace_grades(venue, rows).await?;
        self.store
            .touch_venue(
                venue,
                VenueTouch::full_pass(Utc::now()).described(params.description()),
            )
            .await?;
        self.store.commit().await?;
        info!(
            venue,
            iterations = params.iterations,
            small_alpha = params.last_comparisons.is_some(),
            "reputation run complete"
        );
        Ok(())
    }

    /// One chronological pass with no reputation weighting; also refreshes
    /// accuracy and final grades.
    pub async fn rank_without_rep_sys(&self, venue: VenueId) -> Result<()> {
        self.run_reputation(
            venue,
            ReputationParams {
                annealing: self.config.annealing,
                iterations: 1,
                last_comparisons: None,
            },
        )
        .await
    }

    async fn read_reputation_inputs(
        &self,
        venue: VenueId,
        last_comparisons: Option<usize>,
    ) -> Result<RepInputs> {
        let mut users: Vec<UserId> = Vec::new();
        let mut items: Vec<ItemId> = Vec::new();
        let mut submission_of: HashMap<UserId, ItemId> = HashMap::new();
        for record in self.store.list_items(venue).await? {
            items.push(record.item);
            submission_of.insert(record.author, record.item);
            if !users.contains(&record.author) {
                users.push(record.author);
            }
        }

        let mut chronological: Vec<(Vec<ItemId>, UserId)> = Vec::new();
        let mut last_ordering: HashMap<UserId, Vec<ItemId>> = HashMap::new();
        for comparison in self.store.list_comparisons(venue, DateOrder::Ascending).await? {
            if !comparison.is_usable() {
                continue;
            }
            let sorted = comparison.sorted_low_to_high();
            if sorted.len() < 2 {
                continue;
            }
            last_ordering.insert(comparison.reviewer, sorted.clone());
            chronological.push((sorted, comparison.reviewer));
        }
        // Submitters keep submission order; reviewers append in first-seen
        // date order.
        for (_, reviewer) in &chronological {
            if !users.contains(reviewer) {
                users.push(*reviewer);
            }
        }

        let orderings = match last_comparisons {
            None => chronological,
            Some(_) => users
                .iter()
                .filter_map(|user| {
                    last_ordering.get(user).map(|ordering| (ordering.clone(), *user))
                })
                .collect(),
        };
        Ok(RepInputs { users, items, submission_of, orderings, last_ordering })
    }
}
