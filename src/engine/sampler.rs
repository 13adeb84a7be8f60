//! Next-task selection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::RankingEngine;
use crate::data::models::{ItemId, UserId, VenueId};
use crate::model::{Belief, CostModel, Rank};
use crate::ports::VenueStore;
use crate::error::Result;

/// Per-call sampling options.
#[derive(Debug, Clone, Copy)]
pub struct TaskOptions {
    pub can_rank_own: bool,
    pub cost_coefficient: f64,
}

impl<S: VenueStore> RankingEngine<S> {
    /// Picks the next item to offer `user`, using the configured sampling
    /// options. Returns `None` when the venue holds nothing this user may
    /// review.
    pub async fn next_task(
        &self,
        venue: VenueId,
        user: UserId,
        old_items: &[ItemId],
    ) -> Result<Option<ItemId>> {
        let options = TaskOptions {
            can_rank_own: self.config.can_rank_own_submissions,
            cost_coefficient: self.config.rank_cost_coefficient,
        };
        self.next_task_with(venue, user, old_items, options).await
    }

    /// Like [`Self::next_task`] with explicit options.
    ///
    /// Items tied for the lowest task-offer count are always the candidate
    /// pool; among several, the one whose comparison against the items the
    /// user has already seen is most informative wins.
    pub async fn next_task_with(
        &self,
        venue: VenueId,
        user: UserId,
        old_items: &[ItemId],
        options: TaskOptions,
    ) -> Result<Option<ItemId>> {
        let records = self.store.list_items(venue).await?;
        if records.is_empty() {
            debug!(venue, "no items to offer");
            return Ok(None);
        }
        let seen: HashSet<ItemId> = old_items.iter().copied().collect();

        // Offer frequency for each item this user may still review.
        let mut frequency: Vec<(ItemId, u64)> = Vec::new();
        for record in &records {
            if !options.can_rank_own && record.author == user {
                continue;
            }
            if seen.contains(&record.item) {
                continue;
            }
            let count = self.store.count_tasks(venue, record.item).await?;
            frequency.push((record.item, count));
        }
        if frequency.is_empty() {
            debug!(venue, user, "user has reviewed everything they may");
            return Ok(None);
        }

        let min_count = frequency.iter().map(|&(_, count)| count).min().unwrap_or(0);
        let rare: Vec<ItemId> = frequency
            .iter()
            .filter(|&&(_, count)| count == min_count)
            .map(|&(item, _)| item)
            .collect();
        if rare.len() == 1 {
            return Ok(Some(rare[0]));
        }

        // Pool the rare items with the user's history; the ranker samples a
        // rare item by its expected mistake mass against the history.
        let by_id: HashMap<ItemId, &crate::data::models::ItemRecord> =
            records.iter().map(|r| (r.item, r)).collect();
        let mut pool = rare.clone();
        for id in old_items.iter().copied() {
            if by_id.contains_key(&id) && !pool.contains(&id) {
                pool.push(id);
            }
        }
        let beliefs: Vec<Belief> = pool
            .iter()
            .map(|id| {
                by_id
                    .get(id)
                    .map(|r| Belief::from_stored(r.mean, r.stdev))
                    .unwrap_or_default()
            })
            .collect();

        let cost = CostModel::rank_power(options.cost_coefficient);
        let mut rank = Rank::from_beliefs(pool, &beliefs, cost, self.config.annealing)?;
        if let Some(seed) = self.config.seed {
            rank = rank.with_seed(seed);
        }
        let picked = rank.sample_item(old_items, &[]);
        debug!(venue, user, ?picked, "sampled next task");
        Ok(picked)
    }
}
