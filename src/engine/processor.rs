//! Comparison processing: the live single-comparison path and the legacy
//! full replay.

use chrono::Utc;
use tracing::{debug, info};

use super::RankingEngine;
use crate::data::models::{DateOrder, ItemId, UserId, VenueId, VenueTouch};
use crate::error::Result;
use crate::model::{Belief, CostModel, Rank};
use crate::ports::VenueStore;

const REPLAY_DESCRIPTION: &str =
    "Ranking without reputation system. All comparisons are used in chronological order";

impl<S: VenueStore> RankingEngine<S> {
    /// Applies one observed ordering (lowest perceived quality first) to the
    /// live model and persists each listed item's posterior.
    ///
    /// Orderings shorter than two items are silently skipped. The posterior
    /// percentiles are not persisted on this path; they refresh on the next
    /// batch run.
    pub async fn record_comparison(
        &self,
        venue: VenueId,
        user: UserId,
        sorted_items: &[ItemId],
        new_item: Option<ItemId>,
        alpha: Option<f64>,
    ) -> Result<()> {
        if sorted_items.len() <= 1 {
            debug!(venue, user, "ordering too short, skipping");
            return Ok(());
        }
        let beliefs = self.store.item_beliefs(venue, sorted_items).await?;
        let alpha = alpha.unwrap_or(self.config.comparison_annealing);
        let mut rank =
            Rank::from_beliefs(sorted_items.to_vec(), &beliefs, CostModel::None, alpha)?;
        let result = rank.update(sorted_items, new_item, None);

        for item in sorted_items {
            if let Some(estimate) = result.get(item) {
                self.store
                    .write_item_belief(
                        venue,
                        *item,
                        Belief::new(estimate.mean, estimate.stdev),
                        None,
                    )
                    .await?;
            }
        }
        self.store
            .touch_venue(venue, VenueTouch::rank_update(Utc::now()))
            .await?;
        self.store.commit().await?;
        info!(venue, user, items = sorted_items.len(), "comparison processed");
        Ok(())
    }

    /// Rebuilds every item's belief from the default prior by replaying all
    /// valid stored comparisons in chronological order; with `twice`, the
    /// replay runs again in reverse-chronological order. Persists the full
    /// `(mean, stdev, percentile)` for every item.
    pub async fn reprocess(&self, venue: VenueId, alpha: Option<f64>, twice: bool) -> Result<()> {
        let records = self.store.list_items(venue).await?;
        if records.is_empty() {
            return Ok(());
        }
        let items: Vec<ItemId> = records.iter().map(|r| r.item).collect();
        let beliefs = vec![Belief::prior(); items.len()];
        let alpha = alpha.unwrap_or(self.config.annealing);
        let mut rank = Rank::from_beliefs(items.clone(), &beliefs, CostModel::None, alpha)?;

        let mut result = None;
        let comparisons = self.store.list_comparisons(venue, DateOrder::Ascending).await?;
        for comparison in comparisons.iter().filter(|c| c.is_usable()) {
            let sorted = comparison.sorted_low_to_high();
            if sorted.len() < 2 {
                continue;
            }
            result = Some(rank.update(&sorted, comparison.new_item, None));
        }
        if twice {
            let comparisons = self.store.list_comparisons(venue, DateOrder::Descending).await?;
            for comparison in comparisons.iter().filter(|c| c.is_usable()) {
                let sorted = comparison.sorted_low_to_high();
                if sorted.len() < 2 {
                    continue;
                }
                result = Some(rank.update(&sorted, comparison.new_item, None));
            }
        }
        let Some(result) = result else {
            debug!(venue, "no usable comparisons to replay");
            return Ok(());
        };

        for item in &items {
            if let Some(estimate) = result.get(item) {
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
        self.store
            .touch_venue(
                venue,
                VenueTouch::rank_update(Utc::now()).described(REPLAY_DESCRIPTION),
            )
            .await?;
        self.store.commit().await?;
        info!(venue, replayed = comparisons.len(), twice, "comparisons reprocessed");
        Ok(())
    }
}
