//! Reviewer accuracy scoring.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;

use super::RankingEngine;
use crate::data::models::{
    DateOrder, ItemId, UserAccuracyRecord, UserId, VenueId, VenueSettings, VenueTouch,
};
use crate::error::Result;
use crate::model::{Belief, CostModel, Rank};
use crate::ports::VenueStore;

/// Which of a reviewer's comparisons feed their accuracy score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyScope {
    /// Score only the most recent comparison.
    LastOnly,
    /// Score every valid comparison and average the normalized results.
    All,
}

impl<S: VenueStore> RankingEngine<S> {
    /// Scores each reviewer's most recent ordering against the current
    /// beliefs and upserts the result into the accuracy table.
    pub async fn score_reviewers(&self, venue: VenueId) -> Result<()> {
        self.score_reviewers_with(venue, AccuracyScope::LastOnly).await
    }

    /// Like [`Self::score_reviewers`] with an explicit scope.
    ///
    /// The raw consistency is normalized by the venue's configured
    /// submissions-per-reviewer count and clamped to 1. Reviewers whose
    /// scored comparison cannot be found have any stale accuracy row
    /// deleted.
    pub async fn score_reviewers_with(&self, venue: VenueId, scope: AccuracyScope) -> Result<()> {
        let records = self.store.list_items(venue).await?;
        if records.is_empty() {
            return Ok(());
        }
        let items: Vec<ItemId> = records.iter().map(|r| r.item).collect();
        let beliefs: Vec<Belief> = records
            .iter()
            .map(|r| Belief::from_stored(r.mean, r.stdev))
            .collect();
        let rank = Rank::from_beliefs(items, &beliefs, CostModel::None, self.config.annealing)?;

        let settings = self.store.venue_config(venue).await?;
        let normalizer = self.reviews_normalizer(&settings);

        let comparisons = self.store.list_comparisons(venue, DateOrder::Ascending).await?;
        let reviewers: BTreeSet<UserId> = comparisons.iter().map(|c| c.reviewer).collect();

        for user in reviewers {
            let scored = match scope {
                AccuracyScope::LastOnly => self
                    .store
                    .latest_comparison(venue, user)
                    .await?
                    .map(|comparison| {
                        let ordering = comparison.sorted_low_to_high();
                        let raw = rank.evaluate_ordering(&ordering);
                        ((raw / normalizer).min(1.0), ordering.len())
                    }),
                AccuracyScope::All => {
                    let scores: Vec<(f64, usize)> = comparisons
                        .iter()
                        .filter(|c| c.reviewer == user && c.is_usable())
                        .map(|comparison| {
                            let ordering = comparison.sorted_low_to_high();
                            let raw = rank.evaluate_ordering(&ordering);
                            ((raw / normalizer).min(1.0), ordering.len())
                        })
                        .collect();
                    if scores.is_empty() {
                        None
                    } else {
                        let mean =
                            scores.iter().map(|&(s, _)| s).sum::<f64>() / scores.len() as f64;
                        let last_len = scores.last().map(|&(_, n)| n).unwrap_or(0);
                        Some((mean, last_len))
                    }
                }
            };
            match scored {
                None => self.store.delete_user_accuracy(venue, user).await?,
                Some((accuracy, n_ratings)) => {
                    self.store
                        .upsert_user_accuracy(
                            venue,
                            user,
                            UserAccuracyRecord { accuracy, reputation: None, n_ratings },
                        )
                        .await?
                }
            }
        }
        self.store
            .touch_venue(venue, VenueTouch::reviewers_evaluation(Utc::now()))
            .await?;
        self.store.commit().await?;
        info!(venue, ?scope, "reviewers scored");
        Ok(())
    }

    /// The accuracy normaliser: the venue's submissions-per-reviewer count,
    /// or the configured fallback when absent or zero.
    pub(crate) fn reviews_normalizer(&self, settings: &VenueSettings) -> f64 {
        match settings.submissions_per_reviewer {
            Some(n) if n > 0 => n as f64,
            _ => self.config.submissions_per_reviewer_fallback as f64,
        }
    }
}
