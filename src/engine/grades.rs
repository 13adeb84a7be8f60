//! Final-grade computation.

use std::collections::HashMap;

use chrono::Utc;
use ordered_float::OrderedFloat;
use tracing::info;

use super::RankingEngine;
use crate::data::models::{GradeRow, UserId, VenueId, VenueTouch};
use crate::error::Result;
use crate::ports::VenueStore;

/// Weight of a user's own submission in their final grade.
pub(crate) const SUBMISSION_WEIGHT: f64 = 2.0 / 3.0;
/// Weight of a user's reviewing reputation in their final grade.
pub(crate) const REVIEW_WEIGHT: f64 = 1.0 / 3.0;

/// Combines submission and reviewing grades and assigns descending
/// percentiles.
///
/// Each user's grade is `2/3 * submission + 1/3 * reviewing`, with 0
/// substituted for a missing component. The `i`-th ranked of `N` users
/// (best first, grade ties broken by user id) receives percentile
/// `100 * (N - i) / N`, so the top user always receives 100 and the bottom
/// `100 / N`.
pub fn final_grades(
    users: &[UserId],
    submission_grade: &HashMap<UserId, f64>,
    review_grade: &HashMap<UserId, f64>,
) -> (HashMap<UserId, f64>, HashMap<UserId, f64>) {
    let grades: HashMap<UserId, f64> = users
        .iter()
        .map(|user| {
            let grade = submission_grade.get(user).copied().unwrap_or(0.0) * SUBMISSION_WEIGHT
                + review_grade.get(user).copied().unwrap_or(0.0) * REVIEW_WEIGHT;
            (*user, grade)
        })
        .collect();

    let mut ranked: Vec<(UserId, f64)> = grades.iter().map(|(&u, &g)| (u, g)).collect();
    ranked.sort_by_key(|&(user, grade)| (OrderedFloat(-grade), user));
    let n = ranked.len() as f64;
    let percentiles = ranked
        .iter()
        .enumerate()
        .map(|(i, &(user, _))| (user, 100.0 * (n - i as f64) / n))
        .collect();
    (percentiles, grades)
}

impl<S: VenueStore> RankingEngine<S> {
    /// Recomputes the venue's final grades from the stored submission
    /// percentiles and stored reputations, replacing the grade table
    /// wholesale. Idempotent on a frozen store.
    pub async fn compute_grades(&self, venue: VenueId) -> Result<()> {
        let mut users: Vec<UserId> = Vec::new();
        let mut submission_grade: HashMap<UserId, f64> = HashMap::new();
        for record in self.store.list_items(venue).await? {
            submission_grade
                .insert(record.author, record.percentile.unwrap_or(0.0) / 100.0);
            if !users.contains(&record.author) {
                users.push(record.author);
            }
        }
        let mut review_grade: HashMap<UserId, f64> = HashMap::new();
        for (user, record) in self.store.list_user_accuracy(venue).await? {
            if let Some(reputation) = record.reputation {
                review_grade.insert(user, reputation);
            }
            if !users.contains(&user) {
                users.push(user);
            }
        }
        if users.is_empty() {
            return Ok(());
        }

        let (percentiles, grades) = final_grades(&users, &submission_grade, &review_grade);
        let rows: Vec<GradeRow> = users
            .iter()
            .map(|user| GradeRow {
                user: *user,
                grade: grades[user],
                percentile: percentiles[user],
            })
            .collect();
        self.store.replace_grades(venue, rows).await?;
        self.store
            .touch_venue(venue, VenueTouch::final_grades(Utc::now()))
            .await?;
        self.store.commit().await?;
        info!(venue, users = users.len(), "final grades replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_grade_weighting() {
        let users = vec![1, 2, 3];
        let submission: HashMap<UserId, f64> =
            [(1, 0.9), (2, 0.5), (3, 0.1)].into_iter().collect();
        let review: HashMap<UserId, f64> = [(1, 0.6), (2, 0.4), (3, 0.0)].into_iter().collect();
        let (percentiles, grades) = final_grades(&users, &submission, &review);

        assert!((grades[&1] - 0.8).abs() < 1e-9);
        assert!((grades[&2] - (0.5 * 2.0 / 3.0 + 0.4 / 3.0)).abs() < 1e-9);
        assert!((grades[&3] - (0.1 * 2.0 / 3.0)).abs() < 1e-9);
        assert!((percentiles[&1] - 100.0).abs() < 1e-9);
        assert!((percentiles[&2] - 200.0 / 3.0).abs() < 1e-9);
        assert!((percentiles[&3] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_components_default_to_zero() {
        let users = vec![1, 2];
        let submission: HashMap<UserId, f64> = [(1, 0.6)].into_iter().collect();
        let review: HashMap<UserId, f64> = [(2, 0.9)].into_iter().collect();
        let (_, grades) = final_grades(&users, &submission, &review);
        assert!((grades[&1] - 0.4).abs() < 1e-9);
        assert!((grades[&2] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_grade_ties_break_by_user_id() {
        let users = vec![9, 4];
        let submission = HashMap::new();
        let review: HashMap<UserId, f64> = [(9, 0.5), (4, 0.5)].into_iter().collect();
        let (percentiles, _) = final_grades(&users, &submission, &review);
        assert!((percentiles[&4] - 100.0).abs() < 1e-9);
        assert!((percentiles[&9] - 50.0).abs() < 1e-9);
    }
}
