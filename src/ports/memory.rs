//! In-memory [`VenueStore`] used by tests, benches and the demo binary.
//!
//! Writes are applied immediately and `commit` is a no-op; durable backends
//! are expected to buffer instead.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::VenueStore;
use crate::data::models::{
    ComparisonRecord, DateOrder, GradeRow, ItemId, ItemRecord, UserAccuracyRecord, UserId,
    VenueId, VenueSettings, VenueTouch,
};
use crate::error::Result;
use crate::model::Belief;

#[derive(Debug, Clone)]
struct StoredItem {
    item: ItemId,
    author: UserId,
    mean: Option<f64>,
    stdev: Option<f64>,
    percentile: Option<f64>,
}

/// Venue bookkeeping visible to tests.
#[derive(Debug, Clone, Default)]
pub struct VenueMeta {
    pub settings: VenueSettings,
    pub latest_rank_update_date: Option<DateTime<Utc>>,
    pub latest_reviewers_evaluation_date: Option<DateTime<Utc>>,
    pub latest_final_grades_evaluation_date: Option<DateTime<Utc>>,
    pub ranking_algo_description: Option<String>,
}

#[derive(Default)]
struct Tables {
    items: HashMap<VenueId, Vec<StoredItem>>,
    comparisons: HashMap<VenueId, Vec<ComparisonRecord>>,
    tasks: HashMap<VenueId, Vec<(UserId, ItemId)>>,
    accuracy: HashMap<(VenueId, UserId), UserAccuracyRecord>,
    grades: HashMap<VenueId, Vec<GradeRow>>,
    venues: HashMap<VenueId, VenueMeta>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, venue: VenueId, item: ItemId, author: UserId) {
        let mut tables = self.tables.write();
        tables.items.entry(venue).or_default().push(StoredItem {
            item,
            author,
            mean: None,
            stdev: None,
            percentile: None,
        });
        tables.venues.entry(venue).or_default();
    }

    /// Seeds an item with already-ranked state, for fixtures.
    pub fn seed_item_state(
        &self,
        venue: VenueId,
        item: ItemId,
        mean: f64,
        stdev: f64,
        percentile: Option<f64>,
    ) {
        let mut tables = self.tables.write();
        if let Some(rows) = tables.items.get_mut(&venue) {
            if let Some(row) = rows.iter_mut().find(|r| r.item == item) {
                row.mean = Some(mean);
                row.stdev = Some(stdev);
                row.percentile = percentile;
            }
        }
    }

    pub fn seed_accuracy(&self, venue: VenueId, user: UserId, record: UserAccuracyRecord) {
        self.tables.write().accuracy.insert((venue, user), record);
    }

    pub fn set_venue_settings(&self, venue: VenueId, settings: VenueSettings) {
        self.tables.write().venues.entry(venue).or_default().settings = settings;
    }

    pub fn add_comparison(&self, venue: VenueId, record: ComparisonRecord) {
        self.tables.write().comparisons.entry(venue).or_default().push(record);
    }

    pub fn add_task(&self, venue: VenueId, user: UserId, item: ItemId) {
        self.tables.write().tasks.entry(venue).or_default().push((user, item));
    }

    pub fn item(&self, venue: VenueId, item: ItemId) -> Option<ItemRecord> {
        self.tables
            .read()
            .items
            .get(&venue)
            .and_then(|rows| rows.iter().find(|r| r.item == item))
            .map(record_of)
    }

    pub fn grades(&self, venue: VenueId) -> Vec<GradeRow> {
        self.tables.read().grades.get(&venue).cloned().unwrap_or_default()
    }

    pub fn accuracy(&self, venue: VenueId, user: UserId) -> Option<UserAccuracyRecord> {
        self.tables.read().accuracy.get(&(venue, user)).cloned()
    }

    pub fn venue_meta(&self, venue: VenueId) -> Option<VenueMeta> {
        self.tables.read().venues.get(&venue).cloned()
    }
}

fn record_of(row: &StoredItem) -> ItemRecord {
    ItemRecord {
        item: row.item,
        author: row.author,
        mean: row.mean,
        stdev: row.stdev,
        percentile: row.percentile,
    }
}

#[async_trait]
impl VenueStore for MemoryStore {
    async fn list_items(&self, venue: VenueId) -> Result<Vec<ItemRecord>> {
        Ok(self
            .tables
            .read()
            .items
            .get(&venue)
            .map(|rows| rows.iter().map(record_of).collect())
            .unwrap_or_default())
    }

    async fn item_beliefs(&self, venue: VenueId, items: &[ItemId]) -> Result<Vec<Belief>> {
        let tables = self.tables.read();
        let rows = tables.items.get(&venue);
        Ok(items
            .iter()
            .map(|&id| {
                rows.and_then(|rows| rows.iter().find(|r| r.item == id))
                    .map(|r| Belief::from_stored(r.mean, r.stdev))
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn list_comparisons(
        &self,
        venue: VenueId,
        order: DateOrder,
    ) -> Result<Vec<ComparisonRecord>> {
        let mut comparisons = self
            .tables
            .read()
            .comparisons
            .get(&venue)
            .cloned()
            .unwrap_or_default();
        comparisons.sort_by_key(|c| c.date);
        if order == DateOrder::Descending {
            comparisons.reverse();
        }
        Ok(comparisons)
    }

    async fn latest_comparison(
        &self,
        venue: VenueId,
        user: UserId,
    ) -> Result<Option<ComparisonRecord>> {
        Ok(self
            .tables
            .read()
            .comparisons
            .get(&venue)
            .and_then(|rows| {
                rows.iter()
                    .filter(|c| c.reviewer == user)
                    .max_by_key(|c| c.date)
            })
            .cloned())
    }

    async fn count_tasks(&self, venue: VenueId, item: ItemId) -> Result<u64> {
        Ok(self
            .tables
            .read()
            .tasks
            .get(&venue)
            .map(|rows| rows.iter().filter(|&&(_, i)| i == item).count() as u64)
            .unwrap_or(0))
    }

    async fn venue_config(&self, venue: VenueId) -> Result<VenueSettings> {
        Ok(self
            .tables
            .read()
            .venues
            .get(&venue)
            .map(|meta| meta.settings)
            .unwrap_or_default())
    }

    async fn list_user_accuracy(
        &self,
        venue: VenueId,
    ) -> Result<Vec<(UserId, UserAccuracyRecord)>> {
        let mut rows: Vec<(UserId, UserAccuracyRecord)> = self
            .tables
            .read()
            .accuracy
            .iter()
            .filter(|((v, _), _)| *v == venue)
            .map(|((_, user), record)| (*user, record.clone()))
            .collect();
        rows.sort_by_key(|&(user, _)| user);
        Ok(rows)
    }

    async fn write_item_belief(
        &self,
        venue: VenueId,
        item: ItemId,
        belief: Belief,
        percentile: Option<f64>,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        if let Some(rows) = tables.items.get_mut(&venue) {
            if let Some(row) = rows.iter_mut().find(|r| r.item == item) {
                row.mean = Some(belief.mean);
                row.stdev = Some(belief.stdev);
                if percentile.is_some() {
                    row.percentile = percentile;
                }
            }
        }
        Ok(())
    }

    async fn upsert_user_accuracy(
        &self,
        venue: VenueId,
        user: UserId,
        record: UserAccuracyRecord,
    ) -> Result<()> {
        self.tables.write().accuracy.insert((venue, user), record);
        Ok(())
    }

    async fn delete_user_accuracy(&self, venue: VenueId, user: UserId) -> Result<()> {
        self.tables.write().accuracy.remove(&(venue, user));
        Ok(())
    }

    async fn replace_grades(&self, venue: VenueId, rows: Vec<GradeRow>) -> Result<()> {
        self.tables.write().grades.insert(venue, rows);
        Ok(())
    }

    async fn touch_venue(&self, venue: VenueId, touch: VenueTouch) -> Result<()> {
        let mut tables = self.tables.write();
        let meta = tables.venues.entry(venue).or_default();
        if touch.rank_update {
            meta.latest_rank_update_date = Some(touch.at);
        }
        if touch.reviewers_evaluation {
            meta.latest_reviewers_evaluation_date = Some(touch.at);
        }
        if touch.final_grades {
            meta.latest_final_grades_evaluation_date = Some(touch.at);
        }
        if let Some(description) = touch.description {
            meta.ranking_algo_description = Some(description);
        }
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }
}
