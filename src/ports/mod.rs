//! Persistence ports.
//!
//! The engine reads and writes venue state only through [`VenueStore`]; it
//! owns no shared in-memory state across invocations and suspends only on
//! these calls. Implementations are expected to buffer writes and make them
//! atomic at [`VenueStore::commit`], so an interrupted pass leaves storage
//! unchanged. Backend failures cross the boundary unchanged as
//! [`crate::RankError::Storage`].

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::data::models::{
    ComparisonRecord, DateOrder, GradeRow, ItemId, ItemRecord, UserAccuracyRecord, UserId,
    VenueId, VenueSettings, VenueTouch,
};
use crate::error::Result;
use crate::model::Belief;

#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Every submission in the venue, with whatever beliefs are stored.
    async fn list_items(&self, venue: VenueId) -> Result<Vec<ItemRecord>>;

    /// Beliefs for the given items in the same order, defaults applied for
    /// items with no stored belief.
    async fn item_beliefs(&self, venue: VenueId, items: &[ItemId]) -> Result<Vec<Belief>>;

    /// Every comparison in the venue in the requested date order.
    async fn list_comparisons(
        &self,
        venue: VenueId,
        order: DateOrder,
    ) -> Result<Vec<ComparisonRecord>>;

    /// The most recent comparison by one reviewer, if any.
    async fn latest_comparison(
        &self,
        venue: VenueId,
        user: UserId,
    ) -> Result<Option<ComparisonRecord>>;

    /// How many times an item has been offered as a review task.
    async fn count_tasks(&self, venue: VenueId, item: ItemId) -> Result<u64>;

    async fn venue_config(&self, venue: VenueId) -> Result<VenueSettings>;

    /// All reviewer scoring rows for the venue.
    async fn list_user_accuracy(
        &self,
        venue: VenueId,
    ) -> Result<Vec<(UserId, UserAccuracyRecord)>>;

    async fn write_item_belief(
        &self,
        venue: VenueId,
        item: ItemId,
        belief: Belief,
        percentile: Option<f64>,
    ) -> Result<()>;

    async fn upsert_user_accuracy(
        &self,
        venue: VenueId,
        user: UserId,
        record: UserAccuracyRecord,
    ) -> Result<()>;

    async fn delete_user_accuracy(&self, venue: VenueId, user: UserId) -> Result<()>;

    /// Replaces the venue's grade table wholesale.
    async fn replace_grades(&self, venue: VenueId, rows: Vec<GradeRow>) -> Result<()>;

    async fn touch_venue(&self, venue: VenueId, touch: VenueTouch) -> Result<()>;

    async fn commit(&self) -> Result<()>;
}
