//! Domain records shared by the model, the engine and the storage ports.

pub mod models;

pub use models::{
    ComparisonRecord, DateOrder, GradeRow, ItemId, ItemRecord, UserAccuracyRecord, UserId,
    VenueId, VenueSettings, VenueTouch,
};
