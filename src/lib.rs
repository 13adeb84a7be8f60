//! Reputation-weighted Bayesian ranking for peer-reviewed venues.
//!
//! A venue holds submissions; reviewers produce ordered comparisons. Each
//! submission carries a Gaussian belief over its latent quality, each
//! reviewer a reputation in `[0, 1]`. The engine hands each reviewer the
//! most informative next item, folds observed orderings into the quality
//! beliefs, scores reviewers against the model, and runs a fixed-point
//! iteration that jointly estimates quality and reputation to produce
//! final grades.
//!
//! All persistent state lives behind the [`ports::VenueStore`] trait; the
//! numeric core in [`model`] never suspends.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod model;
pub mod ports;

pub use config::RankerConfig;
pub use data::models::{
    ComparisonRecord, DateOrder, GradeRow, ItemId, ItemRecord, UserAccuracyRecord, UserId,
    VenueId, VenueSettings, VenueTouch,
};
pub use engine::{
    final_grades, AccuracyScope, RankingEngine, ReputationParams, TaskOptions,
    UNKNOWN_REVIEWER_RANK,
};
pub use error::{RankError, Result};
pub use model::{Belief, CostModel, ItemEstimate, Rank, DEFAULT_MEAN, DEFAULT_STDEV, NUM_BINS};
pub use ports::{MemoryStore, VenueStore};
