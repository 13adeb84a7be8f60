//! Quality model: Gaussian beliefs over discretised quality, the listwise
//! Bayesian ranker and the sampling cost model.

pub mod belief;
pub mod cost;
pub mod histogram;
pub mod rank;

pub use belief::{Belief, DEFAULT_MEAN, DEFAULT_STDEV, NUM_BINS};
pub use cost::CostModel;
pub use rank::{ItemEstimate, Rank};
