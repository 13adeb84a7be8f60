//! Engine entry points.
//!
//! [`RankingEngine`] wires the quality model to a [`VenueStore`]: task
//! sampling, comparison processing, reviewer accuracy scoring, the
//! reputation fixed point and final grades. Every entry point is a
//! self-contained pass — state is reconstructed from stored means and
//! standard deviations (or defaults) on each invocation, and the only
//! suspension points are port calls.

mod accuracy;
mod grades;
mod processor;
mod reputation;
mod sampler;

pub use accuracy::AccuracyScope;
pub use grades::final_grades;
pub use reputation::{ReputationParams, UNKNOWN_REVIEWER_RANK};
pub use sampler::TaskOptions;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::RankerConfig;
use crate::ports::VenueStore;

pub struct RankingEngine<S> {
    store: S,
    config: RankerConfig,
}

impl<S: VenueStore> RankingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store, config: RankerConfig::default() }
    }

    pub fn with_config(store: S, config: RankerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
