use serde::{Deserialize, Serialize};

/// Discretisation granularity of the quality scale.
pub const NUM_BINS: usize = 2001;

/// Prior mean, at the middle of the bin range (integer bin arithmetic, so
/// 1000 for 2001 bins — the scale stored submissions use).
pub const DEFAULT_MEAN: f64 = (NUM_BINS / 2) as f64;

/// Prior standard deviation, an eighth of the bin range (250 for 2001 bins).
pub const DEFAULT_STDEV: f64 = (NUM_BINS / 8) as f64;

/// Gaussian belief over an item's latent quality on the `[0, NUM_BINS)`
/// scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub mean: f64,
    pub stdev: f64,
}

impl Belief {
    pub fn new(mean: f64, stdev: f64) -> Self {
        Self { mean, stdev }
    }

    /// The default prior assigned to items that have never been ranked.
    pub fn prior() -> Self {
        Self { mean: DEFAULT_MEAN, stdev: DEFAULT_STDEV }
    }

    /// Builds a belief from stored columns, falling back to the prior when
    /// either column is missing or the stored width is unusable.
    pub fn from_stored(mean: Option<f64>, stdev: Option<f64>) -> Self {
        match (mean, stdev) {
            (Some(mean), Some(stdev)) if stdev > 0.0 => Self { mean, stdev },
            _ => Self::prior(),
        }
    }
}

impl Default for Belief {
    fn default() -> Self {
        Self::prior()
    }
}
