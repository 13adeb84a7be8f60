//! Sampling cost models.
//!
//! Items sitting at the rank extremes are cheap information but expensive
//! review load; a cost model makes them less likely to be sampled so that
//! mid-rank items keep circulating.

use serde::{Deserialize, Serialize};

/// Review-load cost applied during task sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CostModel {
    /// Every item costs the same.
    None,
    /// Quadratic penalty in the distance from mid-rank, scaled by
    /// `coefficient`: an extreme-ranked item costs `1 + coefficient`, a
    /// mid-ranked item costs 1.
    RankPower { coefficient: f64 },
}

impl CostModel {
    /// Collapses a zero coefficient to `CostModel::None` so the sampling
    /// loop never branches on an inert cost.
    pub fn rank_power(coefficient: f64) -> Self {
        if coefficient == 0.0 {
            CostModel::None
        } else {
            CostModel::RankPower { coefficient }
        }
    }

    /// Penalty divisor for a candidate at rank fraction `r` in `[0, 1]`
    /// (0 = top of the ranking, 1 = bottom).
    pub fn penalty(&self, rank_fraction: f64) -> f64 {
        match *self {
            CostModel::None => 1.0,
            CostModel::RankPower { coefficient } => {
                let d = 2.0 * rank_fraction - 1.0;
                1.0 + coefficient * d * d
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_coefficient_collapses() {
        assert_eq!(CostModel::rank_power(0.0), CostModel::None);
        assert_eq!(
            CostModel::rank_power(2.0),
            CostModel::RankPower { coefficient: 2.0 }
        );
    }

    #[test]
    fn test_penalty_peaks_at_rank_extremes() {
        let cost = CostModel::rank_power(3.0);
        assert!((cost.penalty(0.0) - 4.0).abs() < 1e-12);
        assert!((cost.penalty(1.0) - 4.0).abs() < 1e-12);
        assert!((cost.penalty(0.5) - 1.0).abs() < 1e-12);
        assert!(cost.penalty(0.25) < cost.penalty(0.0));
    }

    #[test]
    fn test_none_is_flat() {
        assert_eq!(CostModel::None.penalty(0.0), 1.0);
        assert_eq!(CostModel::None.penalty(1.0), 1.0);
    }
}
