//! Score fusion: semantic + exact relevance, recency, and level boost.
//!
//! Grounded on the teacher's `search/ranking.rs` `RankingWeights` /
//! `calculate_recency_score` shape, adapted to this spec's fusion formula
//! and half-life.

use crate::error::{Error, Result};
use crate::hierarchy::Level;

/// Combination weights for [`combine`]. Defaults match spec.md §4.4.4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    /// Weight on the relevance term (`w_semantic·semantic + w_exact·exact`).
    pub w_relevance: f64,
    /// Weight on the recency term.
    pub w_recency: f64,
    /// Weight on the level-boost term.
    pub w_level: f64,
    /// Weight on semantic similarity within the relevance term.
    pub w_semantic: f64,
    /// Weight on exact/lexical match within the relevance term.
    pub w_exact: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            w_relevance: 0.6,
            w_recency: 0.3,
            w_level: 0.1,
            w_semantic: 0.5,
            w_exact: 0.5,
        }
    }
}

impl RankingWeights {
    /// Checks that `w_relevance + w_recency + w_level` is close to 1.0.
    /// Not enforced by the engine (per spec); callers may log and proceed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArg`] if the weights sum more than `0.05`
    /// away from 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.w_relevance + self.w_recency + self.w_level;
        if (sum - 1.0).abs() > 0.05 {
            return Err(Error::InvalidArg(format!(
                "ranking weights sum to {sum:.3}, expected ~1.0"
            )));
        }
        Ok(())
    }
}

/// Exponential recency decay: `exp(-ln2 * age_ms / half_life_ms)`, capped
/// at 1.0 for timestamps in the future.
#[must_use]
pub fn recency_score(created_at_ns: u64, now_ns: u64, half_life_ms: f64) -> f64 {
    if created_at_ns >= now_ns {
        return 1.0;
    }
    let age_ms = (now_ns - created_at_ns) as f64 / 1_000_000.0;
    (-std::f64::consts::LN_2 * age_ms / half_life_ms).exp().min(1.0)
}

/// Static per-level boost used in the fusion formula.
#[must_use]
pub fn level_boost(level: Level) -> f64 {
    match level {
        Level::Session => 1.0,
        Level::Message => 0.9,
        Level::Block => 0.8,
        Level::Statement => 0.7,
    }
}

/// Replace NaN/Inf with 0 so a response is always JSON-safe.
#[must_use]
pub fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Combine partial scores into a single ranking score.
#[must_use]
pub fn combine(semantic: f64, exact: f64, recency: f64, level_boost: f64, weights: &RankingWeights) -> f64 {
    let semantic = sanitize(semantic);
    let exact = sanitize(exact);
    let recency = sanitize(recency);
    let level_boost = sanitize(level_boost);
    let relevance = weights.w_semantic * semantic + weights.w_exact * exact;
    weights.w_relevance * relevance + weights.w_recency * recency + weights.w_level * level_boost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!(RankingWeights::default().validate().is_ok());
    }

    #[test]
    fn skewed_weights_fail_validation() {
        let weights = RankingWeights {
            w_relevance: 0.1,
            w_recency: 0.1,
            w_level: 0.1,
            ..RankingWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn recency_caps_future_timestamps_at_one() {
        assert_eq!(recency_score(2_000_000_000, 1_000_000_000, 3_600_000.0), 1.0);
    }

    #[test]
    fn recency_decays_with_age() {
        let half_life_ms = 3_600_000.0;
        let now = 10_000_000_000_000u64;
        let fresh = recency_score(now, now, half_life_ms);
        let one_half_life_old = recency_score(now - (half_life_ms as u64) * 1_000_000, now, half_life_ms);
        assert!(fresh > one_half_life_old);
        assert!((one_half_life_old - 0.5).abs() < 0.01);
    }

    #[test]
    fn sanitize_coerces_non_finite_to_zero() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(0.42), 0.42);
    }

    #[test]
    fn combine_is_bounded_with_default_weights() {
        let weights = RankingWeights::default();
        let score = combine(1.0, 1.0, 1.0, 1.0, &weights);
        assert!(score <= 1.1);
        assert!(score >= 0.0);
    }
}
