//! Compound Decay: Belief Weight Model
//!
//! A belief's effective weight at time `now` is:
//!   W(now) = W × (1 - r)^t
//!
//! Where:
//!   W = weight as of the last decay pass or reinforcement
//!   r = decay rate per elapsed second (default 0.01)
//!   t = now - last_reinforced, in seconds, clamped to ≥ 0
//!
//! Decay is lazy: nothing runs on a timer. A decay pass materializes W(now)
//! for every belief, keeps `last_reinforced` untouched, and prunes beliefs
//! whose decayed weight fell below the prune threshold. Pruning is terminal.

use crate::config::BeliefConfig;
use crate::types::AffinityMap;

/// Outcome of one decay pass plus the reinforcement that followed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayReport {
    /// Beliefs that survived the pass with a re-materialized weight.
    pub decayed: usize,
    /// Tags removed because they fell below the threshold, in tag order.
    pub pruned: Vec<String>,
    /// Reinforcements applied after the pass (duplicates count separately).
    pub reinforced: usize,
    /// Beliefs created by those reinforcements.
    pub created: usize,
}

/// Seconds between `last_reinforced` and `now`, never negative.
///
/// A clock that moved backwards must not grow a weight, so negative spans
/// count as zero.
#[must_use]
pub fn elapsed_seconds(now: f64, last_reinforced: f64) -> f64 {
    (now - last_reinforced).max(0.0)
}

/// Core compound decay: `weight × (1 - rate)^elapsed`.
///
/// Identity at `elapsed == 0`.
#[must_use]
pub fn decay_weight(weight: f64, rate: f64, elapsed: f64) -> f64 {
    if elapsed <= 0.0 {
        return weight;
    }
    weight * (1.0 - rate).powf(elapsed)
}

/// Round to two decimal places for display and query results.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Run a decay pass over every belief in `beliefs`, pruning those below
/// `config.prune_threshold`.
pub fn decay_pass(beliefs: &mut AffinityMap, now: f64, config: &BeliefConfig) -> DecayReport {
    let mut report = DecayReport::default();

    beliefs.retain(|tag, belief| {
        let elapsed = elapsed_seconds(now, belief.last_reinforced);
        let decayed = decay_weight(belief.weight, config.decay_rate, elapsed);
        if decayed < config.prune_threshold {
            report.pruned.push(tag.clone());
            false
        } else {
            belief.weight = decayed;
            report.decayed += 1;
            true
        }
    });

    report
}
