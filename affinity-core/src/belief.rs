//! Affinity Store: per-user belief weights.
//!
//! Every mutating call is a full read-modify-write of the user's belief
//! record: load, run a decay pass over *all* beliefs, apply reinforcements,
//! write the whole map back. Queries return the last persisted weights; they
//! do not re-decay (see [`BeliefStore::effective_weights`] for that).

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::clock::{Clock, epoch_seconds};
use crate::config::BeliefConfig;
use crate::decay::{self, DecayReport};
use crate::error::Result;
use crate::persistence::Storage;
use crate::types::{AffinityMap, Belief, Emotion, UserId};

/// One user's belief weights.
#[derive(Debug, Clone)]
pub struct BeliefStore {
    user: UserId,
    storage: Arc<dyn Storage>,
    config: BeliefConfig,
    clock: Arc<dyn Clock>,
}

impl BeliefStore {
    /// Open the store for `user`, creating an empty record on first use.
    ///
    /// # Errors
    /// Returns [`crate::AffinityError::Corrupt`] if the existing record is
    /// unparseable, or a storage error if it cannot be read.
    pub fn open(
        user: UserId,
        storage: Arc<dyn Storage>,
        config: BeliefConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let existing = storage.load_beliefs(&user)?;
        debug!(user = %user, beliefs = existing.len(), "Belief store opened");
        Ok(Self {
            user,
            storage,
            config,
            clock,
        })
    }

    /// Decay every belief, then add the emotion's multiplier to each tag.
    ///
    /// Duplicate tags are applied independently. Blank tags are skipped.
    /// With no tags the decay pass still runs and is persisted.
    ///
    /// # Errors
    /// Fails without writing if the stored record cannot be read or parsed.
    pub fn reinforce<S: AsRef<str>>(&self, tags: &[S], emotion: Emotion) -> Result<DecayReport> {
        let now = epoch_seconds(self.clock.now());
        let mut beliefs = self.storage.load_beliefs(&self.user)?;

        let mut report = decay::decay_pass(&mut beliefs, now, &self.config);

        let amount = self.config.multiplier(emotion);
        for tag in tags {
            let tag: &str = tag.as_ref();
            if tag.trim().is_empty() {
                continue;
            }
            match beliefs.get_mut(tag) {
                Some(belief) => {
                    belief.weight += amount;
                    belief.last_reinforced = now;
                }
                None => {
                    beliefs.insert(tag.to_string(), Belief::new(amount, now));
                    report.created += 1;
                }
            }
            report.reinforced += 1;
        }

        self.storage.save_beliefs(&self.user, &beliefs)?;

        if !report.pruned.is_empty() {
            debug!(user = %self.user, pruned = ?report.pruned, "Pruned decayed beliefs");
        }
        debug!(
            user = %self.user,
            emotion = %emotion,
            decayed = report.decayed,
            reinforced = report.reinforced,
            created = report.created,
            "Reinforced beliefs"
        );
        Ok(report)
    }

    /// [`reinforce`](Self::reinforce) with a free-form emotion label;
    /// unrecognized labels count as neutral.
    ///
    /// # Errors
    /// Same as [`reinforce`](Self::reinforce).
    pub fn reinforce_label<S: AsRef<str>>(&self, tags: &[S], label: &str) -> Result<DecayReport> {
        self.reinforce(tags, Emotion::from_label(label))
    }

    /// Up to `n` `(tag, weight)` pairs, heaviest first, weights rounded to
    /// two decimals. Equal weights are ordered by tag name.
    ///
    /// # Errors
    /// Returns a storage error if the record cannot be read.
    pub fn top(&self, n: usize) -> Result<Vec<(String, f64)>> {
        let beliefs = self.storage.load_beliefs(&self.user)?;
        let mut ranked: Vec<(String, f64)> = beliefs
            .into_iter()
            .map(|(tag, belief)| (tag, belief.weight))
            .collect();
        ranked.sort_by_key(|(_, weight)| Reverse(OrderedFloat(*weight)));
        ranked.truncate(n);
        for (_, weight) in &mut ranked {
            *weight = decay::round2(*weight);
        }
        Ok(ranked)
    }

    /// Every tag with its last persisted weight, rounded to two decimals.
    ///
    /// # Errors
    /// Returns a storage error if the record cannot be read.
    pub fn all(&self) -> Result<BTreeMap<String, f64>> {
        let beliefs = self.storage.load_beliefs(&self.user)?;
        Ok(beliefs
            .into_iter()
            .map(|(tag, belief)| (tag, decay::round2(belief.weight)))
            .collect())
    }

    /// Weights decayed to the current instant, rounded to two decimals.
    ///
    /// Read-only: nothing is pruned or written, so a belief below the prune
    /// threshold still shows here until the next reinforcement removes it.
    ///
    /// # Errors
    /// Returns a storage error if the record cannot be read.
    pub fn effective_weights(&self) -> Result<BTreeMap<String, f64>> {
        let now = epoch_seconds(self.clock.now());
        let beliefs = self.storage.load_beliefs(&self.user)?;
        Ok(beliefs
            .into_iter()
            .map(|(tag, belief)| {
                let elapsed = decay::elapsed_seconds(now, belief.last_reinforced);
                let weight = decay::decay_weight(belief.weight, self.config.decay_rate, elapsed);
                (tag, decay::round2(weight))
            })
            .collect())
    }

    /// Raw persisted map, unrounded.
    ///
    /// # Errors
    /// Returns a storage error if the record cannot be read.
    pub fn snapshot(&self) -> Result<AffinityMap> {
        self.storage.load_beliefs(&self.user)
    }

    /// Forget every belief.
    ///
    /// # Errors
    /// Returns a storage error if the empty map cannot be written.
    pub fn reset(&self) -> Result<()> {
        self.storage.save_beliefs(&self.user, &AffinityMap::new())?;
        debug!(user = %self.user, "Beliefs reset");
        Ok(())
    }

    /// Decay per elapsed second.
    #[must_use]
    pub fn decay_rate(&self) -> f64 {
        self.config.decay_rate
    }

    /// Owner of this store.
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }
}
