//! Fixtures shared by the affinity benchmarks.

use std::sync::Arc;

use affinity_core::config::{BeliefConfig, PersistenceConfig};
use affinity_core::{AffinityMap, Belief, BeliefStore, ManualClock, SqliteStorage, UserId};

/// Epoch second every fixture clock starts at.
pub const T0: i64 = 1_700_000_000;

/// Sample responses covering all three emotion labels and every default tag.
pub const RESPONSES: &[&str] = &[
    "I trust you fully and I am really happy we work together",
    "Discipline is not easy but it builds a legacy",
    "That was a terrible, awful day with no purpose",
    "Independence matters to me",
    "The meeting is at noon",
    "What a wonderful sense of shared purpose",
];

/// Belief map of `n` tags with spread weights, all reinforced at `T0`.
#[must_use]
pub fn belief_map(n: usize) -> AffinityMap {
    (0..n)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let weight = 0.5 + (i % 17) as f64 * 0.25;
            (format!("tag_{i:04}"), Belief::new(weight, T0 as f64))
        })
        .collect()
}

/// Belief store over a fresh in-memory database, plus its clock.
///
/// # Panics
/// Panics if the in-memory database cannot be opened.
#[must_use]
pub fn in_memory_store() -> (BeliefStore, ManualClock) {
    let storage = Arc::new(
        SqliteStorage::open_in_memory(&PersistenceConfig::default())
            .expect("in-memory database"),
    );
    let clock = ManualClock::at_epoch_secs(T0);
    let store = BeliefStore::open(
        UserId::new("bench"),
        storage,
        BeliefConfig::default(),
        Arc::new(clock.clone()),
    )
    .expect("belief store");
    (store, clock)
}
