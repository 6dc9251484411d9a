//! One pick against a store: gate check, selection, history write, usage count.

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::engine::Selector;
use crate::gate::Gate;
use crate::model::history::History;
use crate::model::policy::Policy;
use crate::model::roster::Roster;
use crate::pick::{SelectError, Selection};
use crate::store::{self, keys, Store, StoreError};

#[derive(Debug, Error)]
pub enum PickError {
    #[error("the roster is empty")]
    EmptyRoster,
    #[error("all free picks have been used")]
    QuotaExhausted,
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads roster, policy, history and gate from `store`, picks, then saves.
/// History is written before usage is counted, so a failed history write
/// leaves the quota untouched. `count` overrides the stored selection count.
pub fn run_pick<S, R>(store: &mut S, selector: &mut Selector<R>, count: Option<usize>) -> Result<Selection, PickError>
where
    S: Store + ?Sized,
    R: Rng,
{
    let roster: Roster = store::load(&*store, keys::ROSTER, Roster::default());
    if roster.is_empty() {
        return Err(PickError::EmptyRoster);
    }
    let mut policy: Policy = store::load(&*store, keys::SETTINGS, Policy::default());
    if let Some(count) = count {
        policy = policy.with_selection_count(count);
    }
    let mut history: History = store::load(&*store, keys::HISTORY, History::new());
    let mut gate = Gate::load(&*store);
    if !gate.check_quota().allowed {
        return Err(PickError::QuotaExhausted);
    }

    let selection = selector.draw(&roster, &policy, &mut history)?;
    if !selection.is_empty() {
        store::save(store, keys::HISTORY, &history)?;
    }
    gate.record_usage();
    gate.save(store)?;
    if let Some(remaining) = gate.check_quota().remaining {
        info!(remaining, "free picks left");
    }
    Ok(selection)
}


#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::gate::FREE_SELECTIONS;
    use crate::model::entity::Entry;
    use crate::store::MemoryStore;

    struct ReadOnlyHistory(MemoryStore);

    impl Store for ReadOnlyHistory {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if key == keys::HISTORY {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into());
            }
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let roster = Roster::new(vec![Entry::new("S001", "Ann"), Entry::new("S002", "Bo")]).unwrap();
        store::save(&mut store, keys::ROSTER, &roster).unwrap();
        store
    }

    #[test]
    fn pick_saves_history_and_counts_usage() {
        let mut store = seeded_store();
        let selection = run_pick(&mut store, &mut Selector::seeded(3), Some(2)).unwrap();
        assert_eq!(selection.len(), 2);

        let history: History = store::load(&store, keys::HISTORY, History::new());
        assert_eq!(history.len(), 2);
        assert_eq!(Gate::load(&store).used(), 1);
    }

    #[test]
    fn failed_history_write_does_not_count_usage() {
        let mut store = ReadOnlyHistory(seeded_store());
        let result = run_pick(&mut store, &mut Selector::seeded(3), None);
        assert!(matches!(result, Err(PickError::Store(StoreError::Io(_)))));
        assert_eq!(Gate::load(&store).used(), 0);
    }

    #[test]
    fn exhausted_quota_stops_the_pick() {
        let mut store = seeded_store();
        Gate::new(FREE_SELECTIONS, false).save(&mut store).unwrap();
        let result = run_pick(&mut store, &mut Selector::seeded(3), None);
        assert!(matches!(result, Err(PickError::QuotaExhausted)));
        assert_eq!(store.get(keys::HISTORY).unwrap(), None);
    }

    #[test]
    fn empty_roster_is_reported() {
        let mut store = MemoryStore::new();
        assert!(matches!(run_pick(&mut store, &mut Selector::seeded(0), None), Err(PickError::EmptyRoster)));
    }
}
