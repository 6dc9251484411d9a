use std::collections::{HashMap, HashSet};

use crate::model::entity::{Entry, Id};
use crate::model::history::History;
use crate::model::policy::Policy;
use crate::model::roster::Roster;


/// How many times each id appears in a history.
#[derive(Debug, Clone, Default)]
pub struct Frequency(HashMap<Id, usize>);

impl Frequency {
    pub fn get(&self, id: &str) -> usize {
        self.0.get(id).copied().unwrap_or(0)
    }
}

impl From<&History> for Frequency {
    fn from(history: &History) -> Self {
        let mut counter = HashMap::new();
        for entry in history.iter() {
            *counter.entry(entry.id.clone()).or_insert(0) += 1;
        }
        Frequency(counter)
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entry: Entry,
    /// Copies in the weighted multiset.
    pub copies: u32,
    /// Appearances in history; only counted when repeat avoidance is active.
    pub past: usize,
}

impl Candidate {
    /// Relative chance of being drawn: copies, damped by `1 / (1 + past)`.
    pub fn odds(&self) -> f64 {
        self.copies as f64 / (1.0 + self.past as f64)
    }
}


/// The entries eligible for random sampling under one policy.
///
/// `eligible` is the roster minus excluded ids, in draw order. `weighted` holds
/// the drawable candidates: entries with zero copies are absent, unless every
/// eligible entry has zero copies, in which case all of them get one copy.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    eligible: Vec<Candidate>,
    weighted: Vec<Candidate>,
}

impl CandidatePool {
    pub fn build(roster: &Roster, policy: &Policy, history: &History) -> CandidatePool {
        let avoiding = policy.avoid_repeat && !history.is_empty();
        let frequency = if avoiding { history.frequency() } else { Frequency::default() };

        let mut eligible: Vec<Candidate> = roster.iter()
            .filter(|entry| !policy.is_excluded(&entry.id))
            .map(|entry| Candidate {
                entry: entry.clone(),
                copies: 1,
                past: frequency.get(&entry.id),
            })
            .collect();

        if avoiding {
            // stable: ties keep roster order
            eligible.sort_by_key(|candidate| candidate.past);
        }

        let mut weighted = eligible.clone();
        if policy.has_weights() {
            weighted.iter_mut().for_each(|candidate| candidate.copies = policy.weight_of(&candidate.entry.id));
            weighted.retain(|candidate| candidate.copies > 0);
            if weighted.is_empty() {
                weighted = eligible.clone();
            }
        }

        CandidatePool { eligible, weighted }
    }

    pub fn eligible(&self) -> &[Candidate] {
        &self.eligible
    }

    pub fn weighted(&self) -> &[Candidate] {
        &self.weighted
    }

    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }

    /// Drawable candidates whose id is not in `placed`.
    pub fn without(&self, placed: &HashSet<&str>) -> Vec<Candidate> {
        self.weighted.iter()
            .filter(|candidate| !placed.contains(candidate.entry.id.as_str()))
            .cloned()
            .collect()
    }

    /// Every eligible entry at even odds, for refilling an exhausted pool.
    pub fn replenish(&self) -> Vec<Candidate> {
        self.eligible.iter()
            .map(|candidate| Candidate { copies: 1, past: 0, ..candidate.clone() })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Roster {
        Roster::new(ids.iter().map(|id| Entry::new(*id, id.to_lowercase())).collect()).unwrap()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|candidate| candidate.entry.id.as_str()).collect()
    }

    #[test]
    fn excluded_ids_leave_the_pool() {
        let policy = Policy::default().force_exclude("B");
        let pool = CandidatePool::build(&roster(&["A", "B", "C"]), &policy, &History::new());
        assert_eq!(ids(pool.eligible()), vec!["A", "C"]);
        assert_eq!(ids(pool.weighted()), vec!["A", "C"]);
    }

    #[test]
    fn history_orders_least_picked_first() {
        let history = History::from(vec![
            Entry::new("A", "a"),
            Entry::new("A", "a"),
            Entry::new("C", "c"),
        ]);
        let pool = CandidatePool::build(&roster(&["A", "B", "C", "D"]), &Policy::default(), &history);
        assert_eq!(ids(pool.eligible()), vec!["B", "D", "C", "A"]);
        assert_eq!(pool.eligible()[3].past, 2);
        assert!((pool.eligible()[3].odds() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn history_is_ignored_without_avoid_repeat() {
        let history = History::from(vec![Entry::new("A", "a")]);
        let policy = Policy::default().with_avoid_repeat(false);
        let pool = CandidatePool::build(&roster(&["A", "B"]), &policy, &history);
        assert_eq!(ids(pool.eligible()), vec!["A", "B"]);
        assert_eq!(pool.eligible()[0].past, 0);
    }

    #[test]
    fn zero_weight_drops_from_weighted_pool() {
        let policy = Policy::default().with_weight("A", 0).with_weight("B", 3);
        let pool = CandidatePool::build(&roster(&["A", "B", "C"]), &policy, &History::new());
        assert_eq!(ids(pool.weighted()), vec!["B", "C"]);
        assert_eq!(pool.weighted()[0].copies, 3);
        assert_eq!(pool.weighted()[1].copies, 1);
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let policy = Policy::default().with_weight("A", 0).with_weight("B", 0);
        let pool = CandidatePool::build(&roster(&["A", "B"]), &policy, &History::new());
        assert_eq!(ids(pool.weighted()), vec!["A", "B"]);
        assert!(pool.weighted().iter().all(|candidate| candidate.copies == 1));
    }

    #[test]
    fn without_skips_placed_ids() {
        let pool = CandidatePool::build(&roster(&["A", "B", "C"]), &Policy::default(), &History::new());
        let placed: HashSet<&str> = ["B"].into_iter().collect();
        assert_eq!(ids(&pool.without(&placed)), vec!["A", "C"]);
    }
}
