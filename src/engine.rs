//! The selection engine.
//!
//! A call runs these steps in order: drop excluded entries, order the rest by
//! how often they were picked before, weight them, place forced entries, then
//! draw the remaining slots without replacement. When the drawable pool runs
//! out it is refilled from every eligible entry, so a short pool yields repeats
//! instead of empty slots.
//!
//! With `avoid_repeat` on, each candidate's odds are divided by `1 + past`,
//! where `past` counts its appearances in history. Ordering alone would not
//! change the odds of an index-based draw.

use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::model::history::History;
use crate::model::policy::Policy;
use crate::model::roster::Roster;
use crate::pick::{Pick, SelectError, Selection};
use crate::pool::{Candidate, CandidatePool};


pub struct Selector<R = SmallRng> {
    rng: R,
}

impl Selector<SmallRng> {
    pub fn seeded(seed: u64) -> Selector<SmallRng> {
        Selector { rng: SmallRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Selector<SmallRng> {
        Selector { rng: SmallRng::from_entropy() }
    }
}

impl<R: Rng> Selector<R> {
    pub fn new(rng: R) -> Selector<R> {
        Selector { rng }
    }

    /// Computes a selection. Consumes randomness but touches nothing else.
    pub fn select(&mut self, roster: &Roster, policy: &Policy, history: &History) -> Result<Selection, SelectError> {
        policy.validate()?;
        let count = policy.selection_count.min(roster.len());
        let pool = CandidatePool::build(roster, policy, history);
        let forced = forced_picks(roster, policy, count);
        debug!(
            count,
            eligible = pool.eligible().len(),
            drawable = pool.weighted().len(),
            forced = forced.len(),
            "selecting"
        );

        if pool.is_empty() {
            return Ok(forced);
        }

        let placed: HashSet<&str> = forced.entries().map(|entry| entry.id.as_str()).collect();
        let slots = count.saturating_sub(forced.len());
        let drawn = self.fill(&pool, pool.without(&placed), slots);
        Ok(forced + drawn)
    }

    /// Selects and prepends the result to `history`.
    pub fn draw(&mut self, roster: &Roster, policy: &Policy, history: &mut History) -> Result<Selection, SelectError> {
        let selection = self.select(roster, policy, history)?;
        history.commit(&selection);
        Ok(selection)
    }

    fn fill(&mut self, pool: &CandidatePool, mut remaining: Vec<Candidate>, slots: usize) -> Selection {
        let mut selection = Selection::empty();
        let mut recycled = false;
        while selection.len() < slots {
            if remaining.is_empty() {
                remaining = pool.replenish();
                recycled = true;
                trace!(size = remaining.len(), "replenished pool");
            }
            let Some(candidate) = self.take(&mut remaining) else {
                break;
            };
            selection.push(if recycled { Pick::Recycled(candidate.entry) } else { Pick::Drawn(candidate.entry) });
        }
        selection
    }

    /// Removes and returns one candidate, chosen in proportion to its odds.
    fn take(&mut self, remaining: &mut Vec<Candidate>) -> Option<Candidate> {
        let index = match WeightedIndex::new(remaining.iter().map(Candidate::odds)) {
            Ok(distribution) => distribution.sample(&mut self.rng),
            Err(_) if !remaining.is_empty() => self.rng.gen_range(0..remaining.len()),
            Err(_) => return None,
        };
        Some(remaining.remove(index))
    }
}

/// Always-include entries, in list order, capped at `count`. Ids missing from
/// the roster are skipped but still use up their place in the cap.
fn forced_picks(roster: &Roster, policy: &Policy, count: usize) -> Selection {
    policy.always_include.iter()
        .take(count)
        .filter_map(|id| roster.get(id))
        .map(|entry| Pick::Forced(entry.clone()))
        .collect()
}
