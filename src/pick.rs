use std::ops::Add;

use itertools::Itertools;
use thiserror::Error;

use crate::model::entity::{Entry, Id};

/// A filled slot and the reason it was filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    /// Taken from the always-include list.
    Forced(Entry),
    /// Sampled from the candidate pool.
    Drawn(Entry),
    /// Sampled after the pool ran dry and was refilled from every eligible entry.
    Recycled(Entry),
}

impl Pick {
    pub fn entry(&self) -> &Entry {
        match self {
            Pick::Forced(entry) | Pick::Drawn(entry) | Pick::Recycled(entry) => entry,
        }
    }

    pub fn into_entry(self) -> Entry {
        match self {
            Pick::Forced(entry) | Pick::Drawn(entry) | Pick::Recycled(entry) => entry,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, Pick::Forced(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectError {
    #[error("selection count must be at least 1, got {0}")]
    InvalidCount(usize),
}

/// Outcome of one selection. Empty when nothing was eligible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    picks: Vec<Pick>,
}

impl Selection {
    pub fn empty() -> Selection {
        Selection::default()
    }

    pub fn push(&mut self, pick: Pick) {
        self.picks.push(pick);
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.picks.iter().map(Pick::entry)
    }

    pub fn ids(&self) -> Vec<&Id> {
        self.entries().map(|entry| &entry.id).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().any(|entry| entry.id == id)
    }

    pub fn names(&self) -> String {
        self.entries().map(|entry| entry.name.as_str()).join(", ")
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.picks.into_iter().map(Pick::into_entry).collect()
    }
}

impl FromIterator<Pick> for Selection {
    fn from_iter<I: IntoIterator<Item = Pick>>(iter: I) -> Self {
        Selection { picks: iter.into_iter().collect() }
    }
}

/// Concatenates slots, left side first.
impl Add for Selection {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.picks.into_iter().chain(rhs.picks).collect()
    }
}
