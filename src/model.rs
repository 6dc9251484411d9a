pub mod entity {
    use serde::{Deserialize, Serialize};

    pub type Id = String;

    /// One selectable person. Identity is the `id`; `name` is for display only.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Entry {
        pub id: Id,
        pub name: String,
    }

    impl Entry {
        pub fn new(id: impl Into<Id>, name: impl Into<String>) -> Entry {
            Entry { id: id.into(), name: name.into() }
        }
    }
}


pub mod roster {
    use std::collections::HashSet;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use super::entity::{Entry, Id};

    #[derive(Debug, Clone, Error, PartialEq)]
    pub enum RosterError {
        #[error("entry `{0}` has an empty id")]
        EmptyId(String),
        #[error("duplicate entry id `{0}`")]
        DuplicateId(Id),
    }

    /// Ordered entries with unique, non-empty ids. Replaced wholesale on re-import.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(try_from = "Vec<Entry>", into = "Vec<Entry>")]
    pub struct Roster {
        entries: Vec<Entry>,
    }

    impl Roster {
        pub fn new(entries: Vec<Entry>) -> Result<Roster, RosterError> {
            {
                let mut seen = HashSet::new();
                for entry in &entries {
                    if entry.id.is_empty() {
                        return Err(RosterError::EmptyId(entry.name.clone()));
                    }
                    if !seen.insert(entry.id.as_str()) {
                        return Err(RosterError::DuplicateId(entry.id.clone()));
                    }
                }
            }
            Ok(Roster { entries })
        }

        pub fn get(&self, id: &str) -> Option<&Entry> {
            self.entries.iter().find(|entry| entry.id == id)
        }

        pub fn contains(&self, id: &str) -> bool {
            self.get(id).is_some()
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = &Entry> {
            self.entries.iter()
        }
    }

    impl TryFrom<Vec<Entry>> for Roster {
        type Error = RosterError;

        fn try_from(entries: Vec<Entry>) -> Result<Self, Self::Error> {
            Roster::new(entries)
        }
    }

    impl From<Roster> for Vec<Entry> {
        fn from(roster: Roster) -> Self {
            roster.entries
        }
    }
}


pub mod policy {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use super::entity::Id;
    use crate::pick::SelectError;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WeightRule {
        #[serde(alias = "studentId")]
        pub entry_id: Id,
        pub weight: u32,
    }

    /// Configuration for one selection. Values are never edited in place by the
    /// engine; the `with_*` and `force_*` helpers return a new policy.
    ///
    /// Deserialization accepts the field names written by older settings files
    /// and fills anything missing with its default.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct Policy {
        pub selection_count: usize,
        pub avoid_repeat: bool,
        #[serde(alias = "studentWeights")]
        pub weights: Vec<WeightRule>,
        #[serde(alias = "alwaysSelectStudents")]
        pub always_include: Vec<Id>,
        #[serde(alias = "neverSelectStudents")]
        pub never_include: BTreeSet<Id>,
    }

    impl Default for Policy {
        fn default() -> Self {
            Policy {
                selection_count: 1,
                avoid_repeat: true,
                weights: Vec::new(),
                always_include: Vec::new(),
                never_include: BTreeSet::new(),
            }
        }
    }

    impl Policy {
        pub fn validate(&self) -> Result<(), SelectError> {
            if self.selection_count < 1 {
                return Err(SelectError::InvalidCount(self.selection_count));
            }
            Ok(())
        }

        pub fn has_weights(&self) -> bool {
            !self.weights.is_empty()
        }

        /// Weight for `id`; 1 when no rule names it. Repeated rules for one id add
        /// up, saturating at `u32::MAX`.
        pub fn weight_of(&self, id: &str) -> u32 {
            let mut rules = self.weights.iter().filter(|rule| rule.entry_id == id).peekable();
            if rules.peek().is_none() {
                return 1;
            }
            rules.fold(0u32, |total, rule| total.saturating_add(rule.weight))
        }

        pub fn is_excluded(&self, id: &str) -> bool {
            self.never_include.contains(id)
        }

        pub fn with_selection_count(self, selection_count: usize) -> Policy {
            Policy { selection_count, ..self }
        }

        pub fn with_avoid_repeat(self, avoid_repeat: bool) -> Policy {
            Policy { avoid_repeat, ..self }
        }

        /// Replaces every rule for `id` with a single rule of `weight`.
        pub fn with_weight(mut self, id: impl Into<Id>, weight: u32) -> Policy {
            let entry_id = id.into();
            match self.weights.iter().position(|rule| rule.entry_id == entry_id) {
                Some(index) => {
                    self.weights[index].weight = weight;
                    let mut seen = false;
                    self.weights.retain(|rule| {
                        if rule.entry_id != entry_id {
                            return true;
                        }
                        let keep = !seen;
                        seen = true;
                        keep
                    });
                }
                None => self.weights.push(WeightRule { entry_id, weight }),
            }
            self
        }

        /// Appends `id` to the forced list and drops it from the excluded set.
        pub fn force_include(mut self, id: impl Into<Id>) -> Policy {
            let id = id.into();
            self.never_include.remove(&id);
            if !self.always_include.contains(&id) {
                self.always_include.push(id);
            }
            self
        }

        /// Excludes `id` and drops it from the forced list.
        pub fn force_exclude(mut self, id: impl Into<Id>) -> Policy {
            let id = id.into();
            self.always_include.retain(|forced| *forced != id);
            self.never_include.insert(id);
            self
        }

        /// Removes `id` from both the forced list and the excluded set.
        pub fn release(mut self, id: &str) -> Policy {
            self.always_include.retain(|forced| forced != id);
            self.never_include.remove(id);
            self
        }
    }
}


pub mod history {
    use serde::{Deserialize, Serialize};

    use super::entity::Entry;
    use crate::pick::Selection;
    use crate::pool::Frequency;

    /// Past results, most recent first. Grows only through `commit`.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct History {
        entries: Vec<Entry>,
    }

    impl History {
        pub fn new() -> History {
            History::default()
        }

        /// Prepends the selection, keeping its slot order.
        pub fn commit(&mut self, selection: &Selection) {
            self.entries.splice(0..0, selection.entries().cloned());
        }

        pub fn clear(&mut self) {
            self.entries.clear();
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = &Entry> {
            self.entries.iter()
        }

        /// Appearances per id.
        pub fn frequency(&self) -> Frequency {
            Frequency::from(self)
        }
    }

    impl From<Vec<Entry>> for History {
        fn from(entries: Vec<Entry>) -> Self {
            History { entries }
        }
    }
}
