//! Usage quota for unprivileged callers.
//!
//! The gate sits in front of the engine; the engine never consults it. State
//! is stored as plain JSON and offers no tamper resistance.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{self, keys, Store, StoreError};

pub const FREE_SELECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub allowed: bool,
    /// `None` when privileged, i.e. unlimited.
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Privilege {
    #[serde(rename = "isMember")]
    granted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gate {
    used: u32,
    privileged: bool,
}

impl Gate {
    pub fn new(used: u32, privileged: bool) -> Gate {
        Gate { used, privileged }
    }

    pub fn load<S: Store + ?Sized>(store: &S) -> Gate {
        let used = store::load(store, keys::USAGE, 0);
        let privilege: Privilege = store::load(store, keys::PRIVILEGE, Privilege::default());
        Gate { used, privileged: privilege.granted }
    }

    pub fn save<S: Store + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        store::save(store, keys::USAGE, &self.used)?;
        store::save(store, keys::PRIVILEGE, &Privilege { granted: self.privileged })
    }

    pub fn check_quota(&self) -> Quota {
        if self.privileged {
            return Quota { allowed: true, remaining: None };
        }
        let remaining = FREE_SELECTIONS.saturating_sub(self.used);
        Quota { allowed: remaining > 0, remaining: Some(remaining) }
    }

    /// Counts one invocation. Privileged use is not counted.
    pub fn record_usage(&mut self) {
        if !self.privileged {
            self.used = self.used.saturating_add(1);
        }
    }

    /// Called once an external verification step has succeeded.
    pub fn grant_privilege(&mut self) {
        info!(used = self.used, "privilege granted");
        self.privileged = true;
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}
