pub mod model;
pub mod pick;
pub mod pool;
pub mod engine;

pub mod import;
pub mod store;
pub mod gate;
pub mod logging;
pub mod session;

pub use model::entity::{Entry, Id};
pub use model::roster::{Roster, RosterError};
pub use model::policy::{Policy, WeightRule};
pub use model::history::History;
pub use pick::{Pick, SelectError, Selection};
pub use pool::{Candidate, CandidatePool, Frequency};
pub use engine::Selector;
pub use import::{column_label, parse_table, parse_text, placeholder_id, ColumnMapping, ImportError, TableOptions};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use gate::{Gate, Quota, FREE_SELECTIONS};
pub use session::{run_pick, PickError};
