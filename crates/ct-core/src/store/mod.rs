//! Tree node storage
//!
//! The storage seam of the engine. A store keeps nodes indexed by their
//! materialized path so that subtree reads are single range scans, and keeps
//! associations under a uniqueness constraint on (content type, object id,
//! site).

mod memory;
mod persistence;
mod state;

pub use memory::MemoryStore;
pub use persistence::TreeStore;
pub use state::TreeState;
