//! Comment tree engine
//!
//! `TreeManager` drives everything: depth-limited insertion, the association
//! index mapping content objects to roots, tree reconstruction, cross-object
//! queries and moderation hooks.

mod aggregate;
mod association;
mod manager;
mod moderation;
mod reconstruct;

pub use manager::TreeManager;
pub use reconstruct::{flat_structured_tree, FlatTree, NestedComment, ReconstructedNode};
