//! ct-storage - Storage library for comments-tree
//!
//! This crate provides the file-backed tree store.

mod tree_store;

pub use tree_store::{FileSystemStore, CURRENT_SCHEMA_VERSION};
