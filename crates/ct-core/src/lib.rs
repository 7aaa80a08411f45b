//! ct-core - Core library for comments-tree
//!
//! This crate provides the threaded comment engine: materialized path
//! encoding, the node store, depth-limited insertion, the association index
//! binding content objects to tree roots, and tree reconstruction.

pub mod error;
pub mod types;
pub mod config;
pub mod path;
pub mod comment;
pub mod store;
pub mod limiter;
pub mod tree;

pub use error::{Result, TreeError};
pub use types::*;
pub use tree::TreeManager;
