//! Comment payloads and tree node model
//!
//! Handles the node model, payload construction, and validation.

pub mod model;
pub mod builder;
pub mod validator;

pub use model::*;
pub use builder::CommentBuilder;
pub use validator::CommentValidator;
