//! comments-tree - threaded comment trees CLI
//!
//! Drives the comment tree engine against a file-backed store.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default configuration
//! comments-tree config init
//!
//! # Comment on an object, then reply
//! comments-tree post "First!" --on blog.article --object 1
//! comments-tree post "Welcome" --parent 2
//!
//! # Print the thread
//! comments-tree tree blog.article 1
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
