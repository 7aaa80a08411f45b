//! Tree command
//!
//! Print the comment tree of one content object.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ct_core::tree::{FlatTree, NestedComment};
use ct_core::SiteId;

use super::context::{content_key, GlobalOpts};

/// Arguments for the tree command
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Content type as app.model
    pub content_type: String,

    /// Object id
    pub object_id: u64,

    /// Site id (default: configured site)
    #[arg(long)]
    pub site: Option<u32>,

    /// Flat list with parent ids instead of nesting
    #[arg(long)]
    pub flat: bool,

    /// Include unpublished and removed comments
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the tree command
pub fn execute(args: TreeArgs, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;
    let key = content_key(&args.content_type, args.object_id)?;
    let site = args.site.map(SiteId);

    let Some(root) = manager.get_root(&key, site)? else {
        if args.json && args.flat {
            println!("{}", serde_json::to_string_pretty(&FlatTree::default())?);
        } else if args.json {
            println!("[]");
        } else {
            println!("No comments on {}.", key);
        }
        return Ok(());
    };

    if args.flat {
        let flat = manager.flat_tree_for(&root, !args.all)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&flat)?);
        } else {
            print_flat(&flat);
        }
    } else {
        let tree = manager.nested_tree(&root, !args.all, None)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        } else if tree.is_empty() {
            println!("No comments on {}.", key);
        } else {
            for comment in &tree {
                print_nested(comment, 0);
            }
        }
    }

    Ok(())
}

fn status_marker(is_public: bool, is_removed: bool) -> String {
    if is_removed {
        " [removed]".red().to_string()
    } else if !is_public {
        " [pending]".yellow().to_string()
    } else {
        String::new()
    }
}

fn print_nested(node: &NestedComment, indent: usize) {
    let comment = &node.comment;
    println!(
        "{}{} {}{}",
        "  ".repeat(indent),
        format!("#{}", comment.id).cyan(),
        comment.comment(),
        status_marker(comment.is_public(), comment.is_removed())
    );
    for child in &node.children {
        print_nested(child, indent + 1);
    }
}

fn print_flat(flat: &FlatTree) {
    for comment in &flat.comments {
        let parent = comment
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} level={} parent={} {}{}",
            format!("#{}", comment.id).cyan(),
            comment.level,
            parent.dimmed(),
            comment.comment,
            status_marker(comment.is_public, comment.is_removed)
        );
    }
}
