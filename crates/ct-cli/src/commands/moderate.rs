//! Moderation commands
//!
//! Flag, remove, restore and edit comments, and list the moderation queue.

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use ct_core::comment::CommentFlag;
use ct_core::NodeId;

use super::context::GlobalOpts;

/// Moderation subcommands
#[derive(Debug, Subcommand)]
pub enum ModerateCommand {
    /// Raise a flag on a comment
    Flag {
        /// Comment id
        id: u64,

        /// approve, delete, suggest-removal, like or dislike
        flag: String,

        /// Name of the flagging user
        #[arg(long, default_value = "moderator")]
        user: String,
    },

    /// List the users who raised a flag on a comment
    Flags {
        /// Comment id
        id: u64,

        /// approve, delete, suggest-removal, like or dislike
        flag: String,
    },

    /// Soft-remove a comment
    Remove {
        /// Comment id
        id: u64,

        /// Restore a removed comment instead
        #[arg(long)]
        restore: bool,
    },

    /// Replace a comment's text
    Edit {
        /// Comment id
        id: u64,

        /// New text
        content: String,
    },

    /// Unpublish every direct reply to a comment
    Unpublish {
        /// Comment id
        id: u64,
    },

    /// List comments waiting for approval
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute a moderation command
pub fn execute(cmd: ModerateCommand, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;

    match cmd {
        ModerateCommand::Flag { id, flag, user } => {
            let flag = parse_flag(&flag)?;
            let node = manager
                .get(NodeId(id))
                .with_context(|| format!("Failed to load comment {}", id))?;
            let changed = manager.on_comment_flagged(&node, &user, flag)?;
            println!(
                "{} Flagged {} as {} ({} changed)",
                "✓".green(),
                id,
                flag.to_string().cyan(),
                changed
            );
        }
        ModerateCommand::Flags { id, flag } => {
            let flag = parse_flag(&flag)?;
            let node = manager
                .get(NodeId(id))
                .with_context(|| format!("Failed to load comment {}", id))?;
            let users = manager.users_flagging(&node, flag)?;
            println!(
                "{} on comment {}: {}",
                flag.to_string().cyan(),
                id,
                manager.flag_count(&node, flag)?
            );
            for user in users {
                println!("  {}", user);
            }
        }
        ModerateCommand::Remove { id, restore } => {
            manager.set_removed(NodeId(id), !restore)?;
            let action = if restore { "Restored" } else { "Removed" };
            println!("{} {} comment {}", "✓".green(), action, id);
        }
        ModerateCommand::Edit { id, content } => {
            manager.update_comment(NodeId(id), content, None)?;
            println!("{} Updated comment {}", "✓".green(), id);
        }
        ModerateCommand::Unpublish { id } => {
            let node = manager
                .get(NodeId(id))
                .with_context(|| format!("Failed to load comment {}", id))?;
            let changed = manager.unpublish_children(&node)?;
            println!("{} Unpublished {} replies", "✓".green(), changed);
        }
        ModerateCommand::Pending { json } => {
            let pending = manager.in_moderation()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else if pending.is_empty() {
                println!("Nothing to moderate.");
            } else {
                for comment in &pending {
                    println!("{} {}", format!("#{}", comment.id).cyan(), comment.comment());
                }
            }
        }
    }

    Ok(())
}

fn parse_flag(flag: &str) -> Result<CommentFlag> {
    CommentFlag::from_str_opt(flag).ok_or_else(|| anyhow!("Unknown flag '{}'", flag))
}
