//! Post and root commands
//!
//! Create comment roots and post comments.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use ct_core::comment::CommentBuilder;
use ct_core::{NodeId, SiteId};

use super::context::{content_key, GlobalOpts};

/// Arguments for the root command
#[derive(Debug, Args)]
pub struct RootArgs {
    /// Content type as app.model
    pub content_type: String,

    /// Object id
    pub object_id: u64,

    /// Site id (default: configured site)
    #[arg(long)]
    pub site: Option<u32>,
}

/// Arguments for the post command
#[derive(Debug, Args)]
pub struct PostArgs {
    /// Comment text
    pub content: String,

    /// Reply to this comment id
    #[arg(long, conflicts_with_all = ["on", "object"])]
    pub parent: Option<u64>,

    /// Post on an object of this content type (app.model)
    #[arg(long, requires = "object")]
    pub on: Option<String>,

    /// Object id for --on
    #[arg(long, requires = "on")]
    pub object: Option<u64>,

    /// Site id (default: configured site)
    #[arg(long)]
    pub site: Option<u32>,

    /// Author name
    #[arg(long, default_value = "")]
    pub user: String,

    /// Author email
    #[arg(long, default_value = "")]
    pub email: String,

    /// Pre-rendered comment text
    #[arg(long)]
    pub rendered: Option<String>,

    /// Hold the comment for moderation
    #[arg(long)]
    pub private: bool,

    /// Print the created comment as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the root command
pub fn execute_root(args: RootArgs, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;
    let key = content_key(&args.content_type, args.object_id)?;
    let root = manager
        .get_or_create_root(&key, args.site.map(SiteId))
        .with_context(|| format!("Failed to resolve root for {}", key))?;

    println!("{}", root.id);
    Ok(())
}

/// Execute the post command
pub fn execute(args: PostArgs, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;

    let mut builder = CommentBuilder::new()
        .content(args.content)
        .user_name(args.user)
        .user_email(args.email)
        .public(!args.private);
    if let Some(rendered) = args.rendered {
        builder = builder.rendered(rendered);
    }
    let payload = builder.build()?;

    let comment = match (args.parent, args.on, args.object) {
        (Some(parent), _, _) => {
            let parent = manager
                .get(NodeId(parent))
                .with_context(|| format!("Failed to load parent comment {}", parent))?;
            manager.add_child(&parent, payload)?
        }
        (None, Some(label), Some(object_id)) => {
            let key = content_key(&label, object_id)?;
            manager.create_for_object(&key, args.site.map(SiteId), payload)?
        }
        _ => bail!("Either --parent or --on with --object is required"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comment)?);
    } else {
        println!(
            "{} Posted comment {} at level {}",
            "✓".green(),
            comment.id.to_string().cyan(),
            comment.depth - 1
        );
    }
    Ok(())
}
