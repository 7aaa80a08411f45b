//! Count and list commands
//!
//! Queries across every object of one or more content types.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ct_core::{ContentType, SiteId};
use std::str::FromStr;

use super::context::GlobalOpts;

/// Arguments shared by count and list
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Content types as app.model
    #[arg(required = true)]
    pub content_types: Vec<String>,

    /// Restrict to one site (default: all sites)
    #[arg(long)]
    pub site: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryArgs {
    fn types(&self) -> Result<Vec<ContentType>> {
        self.content_types
            .iter()
            .map(|label| {
                ContentType::from_str(label)
                    .with_context(|| format!("Invalid content type '{}'", label))
            })
            .collect()
    }
}

/// Execute the count command
pub fn execute_count(args: QueryArgs, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;
    let count = manager.count_for_content_types(&args.types()?, args.site.map(SiteId))?;

    if args.json {
        println!("{}", serde_json::json!({ "count": count }));
    } else {
        println!("{}", count);
    }
    Ok(())
}

/// Execute the list command
pub fn execute_list(args: QueryArgs, opts: &GlobalOpts) -> Result<()> {
    let manager = opts.manager()?;
    let comments = manager.for_content_types(&args.types()?, args.site.map(SiteId))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    for comment in &comments {
        println!(
            "{} {} {}",
            format!("#{}", comment.id).cyan(),
            comment.path.to_string().dimmed(),
            comment.comment()
        );
    }
    Ok(())
}
