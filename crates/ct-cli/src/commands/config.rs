//! Config command
//!
//! Manage comments-tree configuration.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use ct_core::config::Config;

use super::context::GlobalOpts;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Print the configuration file path
    Path,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, opts: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show_config(opts, json),
        ConfigCommand::Init { force } => init_config(opts, force),
        ConfigCommand::Validate => validate_config(opts),
        ConfigCommand::Path => {
            println!("{}", opts.config_path().display());
            Ok(())
        }
    }
}

fn show_config(opts: &GlobalOpts, as_json: bool) -> Result<()> {
    let config = opts.load_config()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let path = opts.config_path();
        println!("{}", "Configuration:".bold().underline());
        if path.exists() {
            println!("{}", path.display().to_string().dimmed());
        } else {
            println!("{}", "(defaults, no file)".dimmed());
        }
        println!();
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn init_config(opts: &GlobalOpts, force: bool) -> Result<()> {
    let path = opts.config_path();

    if path.exists() && !force {
        eprintln!(
            "{} Configuration already exists at {}. Use --force to overwrite.",
            "⚠".yellow(),
            path.display()
        );
        return Ok(());
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

fn validate_config(opts: &GlobalOpts) -> Result<()> {
    let path = opts.config_path();

    if !path.exists() {
        eprintln!("{} Configuration not found at {}", "✗".red(), path.display());
        return Ok(());
    }

    Config::load(&path).with_context(|| format!("Invalid configuration {}", path.display()))?;
    println!("{} Configuration is valid", "✓".green());
    Ok(())
}
