//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod config;
pub mod context;
pub mod moderate;
pub mod post;
pub mod query;
pub mod tree;

use clap::{Parser, Subcommand};
use context::GlobalOpts;

/// comments-tree - threaded comment trees on materialized paths
#[derive(Debug, Parser)]
#[command(name = "comments-tree")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Tree store directory
    #[arg(long, global = true, env = "COMMENTS_TREE_DATA_DIR")]
    pub data_dir: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve or create the comment root of a content object
    Root(post::RootArgs),

    /// Post a comment
    Post(post::PostArgs),

    /// Print the comment tree of a content object
    Tree(tree::TreeArgs),

    /// Count comments across content types
    Count(query::QueryArgs),

    /// List comments across content types
    List(query::QueryArgs),

    /// Moderate comments
    #[command(subcommand)]
    Moderate(moderate::ModerateCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Run the CLI application
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let opts = GlobalOpts {
        config: cli.config,
        data_dir: cli.data_dir,
    };

    // Dispatch to command handler
    match cli.command {
        Commands::Root(args) => post::execute_root(args, &opts),
        Commands::Post(args) => post::execute(args, &opts),
        Commands::Tree(args) => tree::execute(args, &opts),
        Commands::Count(args) => query::execute_count(args, &opts),
        Commands::List(args) => query::execute_list(args, &opts),
        Commands::Moderate(cmd) => moderate::execute(cmd, &opts),
        Commands::Config(cmd) => config::execute(cmd, &opts),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
