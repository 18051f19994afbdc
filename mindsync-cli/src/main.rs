//! MindSync CLI - mirror mindmaps into git repositories
//!
//! Operator interface to every sync flow: save, sync, commit, push, pull,
//! branches, history and remotes.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mindsync_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    BranchArgs, CardArgs, CommitArgs, ConfigArgs, Context, ExportArgs, HistoryArgs, MapArgs,
    PullArgs, PushArgs, RemoteArgs, SaveArgs, StatusArgs, SyncArgs,
};

/// MindSync: keep mindmaps and git repositories in step
#[derive(Parser, Debug)]
#[command(name = "mindsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.config/mindsync/config.toml)
    #[arg(long, global = true, env = "MINDSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Root of the per-branch working directories
    #[arg(long, global = true)]
    repos_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Tenant the mindmaps belong to
    #[arg(long, global = true, env = "MINDSYNC_DOMAIN", default_value = "default")]
    domain: String,

    /// Acting user, recorded in commits and history
    #[arg(long, global = true, env = "MINDSYNC_USER", default_value = "operator")]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Create, list and edit mindmaps
    #[command(visible_alias = "m")]
    Map(MapArgs),

    /// Manage cards attached to nodes
    Card(CardArgs),

    /// Overwrite a branch from a JSON graph
    Save(SaveArgs),

    /// Refresh the working tree without committing
    Sync(SyncArgs),

    /// Sync and commit pending changes
    Commit(CommitArgs),

    /// Sync, commit and push
    Push(PushArgs),

    /// Rebuild a branch from the remote
    Pull(PullArgs),

    /// Show repository status for a branch
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Write a branch as a directory tree
    Export(ExportArgs),

    /// Manage branches
    Branch(BranchArgs),

    /// List and restore history entries
    History(HistoryArgs),

    /// Configure the remote repository
    Remote(RemoteArgs),

    /// Show configuration or set up secrets
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.repos_dir.clone(),
        cli.database.clone(),
    )?;
    let secrets = Secrets::load()?;

    if cli.verbose {
        tracing::info!(
            domain = %cli.domain,
            repos_dir = ?config.storage.repos_dir,
            database = ?config.storage.database,
            "Configuration loaded"
        );
    }

    let ctx = Context {
        config,
        secrets,
        domain: cli.domain,
        user: cli.user,
        verbose: cli.verbose,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Version) => {
            println!("mindsync {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Map(args)) => args.execute(&ctx).await?,
        Some(Commands::Card(args)) => args.execute(&ctx).await?,
        Some(Commands::Save(args)) => args.execute(&ctx).await?,
        Some(Commands::Sync(args)) => args.execute(&ctx).await?,
        Some(Commands::Commit(args)) => args.execute(&ctx).await?,
        Some(Commands::Push(args)) => args.execute(&ctx).await?,
        Some(Commands::Pull(args)) => args.execute(&ctx).await?,
        Some(Commands::Status(args)) => args.execute(&ctx).await?,
        Some(Commands::Export(args)) => args.execute(&ctx).await?,
        Some(Commands::Branch(args)) => args.execute(&ctx).await?,
        Some(Commands::History(args)) => args.execute(&ctx).await?,
        Some(Commands::Remote(args)) => args.execute(&ctx).await?,
        Some(Commands::Config(args)) => args.execute(&ctx).await?,
        None => {
            println!("MindSync - mindmaps mirrored into git repositories");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_push_with_branch() {
        let cli = Cli::try_parse_from([
            "mindsync", "--domain", "acme", "push", "3", "-b", "feature", "-m", "ship it",
        ])
        .unwrap();
        assert_eq!(cli.domain, "acme");
        match cli.command {
            Some(Commands::Push(args)) => {
                assert_eq!(args.target.mmid, 3);
                assert_eq!(args.target.branch.as_deref(), Some("feature"));
                assert_eq!(args.message, "ship it");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_branch_create_defaults_to_main() {
        let cli = Cli::try_parse_from(["mindsync", "branch", "create", "1", "draft"]).unwrap();
        match cli.command {
            Some(Commands::Branch(args)) => match args.command {
                commands::branch::BranchCommand::Create { from, name, .. } => {
                    assert_eq!(from, "main");
                    assert_eq!(name, "draft");
                }
                other => panic!("unexpected subcommand: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
