//! Configuration inspection and secrets setup

use clap::{Args, Subcommand};
use mindsync_core::{Config, Secrets};

use super::Context;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration (default)
    Show,

    /// Write a secrets.toml template with 0600 permissions
    InitSecrets,
}

impl ConfigArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match self.command.as_ref().unwrap_or(&ConfigCommand::Show) {
            ConfigCommand::Show => show(ctx),
            ConfigCommand::InitSecrets => {
                let path = Secrets::create_template()?;
                println!("Secrets template at {}", path.display());
                println!("Add your GitHub token there, or set GITHUB_TOKEN.");
                Ok(())
            }
        }
    }
}

fn show(ctx: &Context) -> anyhow::Result<()> {
    let config = &ctx.config;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("MindSync Configuration");
    println!("======================");
    println!();
    println!("Git:");
    println!("  git_path: {}", config.git.git_path);
    println!("  bot: {} <{}>", config.git.bot_name, config.git.bot_email);
    println!("  command_timeout: {:?}", config.git.command_timeout);
    println!("  network_timeout: {:?}", config.git.network_timeout);
    println!();
    println!("Storage:");
    println!("  repos_dir: {}", config.storage.repos_dir()?.display());
    println!("  database: {}", config.storage.database()?.display());
    println!();
    println!("GitHub:");
    println!(
        "  owner: {}",
        config.github.owner.as_deref().unwrap_or("(token user)")
    );
    println!("  private: {}", config.github.private);
    println!(
        "  token: {}",
        if ctx.secrets.github_token().is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
    Ok(())
}
