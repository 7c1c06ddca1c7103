use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::infra::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "rtchat", about = "Twitch chat client for the terminal")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Join a channel and stream its chat
    Run(RunArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Channel to join, with or without the leading '#'
    #[arg(long)]
    pub channel: Option<String>,

    /// Login name to authenticate as
    #[arg(long)]
    pub username: Option<String>,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            channel: self.channel.clone(),
            username: self.username.clone(),
        }
    }
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunArgs::default()))
    }
}
