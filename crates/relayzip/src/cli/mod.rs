use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod list;
pub mod run;

#[derive(Debug, Parser)]
#[command(name = "relayzip", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// TOML settings file, layered over the built-in defaults.
    #[arg(long, short, global = true, env = "RELAYZIP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download and extract one or more configured sources.
    #[command(alias = "r", name = "run")]
    Run(run::RunArgs),
    /// Show the configured sources.
    #[command(alias = "ls", name = "list")]
    List(list::ListArgs),
}
