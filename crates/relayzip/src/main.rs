//! relayzip - stream a dated zip from a web index into storage.

use anyhow::Context;
use clap::Parser;
use relayzip::Settings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{App, Commands};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();

    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::load(app.config.as_deref()).context("failed to load settings")?;

    match app.cmd {
        Commands::Run(args) => {
            if !cli::run::run(settings, args).await? {
                std::process::exit(1);
            }
        }
        Commands::List(args) => cli::list::list(&settings, &args)?,
    }

    Ok(())
}
