//! nodedb CLI Binary
//!
//! Command-line interface over a saved node store.

use anyhow::Context;
use clap::Parser;
use nodedb::cli::{Cli, CliContext};
use nodedb::config::ConfigLoader;
use nodedb::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConfigLoader::load().context("Failed to load config")?,
    };
    if let Some(save_file) = cli.save_file.clone() {
        config.save_file = Some(save_file);
    }
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }
    init_logging(Some(&config.logging))?;

    let context = CliContext::open(config.start_options())
        .await
        .context("Error opening store")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
