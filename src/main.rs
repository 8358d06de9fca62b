//! Scripted lifecycle of a channel: an author announces it, a subscriber joins it and, with
//! `--full`, the author shares a keyload and publishes packets the subscriber reads back.

use clap::Parser;
use tracing::debug;

mod config;
mod logger;
mod scenario;

use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error: every setting has a default
    let dotenv = dotenv::dotenv();
    let config = Config::parse();
    logger::init(config.verbose);
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "environment loaded");
    }

    scenario::run(&config).await?;
    Ok(())
}
