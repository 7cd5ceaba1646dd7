//! Command-line entry point.

use clap::Parser;
use ideaink_app::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting IdeaInk");

    ideaink_app::run(AppConfig::parse()).await
}
