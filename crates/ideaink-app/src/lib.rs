//! IdeaInk headless driver
//!
//! Opens a stored workspace, replays a script of whiteboard events against
//! it, lets the text model grow the mind map and saves the result.

pub mod config;
pub mod runner;
pub mod script;

pub use config::AppConfig;
pub use runner::Runner;
pub use script::{Command, parse_script};

use anyhow::{Context, Result};
use ideaink_ai::{HttpGenerator, OfflineGenerator, TextGenerator};
use ideaink_core::{CanvasDocument, FileStorage, Session, Storage};
use std::io::Read;
use std::sync::Arc;

fn read_script(source: &str) -> Result<Vec<Command>> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading script from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading script {}", source))?
    };
    parse_script(&text).with_context(|| format!("parsing script {}", source))
}

/// Build a runner from the command line.
pub fn build_runner(config: &AppConfig) -> Result<Runner> {
    let storage: Arc<dyn Storage> = match &config.storage_dir {
        Some(dir) => Arc::new(FileStorage::new(dir.clone())?),
        None => Arc::new(FileStorage::default_location()?),
    };

    let generator_config = config.generator_config();
    let generator: Arc<dyn TextGenerator> = if config.offline {
        log::info!("Using offline generator");
        Arc::new(OfflineGenerator)
    } else {
        log::info!("Using generation endpoint {}", generator_config.url);
        Arc::new(HttpGenerator::new(generator_config.clone())?)
    };

    let mut document = CanvasDocument::new();
    document.set_viewport_size(config.width, config.height);
    let session = Session::new(document, config.session_config());

    Ok(Runner::new(
        session,
        generator,
        generator_config,
        storage,
        config.workspace.clone(),
        config.workspace_name(),
    ))
}

/// Open, replay, save.
pub async fn run(config: AppConfig) -> Result<()> {
    let commands = match &config.script {
        Some(source) => read_script(source)?,
        None => Vec::new(),
    };

    let mut runner = build_runner(&config)?;
    runner.open().await?;
    log::info!("Replaying {} commands", commands.len());
    runner.run_script(commands).await?;

    if !config.no_save {
        runner.save().await?;
    }
    if config.outline {
        print!("{}", runner.outline());
    }
    Ok(())
}
