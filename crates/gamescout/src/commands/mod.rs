//! CLI command implementations.

use std::sync::Arc;

use anyhow::{Context, Result};

use gamescout::config::Config;
use gamescout::dispatch::Dispatcher;
use gamescout::sources::WebSources;

pub mod chat;
pub mod serve;

/// Build the dispatcher on top of the live web sources.
fn build_dispatcher(config: &Config) -> Result<Arc<Dispatcher>> {
    let sources = WebSources::new(&config.sources).context("Invalid sources configuration")?;
    Ok(Arc::new(Dispatcher::from_config(
        Arc::new(sources),
        &config.conversation,
    )))
}
