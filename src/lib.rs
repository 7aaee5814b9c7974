pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::ContextCache;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AppConfig;
use crate::core::context::ContextService;
use crate::core::models::Credentials;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Aggregate and display the financial context of each link.
    Context { link_ids: Vec<String>, json: bool },
}

/// Wires the provider client, clock and cache described by `config` into a
/// [`ContextService`].
pub fn build_service(config: &AppConfig) -> Result<ContextService> {
    config.validate()?;
    let provider = providers::BelvoProvider::new(config.provider.base_url(), config.provider.timeout())?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(ContextCache::new(config.cache_ttl(), Arc::clone(&clock)));
    Ok(ContextService::new(
        Arc::new(provider),
        cache,
        clock,
        config.aggregation_options(),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("finctx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let credentials = config.credentials()?;
    run_with(command, &config, &credentials).await
}

pub async fn run_with(
    command: AppCommand,
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<()> {
    let service = build_service(config)?;
    match command {
        AppCommand::Context { link_ids, json } => {
            cli::context::run(&service, &link_ids, credentials, json).await
        }
    }
}
