pub mod debate;
pub mod onboard;
pub mod personas;
pub mod status;
pub mod view;
pub mod world;

use genesis_config::AppConfig;
use genesis_core::event::EventBus;
use genesis_engine::{DecisionPolicy, GenerationGateway};
use genesis_store::SqliteThreadStore;
use std::path::Path;
use std::sync::Arc;

pub(crate) type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub(crate) fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    Ok(AppConfig::load_with(path).map_err(|e| format!("Failed to load config: {e}"))?)
}

pub(crate) fn build_gateway(config: &AppConfig) -> CliResult<Arc<GenerationGateway>> {
    let router = genesis_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    if provider.name() == "stub" {
        eprintln!("  ⚠️  No API key configured, replies are simulated.");
        eprintln!("     Set GENESIS_API_KEY or OPENROUTER_API_KEY for real output.\n");
    }
    Ok(Arc::new(GenerationGateway::from_config(provider, config)))
}

pub(crate) async fn open_store(config: &AppConfig) -> CliResult<Arc<SqliteThreadStore>> {
    let store = SqliteThreadStore::new(&config.storage.database_path)
        .await
        .map_err(|e| format!("Failed to open {}: {e}", config.storage.database_path))?;
    Ok(Arc::new(store))
}

pub(crate) fn build_policy(
    config: &AppConfig,
    gateway: Arc<GenerationGateway>,
    events: Arc<EventBus>,
    seed: Option<u64>,
) -> DecisionPolicy {
    let policy = DecisionPolicy::new(config.decision.clone(), gateway, events);
    match seed {
        Some(seed) => policy.with_seed(seed),
        None => policy,
    }
}
