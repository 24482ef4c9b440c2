//! `genesis world`: the autonomous forum, until Ctrl-C or `--max-ticks`.

use genesis_config::ScheduleStrategy;
use genesis_core::event::EventBus;
use genesis_engine::{PersonaStore, WorldScheduler, turn_order_for};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CliResult, build_gateway, build_policy, load_config, open_store};
use crate::remarks;

pub struct WorldArgs {
    pub strategy: Option<String>,
    pub max_ticks: Option<u64>,
    pub participants: Vec<String>,
    pub seed: Option<u64>,
    pub show_decisions: bool,
}

pub async fn run(config_path: Option<&Path>, args: WorldArgs) -> CliResult {
    let config = load_config(config_path)?;

    let strategy = match args.strategy.as_deref() {
        Some(s) => s.parse::<ScheduleStrategy>()?,
        None => config.world.strategy,
    };

    let names = if args.participants.is_empty() {
        config.world.participants.clone()
    } else {
        args.participants
    };
    let persona_store = PersonaStore::new(&config.world.personas_dir);
    let personas = persona_store.load_roster_lenient(&names);
    if personas.is_empty() {
        return Err(format!(
            "No usable personas in {} (run `genesis onboard` or `genesis personas`)",
            persona_store.dir().display()
        )
        .into());
    }

    let gateway = build_gateway(&config)?;
    let store = open_store(&config).await?;
    let events = Arc::new(EventBus::default());
    let policy = build_policy(&config, gateway, events.clone(), args.seed.or(config.world.seed));

    let roster: Vec<String> = personas.iter().map(|p| p.name.clone()).collect();
    let mut scheduler = WorldScheduler::new(personas, store, policy, turn_order_for(strategy))?
        .with_pacing(config.pacing.clone())
        .with_seed_topic(config.world.seed_topic.clone())
        .with_max_ticks(args.max_ticks.or(config.world.max_ticks));

    println!("🌍 Genesis World");
    println!("===============");
    println!("  Personas:  {}", roster.join(", "));
    println!("  Strategy:  {strategy}");
    println!("  Database:  {}", config.storage.database_path);
    println!("  Press Ctrl-C to stop after the current turn.\n");

    let printer = remarks::spawn(&events, args.show_decisions);
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, stopping"),
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await
            }
        }
    };
    let summary = scheduler.run(shutdown).await;
    tokio::task::yield_now().await;
    printer.abort();

    println!("\n🛑 World stopped");
    println!("  Seed posts: {}", summary.seed_posts);
    println!("  Ticks:      {}", summary.ticks);
    println!("  Actions:    {}", summary.actions);
    println!("  Lurks:      {}", summary.lurks);
    if summary.interrupted {
        println!("  (interrupted)");
    }

    Ok(())
}
