//! `genesis debate`: one thread, fixed roster, strict turn order.

use genesis_core::event::EventBus;
use genesis_engine::{DebateSession, PersonaStore, load_topics};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{CliResult, build_gateway, build_policy, load_config, open_store};
use crate::remarks;

pub struct DebateArgs {
    pub participants: Vec<String>,
    pub turns: Option<u32>,
    pub topics: Option<PathBuf>,
    pub show_decisions: bool,
}

pub async fn run(config_path: Option<&Path>, args: DebateArgs) -> CliResult {
    let config = load_config(config_path)?;

    let names = if args.participants.is_empty() {
        config.debate.participants.clone()
    } else {
        args.participants
    };
    let personas = PersonaStore::new(&config.world.personas_dir).load_roster_strict(&names)?;

    let topics_path = args.topics.unwrap_or_else(|| config.world.topics_file.clone());
    let topics = load_topics(&topics_path)?;

    let turns = args.turns.unwrap_or(config.debate.turns_per_persona);
    if turns == 0 {
        return Err("--turns must be at least 1".into());
    }

    let gateway = build_gateway(&config)?;
    let store = open_store(&config).await?;
    let events = Arc::new(EventBus::default());
    let policy = build_policy(&config, gateway, events.clone(), config.world.seed);

    let mut session =
        DebateSession::new(personas, store, policy, turns)?.with_pacing(config.pacing.clone());
    let topic = session.pick_topic(&topics).ok_or("No topics available")?;

    println!("🗣️  Genesis Debate");
    println!("================");
    println!("  Participants: {}", names.join(", "));
    println!("  Turns each:   {turns}\n");

    let printer = remarks::spawn(&events, args.show_decisions);
    let result = session.run(topic).await;
    // Let the printer drain what was already published.
    tokio::task::yield_now().await;
    printer.abort();
    let outcome = result?;

    println!("\n=== {}: {} ===\n", outcome.topic.subreddit, outcome.topic.topic);
    println!("{}", outcome.transcript.render());
    println!(
        "\n✅ Saved as post #{} with {} replies in {}",
        outcome.post_id,
        outcome.turns.len(),
        config.storage.database_path
    );

    Ok(())
}
