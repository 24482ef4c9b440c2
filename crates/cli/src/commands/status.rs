//! `genesis status`: show the effective configuration.

use genesis_config::AppConfig;
use std::path::Path;

use super::{CliResult, load_config};

pub async fn run(config_path: Option<&Path>, ping: bool) -> CliResult {
    let config = load_config(config_path)?;
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("🌱 Genesis Status");
    println!("================");
    println!("  Config file:  {}", path.display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  Max tokens:   {}", config.default_max_tokens);
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing (stub replies)" });
    println!("  Database:     {}", config.storage.database_path);
    println!("  Personas:     {}", config.world.personas_dir.display());
    println!("  Topics:       {}", config.world.topics_file.display());
    println!("  Strategy:     {}", config.world.strategy);
    println!("  Seed topic:   {}", config.world.seed_topic);
    println!(
        "  Max ticks:    {}",
        config.world.max_ticks.map_or("unbounded".to_string(), |n| n.to_string())
    );
    println!("  Debaters:     {}", config.debate.participants.join(", "));
    println!("  Turns each:   {}", config.debate.turns_per_persona);

    let d = &config.decision;
    println!("\n  Decision:");
    println!("    notify reply {:.2}  scroll engage {:.2}  target comment {:.2}", d.p_notify_reply, d.p_scroll_engage, d.p_target_comment);
    println!("    impulsive style {:.2}  impulsive tactic {:.2}", d.p_impulsive_style, d.p_impulsive_tactic);
    println!("    cooldowns: style {}  tactic {}", d.style_cooldown, d.tactic_cooldown);

    let p = &config.pacing;
    println!("\n  Pacing:");
    println!("    turn {}ms  stagger {}ms  action {}ms  lurk {}-{}s", p.turn_delay_ms, p.stagger_ms, p.action_delay_ms, p.lurk_delay_secs[0], p.lurk_delay_secs[1]);

    if ping {
        let router = genesis_providers::build_from_config(&config);
        let provider = router.default().ok_or("No default provider configured")?;
        match provider.health_check().await {
            Ok(true) => println!("\n  ✅ Provider {} is reachable", provider.name()),
            Ok(false) => println!("\n  ⚠️  Provider {} answered but is not healthy", provider.name()),
            Err(e) => println!("\n  ❌ Provider {} unreachable: {e}", provider.name()),
        }
    }

    if path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `genesis onboard` first");
    }

    Ok(())
}
