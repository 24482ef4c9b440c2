//! `genesis personas`: list persona files and validate each.

use genesis_engine::PersonaStore;
use std::path::Path;

use super::{CliResult, load_config};

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let store = PersonaStore::new(&config.world.personas_dir);

    println!("🎭 Personas in {}", store.dir().display());
    println!("==============");

    let names = store.list()?;
    if names.is_empty() {
        println!("  (none) Run `genesis onboard` to create examples.");
        return Ok(());
    }

    let mut invalid = 0;
    for name in &names {
        match store.load(name) {
            Ok(persona) => {
                let home = persona.home_subreddit.as_deref().unwrap_or("-");
                println!(
                    "  ✅ {:<16} {:<24} home: {:<16} reads: {}",
                    persona.name,
                    persona.archetype,
                    home,
                    if persona.scrolling_interests.is_empty() {
                        "-".to_string()
                    } else {
                        persona.scrolling_interests.join(", ")
                    }
                );
            }
            Err(e) => {
                invalid += 1;
                println!("  ❌ {name:<16} {e}");
            }
        }
    }

    println!("\n  {} valid, {invalid} invalid", names.len() - invalid);
    if invalid > 0 {
        return Err(format!("{invalid} persona file(s) failed validation").into());
    }
    Ok(())
}
