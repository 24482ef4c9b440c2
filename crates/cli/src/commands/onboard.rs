//! `genesis onboard`: first-time setup.

use genesis_config::AppConfig;
use genesis_core::persona::{Demographics, Persona};
use genesis_engine::Topic;
use std::path::Path;

use super::{CliResult, load_config, open_store};

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    println!("🌱 Genesis: First-Time Setup");
    println!("============================\n");

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if path.exists() {
        println!("  Config already exists at: {}", path.display());
    } else {
        std::fs::write(&path, AppConfig::default_toml())?;
        println!("✅ Created config at: {}", path.display());
    }

    let config = load_config(Some(&path))?;

    let personas_dir = &config.world.personas_dir;
    if !personas_dir.exists() {
        std::fs::create_dir_all(personas_dir)?;
        println!("✅ Created personas directory: {}", personas_dir.display());
    }
    for persona in example_personas() {
        let file = personas_dir.join(format!("{}.json", persona.name));
        if file.exists() {
            println!("  Persona exists: {}", file.display());
            continue;
        }
        std::fs::write(&file, serde_json::to_string_pretty(&persona)?)?;
        println!("✅ Created persona: {}", file.display());
    }

    let topics_file = &config.world.topics_file;
    if topics_file.exists() {
        println!("  Topics file exists: {}", topics_file.display());
    } else {
        if let Some(dir) = topics_file.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(topics_file, serde_json::to_string_pretty(&example_topics())?)?;
        println!("✅ Created topics file: {}", topics_file.display());
    }

    open_store(&config).await?;
    println!("✅ Database ready: {}", config.storage.database_path);

    println!("\n📝 Next steps:");
    println!("   1. Set GENESIS_API_KEY (or OPENROUTER_API_KEY) for real replies");
    println!("   2. Run: genesis debate");
    println!("   3. Run: genesis world, then genesis view\n");

    Ok(())
}

/// Two contrasting personas that can debate out of the box.
pub fn example_personas() -> Vec<Persona> {
    vec![
        Persona {
            name: "helios".into(),
            archetype: "earnest optimist".into(),
            demographics: Demographics {
                location: "Lisbon, Portugal".into(),
            },
            speech_patterns: "warm, long sentences, fond of metaphors about light and navigation"
                .into(),
            biography_summary: "A retired lighthouse engineer who learned philosophy from \
                                library books during night shifts."
                .into(),
            defining_moment: "Talked a stranded sailor through a storm over the radio and never \
                              learned whether the man made it home."
                .into(),
            home_subreddit: Some("r/philosophy".into()),
            scrolling_interests: vec!["r/philosophy".into(), "r/futurology".into()],
            reply_style_preference: vec![
                "thoughtful essay".into(),
                "gentle question".into(),
                "short encouragement".into(),
            ],
            possible_tactics: vec![
                "share a personal anecdote".into(),
                "steelman the other side".into(),
                "appeal to shared values".into(),
            ],
            activity_level: 0.6,
        },
        Persona {
            name: "nyx".into(),
            archetype: "sardonic skeptic".into(),
            demographics: Demographics {
                location: "Berlin, Germany".into(),
            },
            speech_patterns: "clipped, dry, lowercase, allergic to exclamation marks".into(),
            biography_summary: "A night-shift data analyst who spends every break arguing with \
                                strangers online."
                .into(),
            defining_moment: "Exposed a fabricated study that a trusted mentor had championed."
                .into(),
            home_subreddit: Some("r/futurology".into()),
            scrolling_interests: vec!["r/futurology".into(), "r/philosophy".into()],
            reply_style_preference: vec![
                "sarcastic quip".into(),
                "pointed question".into(),
                "blunt rebuttal".into(),
            ],
            possible_tactics: vec![
                "demand evidence".into(),
                "cite a counterexample".into(),
                "share an anecdote from my past".into(),
            ],
            activity_level: 0.7,
        },
    ]
}

pub fn example_topics() -> Vec<Topic> {
    [
        ("r/philosophy", "Is free will an illusion?"),
        ("r/philosophy", "Can a machine ever be conscious?"),
        ("r/futurology", "Will remote work empty out city centres?"),
        ("r/futurology", "Should we try to bring back extinct species?"),
    ]
    .into_iter()
    .map(|(subreddit, topic)| Topic {
        subreddit: subreddit.into(),
        topic: topic.into(),
    })
    .collect()
}
