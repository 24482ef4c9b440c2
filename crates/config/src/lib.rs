//! Configuration loading, validation, and management for Genesis.
//!
//! Loads configuration from `~/.genesis/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.genesis/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Thread store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Autonomous world configuration
    #[serde(default)]
    pub world: WorldConfig,

    /// Turn-based debate configuration
    #[serde(default)]
    pub debate: DebateConfig,

    /// Decision policy probabilities and cooldowns
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Delays between turns and ticks
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash-lite".into()
}
fn default_temperature() -> f32 {
    0.9
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("storage", &self.storage)
            .field("world", &self.world)
            .field("debate", &self.debate)
            .field("decision", &self.decision)
            .field("pacing", &self.pacing)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file (":memory:" for an ephemeral store)
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    "world.db".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Which persona acts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// Fixed successor order
    RoundRobin,
    /// One uniformly random persona per tick
    #[default]
    RandomTick,
    /// A full round-robin sweep, then one random-roll turn
    Hybrid,
}

impl std::fmt::Display for ScheduleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScheduleStrategy::RoundRobin => "round_robin",
            ScheduleStrategy::RandomTick => "random_tick",
            ScheduleStrategy::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ScheduleStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "round_robin" => Ok(ScheduleStrategy::RoundRobin),
            "random_tick" | "random" | "tick" => Ok(ScheduleStrategy::RandomTick),
            "hybrid" => Ok(ScheduleStrategy::Hybrid),
            other => Err(ConfigError::ValidationError(format!(
                "unknown schedule strategy '{other}' (expected round_robin, random_tick or hybrid)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Directory holding `<name>.json` persona records
    #[serde(default = "default_personas_dir")]
    pub personas_dir: PathBuf,

    /// JSON array of `{subreddit, topic}` records
    #[serde(default = "default_topics_file")]
    pub topics_file: PathBuf,

    /// Roster for the autonomous world; empty means every persona on disk
    #[serde(default)]
    pub participants: Vec<String>,

    /// Subject of every persona's seed post
    #[serde(default = "default_seed_topic")]
    pub seed_topic: String,

    #[serde(default)]
    pub strategy: ScheduleStrategy,

    /// Stop after this many ticks (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_personas_dir() -> PathBuf {
    PathBuf::from("personas")
}
fn default_topics_file() -> PathBuf {
    PathBuf::from("topics.json")
}
fn default_seed_topic() -> String {
    "The nature of consciousness".into()
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            personas_dir: default_personas_dir(),
            topics_file: default_topics_file(),
            participants: vec![],
            seed_topic: default_seed_topic(),
            strategy: ScheduleStrategy::default(),
            max_ticks: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    #[serde(default = "default_debate_participants")]
    pub participants: Vec<String>,

    /// Replies per participant
    #[serde(default = "default_turns_per_persona")]
    pub turns_per_persona: u32,
}

fn default_debate_participants() -> Vec<String> {
    vec!["helios".into(), "nyx".into()]
}
fn default_turns_per_persona() -> u32 {
    3
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            participants: default_debate_participants(),
            turns_per_persona: default_turns_per_persona(),
        }
    }
}

/// Every probability the decision policy rolls against, in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Chance of answering an unread reply on one's own post
    #[serde(default = "default_p_notify_reply")]
    pub p_notify_reply: f64,

    /// Chance of engaging with a post picked while scrolling
    #[serde(default = "default_p_scroll_engage")]
    pub p_scroll_engage: f64,

    /// Chance of replying to a comment rather than the post root
    #[serde(default = "default_p_target_comment")]
    pub p_target_comment: f64,

    /// Chance of a random (rather than delegated) style pick
    #[serde(default = "default_p_impulsive_style")]
    pub p_impulsive_style: f64,

    /// Chance of a random (rather than delegated) tactic pick
    #[serde(default = "default_p_impulsive_tactic")]
    pub p_impulsive_tactic: f64,

    /// Recent tactics excluded from re-selection
    #[serde(default = "default_tactic_cooldown")]
    pub tactic_cooldown: usize,

    /// Recent styles excluded from impulsive re-selection (0 disables)
    #[serde(default = "default_style_cooldown")]
    pub style_cooldown: usize,

    /// Posts fetched per scroll
    #[serde(default = "default_window")]
    pub scroll_window: usize,

    /// Comments considered as reply targets
    #[serde(default = "default_window")]
    pub comment_window: usize,

    /// Characters of the last message shown when delegating the style pick
    #[serde(default = "default_style_hint_chars")]
    pub style_hint_chars: usize,
}

fn default_p_notify_reply() -> f64 {
    0.9
}
fn default_p_scroll_engage() -> f64 {
    0.5
}
fn default_p_target_comment() -> f64 {
    0.7
}
fn default_p_impulsive_style() -> f64 {
    0.65
}
fn default_p_impulsive_tactic() -> f64 {
    0.5
}
fn default_tactic_cooldown() -> usize {
    2
}
fn default_style_cooldown() -> usize {
    1
}
fn default_window() -> usize {
    10
}
fn default_style_hint_chars() -> usize {
    200
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            p_notify_reply: default_p_notify_reply(),
            p_scroll_engage: default_p_scroll_engage(),
            p_target_comment: default_p_target_comment(),
            p_impulsive_style: default_p_impulsive_style(),
            p_impulsive_tactic: default_p_impulsive_tactic(),
            tactic_cooldown: default_tactic_cooldown(),
            style_cooldown: default_style_cooldown(),
            scroll_window: default_window(),
            comment_window: default_window(),
            style_hint_chars: default_style_hint_chars(),
        }
    }
}

impl DecisionConfig {
    fn probabilities(&self) -> [(&'static str, f64); 5] {
        [
            ("p_notify_reply", self.p_notify_reply),
            ("p_scroll_engage", self.p_scroll_engage),
            ("p_target_comment", self.p_target_comment),
            ("p_impulsive_style", self.p_impulsive_style),
            ("p_impulsive_tactic", self.p_impulsive_tactic),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after each debate reply
    #[serde(default = "default_one_second_ms")]
    pub turn_delay_ms: u64,

    /// Pause between seed posts
    #[serde(default = "default_one_second_ms")]
    pub stagger_ms: u64,

    /// Pause after a world tick that acted
    #[serde(default = "default_one_second_ms")]
    pub action_delay_ms: u64,

    /// Inclusive `[min, max]` pause after a lurking tick, in seconds
    #[serde(default = "default_lurk_delay_secs")]
    pub lurk_delay_secs: [u64; 2],
}

fn default_one_second_ms() -> u64 {
    1000
}
fn default_lurk_delay_secs() -> [u64; 2] {
    [3, 7]
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            turn_delay_ms: default_one_second_ms(),
            stagger_ms: default_one_second_ms(),
            action_delay_ms: default_one_second_ms(),
            lurk_delay_secs: default_lurk_delay_secs(),
        }
    }
}

impl PacingConfig {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            turn_delay_ms: 0,
            stagger_ms: 0,
            action_delay_ms: 0,
            lurk_delay_secs: [0, 0],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.genesis/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load configuration from `path` (or the default path) and apply
    /// environment overrides.
    ///
    /// API key lookup order when none is configured:
    /// - `GENESIS_API_KEY` (highest priority)
    /// - `GENAI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_dir().join("config.toml"),
        };
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = ["GENESIS_API_KEY", "GENAI_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        }

        if let Ok(provider) = std::env::var("GENESIS_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("GENESIS_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".genesis")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        for (name, p) in self.decision.probabilities() {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ValidationError(format!(
                    "decision.{name} must be between 0.0 and 1.0 (got {p})"
                )));
            }
        }

        if self.decision.scroll_window == 0 {
            return Err(ConfigError::ValidationError(
                "decision.scroll_window must be > 0".into(),
            ));
        }

        let [min, max] = self.pacing.lurk_delay_secs;
        if min > max {
            return Err(ConfigError::ValidationError(format!(
                "pacing.lurk_delay_secs is inverted: [{min}, {max}]"
            )));
        }

        if self.debate.turns_per_persona == 0 {
            return Err(ConfigError::ValidationError(
                "debate.turns_per_persona must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            storage: StorageConfig::default(),
            world: WorldConfig::default(),
            debate: DebateConfig::default(),
            decision: DecisionConfig::default(),
            pacing: PacingConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.decision.tactic_cooldown, 2);
        assert_eq!(config.decision.style_cooldown, 1);
        assert_eq!(config.world.strategy, ScheduleStrategy::RandomTick);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.pacing.lurk_delay_secs, [3, 7]);
        assert_eq!(parsed.debate.participants, vec!["helios", "nyx"]);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let mut config = AppConfig::default();
        config.decision.p_target_comment = 1.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("p_target_comment"));
    }

    #[test]
    fn inverted_lurk_range_rejected() {
        let mut config = AppConfig::default();
        config.pacing.lurk_delay_secs = [9, 2];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.storage.database_path, "world.db");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o-mini"

[world]
strategy = "hybrid"
max_ticks = 40

[decision]
p_impulsive_style = 0.4
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.world.strategy, ScheduleStrategy::Hybrid);
        assert_eq!(config.world.max_ticks, Some(40));
        assert!((config.decision.p_impulsive_style - 0.4).abs() < f64::EPSILON);
        assert!((config.decision.p_notify_reply - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = \"hot\"").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("round-robin".parse::<ScheduleStrategy>().unwrap(), ScheduleStrategy::RoundRobin);
        assert_eq!("tick".parse::<ScheduleStrategy>().unwrap(), ScheduleStrategy::RandomTick);
        assert_eq!("Hybrid".parse::<ScheduleStrategy>().unwrap(), ScheduleStrategy::Hybrid);
        assert!("sometimes".parse::<ScheduleStrategy>().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("p_notify_reply"));
    }
}
