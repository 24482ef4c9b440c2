//! Persona: a simulated forum participant.
//!
//! Personas are immutable value objects loaded once per run. The public half
//! (name, archetype, location, voice) is always sent to the generation backend;
//! the private half (biography, defining moment) only when a tactic calls for
//! a personal anecdote.

use serde::{Deserialize, Serialize};

use crate::error::PersonaError;

/// Where a persona is from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub location: String,
}

/// A simulated participant with fixed identity, voice, and behavioral preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier, also used as the author name on posts and comments
    pub name: String,

    pub archetype: String,

    pub demographics: Demographics,

    /// How the persona talks
    pub speech_patterns: String,

    /// Private backstory summary
    pub biography_summary: String,

    /// Private formative event
    pub defining_moment: String,

    /// Board the persona seeds with an opening post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_subreddit: Option<String>,

    /// Boards the persona reads while scrolling
    #[serde(default)]
    pub scrolling_interests: Vec<String>,

    /// Ordered reply styles; never empty
    pub reply_style_preference: Vec<String>,

    /// Ordered rhetorical tactics; never empty
    pub possible_tactics: Vec<String>,

    /// Probability of scrolling on a tick
    #[serde(default = "default_activity_level")]
    pub activity_level: f64,
}

fn default_activity_level() -> f64 {
    0.5
}

impl Persona {
    /// Reject records the decision policy cannot work with.
    pub fn validate(&self) -> Result<(), PersonaError> {
        let invalid = |reason: &str| PersonaError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.reply_style_preference.iter().all(|s| s.trim().is_empty()) {
            return Err(invalid("reply_style_preference is empty"));
        }
        if self.possible_tactics.iter().all(|t| t.trim().is_empty()) {
            return Err(invalid("possible_tactics is empty"));
        }
        if !(0.0..=1.0).contains(&self.activity_level) {
            return Err(invalid("activity_level must be between 0.0 and 1.0"));
        }
        Ok(())
    }

    /// Whether the persona reads anything at all while scrolling.
    pub fn has_interests(&self) -> bool {
        !self.scrolling_interests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helios_json() -> &'static str {
        r#"{
            "name": "helios",
            "archetype": "The Optimistic Technologist",
            "demographics": { "location": "San Francisco" },
            "speech_patterns": "Upbeat, uses startup jargon",
            "biography_summary": "Founded two companies.",
            "defining_moment": "Watched the first moon landing replay as a kid.",
            "home_subreddit": "r/Futurology",
            "scrolling_interests": ["r/Futurology", "r/ArtificialCreativity"],
            "reply_style_preference": ["quip", "long-form"],
            "possible_tactics": ["cite anecdote", "ask clarifying question"],
            "activity_level": 0.8
        }"#
    }

    #[test]
    fn parses_full_record() {
        let persona: Persona = serde_json::from_str(helios_json()).unwrap();
        assert_eq!(persona.name, "helios");
        assert_eq!(persona.demographics.location, "San Francisco");
        assert_eq!(persona.home_subreddit.as_deref(), Some("r/Futurology"));
        assert!(persona.validate().is_ok());
    }

    #[test]
    fn activity_level_defaults_to_half() {
        let mut value: serde_json::Value = serde_json::from_str(helios_json()).unwrap();
        value.as_object_mut().unwrap().remove("activity_level");
        let persona: Persona = serde_json::from_value(value).unwrap();
        assert!((persona.activity_level - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_tactics_rejected() {
        let mut persona: Persona = serde_json::from_str(helios_json()).unwrap();
        persona.possible_tactics.clear();
        let err = persona.validate().unwrap_err();
        assert!(err.to_string().contains("possible_tactics"));
    }

    #[test]
    fn empty_styles_rejected() {
        let mut persona: Persona = serde_json::from_str(helios_json()).unwrap();
        persona.reply_style_preference = vec!["  ".into()];
        assert!(persona.validate().is_err());
    }

    #[test]
    fn out_of_range_activity_rejected() {
        let mut persona: Persona = serde_json::from_str(helios_json()).unwrap();
        persona.activity_level = 1.5;
        assert!(persona.validate().is_err());
    }

    #[test]
    fn missing_required_list_fails_to_parse() {
        let mut value: serde_json::Value = serde_json::from_str(helios_json()).unwrap();
        value.as_object_mut().unwrap().remove("possible_tactics");
        assert!(serde_json::from_value::<Persona>(value).is_err());
    }
}
