//! Simulation events: a side channel for observing decisions.
//!
//! The scheduler publishes an event for every choice and commit. Nothing in
//! the engine depends on anyone listening; the CLI subscribes to print
//! "moderator remarks" and tests subscribe to assert on behaviour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// How a style or tactic was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceMode {
    /// Uniform random pick
    Impulsive,
    /// Delegated to the generation backend
    Logical,
}

impl std::fmt::Display for ChoiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceMode::Impulsive => write!(f, "impulsively"),
            ChoiceMode::Logical => write!(f, "logically"),
        }
    }
}

/// All simulation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimEvent {
    /// A debate session picked its topic
    TopicChosen {
        subreddit: String,
        topic: String,
        timestamp: DateTime<Utc>,
    },

    /// A persona picked a reply style
    StyleChosen {
        persona: String,
        style: String,
        mode: ChoiceMode,
        timestamp: DateTime<Utc>,
    },

    /// A persona picked a tactic
    TacticChosen {
        persona: String,
        tactic: String,
        mode: ChoiceMode,
        timestamp: DateTime<Utc>,
    },

    /// A persona noticed a reply on one of its posts
    NotificationSeen {
        persona: String,
        from: String,
        post_title: String,
        timestamp: DateTime<Utc>,
    },

    /// A post was persisted
    PostCreated {
        persona: String,
        subreddit: String,
        title: String,
        post_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A comment was persisted
    CommentCreated {
        persona: String,
        post_id: i64,
        comment_id: i64,
        parent_comment_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },

    /// A persona took no action this tick
    Lurked {
        persona: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The generation backend failed and a placeholder was used
    GenerationFailed {
        persona: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A storage operation failed and the action was dropped
    StoreFailed {
        persona: String,
        operation: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for simulation events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<SimEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: SimEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SimEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
