//! The persona turn-decision engine.
//!
//! One unit of work is a persona's turn:
//!
//! 1. **Pick** who acts (debate rotation or a world [`TurnOrder`])
//! 2. **Decide** what to act on: a notification, a scrolled thread, or nothing
//! 3. **Plan** the reply: style, tactic under cooldown, backstory gating
//! 4. **Generate** through the [`GenerationGateway`]
//! 5. **Commit** to the [`ThreadStore`](genesis_core::ThreadStore)
//!
//! Turns run strictly one after another; nothing here is shared across tasks.

pub mod context;
pub mod cooldown;
pub mod debate;
pub mod gateway;
pub mod persona_store;
pub mod policy;
pub mod scheduler;
pub mod topics;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextBuilder, Transcript};
pub use cooldown::{CooldownTracker, CooldownWindow};
pub use debate::{DebateOutcome, DebateSession, DebateTurn};
pub use gateway::{ERROR_MARKER, GenerationGateway, placeholder};
pub use persona_store::PersonaStore;
pub use policy::{
    DecisionPolicy, ReplyPlan, ReplyTarget, TurnAction, normalize_choice, wants_backstory,
};
pub use scheduler::{
    Hybrid, RandomTick, RoundRobin, TickOutcome, TurnOrder, WorldRunSummary, WorldScheduler,
    turn_order_for,
};
pub use topics::{Topic, load_topics, pick_topic};
