//! The decision policy: what a persona does with its turn.
//!
//! Steps run in order and each one can end the decision early:
//!
//! 1. **Notification**: an unread reply on one of the persona's own posts wins
//!    with probability `p_notify_reply`.
//! 2. **Activity**: otherwise the persona scrolls with probability
//!    `activity_level`, reading recent posts from its interests (never its own).
//! 3. **Target**: one post is picked; the persona engages with probability
//!    `p_scroll_engage` and replies to a recent comment with probability
//!    `p_target_comment`. A self-authored comment falls back to the post root.
//! 4. **Style**: random (`p_impulsive_style`) or delegated to the gateway.
//! 5. **Tactic**: random (`p_impulsive_tactic`) or delegated, always from the
//!    tactics outside the persona's cooldown window.
//! 6. **Backstory**: enabled only for tactics mentioning an anecdote.
//!
//! Delegated ("logical") picks are matched back onto the offered options; an
//! answer that matches nothing falls back to a random pick, so the chosen
//! value is always one the persona actually has.

use genesis_config::DecisionConfig;
use genesis_core::error::StoreError;
use genesis_core::event::{ChoiceMode, EventBus, SimEvent};
use genesis_core::persona::Persona;
use genesis_core::thread::{Comment, CommentId, Notification, Post, ThreadStore};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::ContextBuilder;
use crate::cooldown::{CooldownTracker, CooldownWindow};
use crate::gateway::GenerationGateway;

/// Messages shorter than this favour quick styles when a delegated style pick fails.
const SHORT_MESSAGE_CHARS: usize = 150;

/// Answers shorter than this must match an option exactly.
const MIN_PARTIAL_ANSWER_CHARS: usize = 3;

/// What a reply is aimed at inside a thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyTarget {
    /// The post itself
    Post,
    /// An existing comment on the post
    Comment(Comment),
}

impl ReplyTarget {
    pub fn parent_id(&self) -> Option<CommentId> {
        match self {
            ReplyTarget::Post => None,
            ReplyTarget::Comment(c) => Some(c.id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReplyTarget::Post => "post",
            ReplyTarget::Comment(_) => "comment",
        }
    }
}

/// Where a turn goes: a notification reply, a thread reply or a lurk.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnAction {
    ReplyToNotification(Notification),
    ReplyInThread { post: Post, target: ReplyTarget },
    Lurk { reason: String },
}

/// How a reply is written: style, tactic and whether the backstory is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPlan {
    pub style: String,
    pub style_mode: ChoiceMode,
    pub tactic: String,
    pub tactic_mode: ChoiceMode,
    pub use_full_backstory: bool,
}

/// True iff the tactic asks for a personal anecdote.
pub fn wants_backstory(tactic: &str) -> bool {
    tactic.to_lowercase().contains("anecdote")
}

/// Map a free-text answer onto one of `options`.
///
/// Strips quotes and markdown, then tries a case-insensitive exact match,
/// then the longest option contained in the answer, then an option containing
/// the answer as whole words. Stray letters like "A" or "I" match nothing.
pub fn normalize_choice(answer: &str, options: &[String]) -> Option<String> {
    let cleaned = answer
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_matches(|c: char| {
            matches!(c, '"' | '\'' | '`' | '*' | '_' | '.' | '!' | '[' | ']' | '-' | ':')
                || c.is_whitespace()
        })
        .to_lowercase();

    if cleaned.is_empty() {
        return None;
    }

    if let Some(exact) = options.iter().find(|o| o.trim().to_lowercase() == cleaned) {
        return Some(exact.clone());
    }

    let full_answer = answer.to_lowercase();
    if let Some(contained) = options
        .iter()
        .filter(|o| !o.trim().is_empty() && full_answer.contains(&o.trim().to_lowercase()))
        .max_by_key(|o| o.len())
    {
        return Some(contained.clone());
    }

    if cleaned.chars().count() < MIN_PARTIAL_ANSWER_CHARS {
        return None;
    }
    let needle = format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "));
    options
        .iter()
        .find(|o| {
            let words = o.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
            format!(" {words} ").contains(&needle)
        })
        .cloned()
}

fn non_blank(values: &[String]) -> Vec<String> {
    values.iter().filter(|v| !v.trim().is_empty()).cloned().collect()
}

/// Per-run decision state: probabilities, cooldown windows and the RNG.
pub struct DecisionPolicy {
    config: DecisionConfig,
    gateway: Arc<GenerationGateway>,
    context: ContextBuilder,
    styles: CooldownTracker,
    tactics: CooldownTracker,
    events: Arc<EventBus>,
    rng: StdRng,
}

impl DecisionPolicy {
    pub fn new(config: DecisionConfig, gateway: Arc<GenerationGateway>, events: Arc<EventBus>) -> Self {
        Self {
            context: ContextBuilder::new(config.style_hint_chars),
            styles: CooldownTracker::new(config.style_cooldown),
            tactics: CooldownTracker::new(config.tactic_cooldown),
            config,
            gateway,
            events,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Make every roll reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn context(&self) -> &ContextBuilder {
        &self.context
    }

    pub fn gateway(&self) -> &Arc<GenerationGateway> {
        &self.gateway
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn tactic_window(&self, persona: &str) -> Option<&CooldownWindow> {
        self.tactics.window(persona)
    }

    pub fn style_window(&self, persona: &str) -> Option<&CooldownWindow> {
        self.styles.window(persona)
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// True with probability `p`.
    pub fn roll(&mut self, p: f64) -> bool {
        self.rng.random::<f64>() < p
    }

    pub(crate) fn store_failed(&self, persona: &str, operation: &str, error: &StoreError) {
        warn!(persona, operation, "Store operation failed: {error}");
        self.events.publish(SimEvent::StoreFailed {
            persona: persona.to_string(),
            operation: operation.to_string(),
            error_message: error.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Decide where this turn goes: answer a notification, reply in a scrolled
    /// thread, or lurk.
    pub async fn decide(&mut self, persona: &Persona, store: &dyn ThreadStore) -> TurnAction {
        match store.latest_unread_comment_on_own_posts(&persona.name).await {
            Ok(Some(notification)) => {
                if self.roll(self.config.p_notify_reply) {
                    return TurnAction::ReplyToNotification(notification);
                }
                debug!(persona = %persona.name, "Ignoring notification for now");
            }
            Ok(None) => {}
            Err(e) => self.store_failed(&persona.name, "check notifications", &e),
        }

        if !self.roll(persona.activity_level) {
            return TurnAction::Lurk {
                reason: "not in the mood to scroll".into(),
            };
        }

        if !persona.has_interests() {
            return TurnAction::Lurk {
                reason: "no scrolling interests".into(),
            };
        }

        let posts = match store
            .recent_posts_for_interests(
                &persona.scrolling_interests,
                &persona.name,
                self.config.scroll_window,
            )
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                self.store_failed(&persona.name, "scroll feed", &e);
                return TurnAction::Lurk {
                    reason: "feed unavailable".into(),
                };
            }
        };

        let Some(post) = posts.choose(&mut self.rng).cloned() else {
            return TurnAction::Lurk {
                reason: "nothing new to read".into(),
            };
        };

        if !self.roll(self.config.p_scroll_engage) {
            return TurnAction::Lurk {
                reason: format!("read '{}' and moved on", post.title),
            };
        }

        let target = self.resolve_target(persona, &post, store).await;
        TurnAction::ReplyInThread { post, target }
    }

    /// Pick the reply target inside `post`: the root, or one of its recent
    /// comments written by someone else.
    pub async fn resolve_target(
        &mut self,
        persona: &Persona,
        post: &Post,
        store: &dyn ThreadStore,
    ) -> ReplyTarget {
        if !self.roll(self.config.p_target_comment) {
            return ReplyTarget::Post;
        }

        let comments = match store
            .recent_comments_on_post(post.id, self.config.comment_window)
            .await
        {
            Ok(comments) => comments,
            Err(e) => {
                self.store_failed(&persona.name, "load comments", &e);
                return ReplyTarget::Post;
            }
        };

        match comments.choose(&mut self.rng) {
            Some(comment) if comment.author != persona.name => ReplyTarget::Comment(comment.clone()),
            Some(_) => {
                debug!(persona = %persona.name, post_id = %post.id, "Picked own comment, replying to the post instead");
                ReplyTarget::Post
            }
            None => ReplyTarget::Post,
        }
    }

    /// Choose style, tactic and backstory for a reply to `last_message`.
    pub async fn plan_reply(&mut self, persona: &Persona, last_message: &str) -> ReplyPlan {
        let (style, style_mode) = self.choose_style(persona, last_message).await;
        self.events.publish(SimEvent::StyleChosen {
            persona: persona.name.clone(),
            style: style.clone(),
            mode: style_mode,
            timestamp: chrono::Utc::now(),
        });

        let (tactic, tactic_mode) = self.choose_tactic(persona, &style).await;
        self.events.publish(SimEvent::TacticChosen {
            persona: persona.name.clone(),
            tactic: tactic.clone(),
            mode: tactic_mode,
            timestamp: chrono::Utc::now(),
        });

        let use_full_backstory = wants_backstory(&tactic);
        debug!(
            persona = %persona.name,
            %style,
            %tactic,
            backstory = use_full_backstory,
            "Reply planned"
        );

        ReplyPlan {
            style,
            style_mode,
            tactic,
            tactic_mode,
            use_full_backstory,
        }
    }

    async fn choose_style(&mut self, persona: &Persona, last_message: &str) -> (String, ChoiceMode) {
        let candidates = non_blank(&persona.reply_style_preference);
        let available = self.styles.available(&persona.name, &candidates);

        let (style, mode) = if self.roll(self.config.p_impulsive_style) {
            (self.pick(&available), ChoiceMode::Impulsive)
        } else {
            let prompt = self.context.style_choice(last_message, &candidates);
            match self.delegate(persona, &prompt, &candidates).await {
                Some(style) => (style, ChoiceMode::Logical),
                None => (self.quick_style(last_message, &available), ChoiceMode::Impulsive),
            }
        };

        self.styles.record(&persona.name, style.clone());
        (style, mode)
    }

    async fn choose_tactic(&mut self, persona: &Persona, style: &str) -> (String, ChoiceMode) {
        let candidates = non_blank(&persona.possible_tactics);
        let available = self.tactics.available(&persona.name, &candidates);

        let (tactic, mode) = if self.roll(self.config.p_impulsive_tactic) {
            (self.pick(&available), ChoiceMode::Impulsive)
        } else {
            let prompt = self.context.tactic_choice(style, &available);
            match self.delegate(persona, &prompt, &available).await {
                Some(tactic) => (tactic, ChoiceMode::Logical),
                None => (self.pick(&available), ChoiceMode::Impulsive),
            }
        };

        self.tactics.record(&persona.name, tactic.clone());
        (tactic, mode)
    }

    /// Ask the gateway to pick one of `options`.
    async fn delegate(&self, persona: &Persona, prompt: &str, options: &[String]) -> Option<String> {
        match self.gateway.generate(persona, prompt, false).await {
            Ok(answer) => {
                let chosen = normalize_choice(&answer, options);
                if chosen.is_none() {
                    debug!(persona = %persona.name, %answer, "Delegated answer matched no option");
                }
                chosen
            }
            Err(e) => {
                warn!(persona = %persona.name, "Delegated choice failed, picking at random: {e}");
                None
            }
        }
    }

    fn pick(&mut self, options: &[String]) -> String {
        options.choose(&mut self.rng).cloned().unwrap_or_default()
    }

    /// Short messages get a quip or a question when the persona has one.
    fn quick_style(&mut self, last_message: &str, available: &[String]) -> String {
        if last_message.chars().count() < SHORT_MESSAGE_CHARS {
            let quick: Vec<String> = available
                .iter()
                .filter(|s| {
                    let s = s.to_lowercase();
                    s.contains("quip") || s.contains("question")
                })
                .cloned()
                .collect();
            if !quick.is_empty() {
                return self.pick(&quick);
            }
        }
        self.pick(available)
    }
}
