//! The autonomous world: seed posts, then one persona turn per tick.
//!
//! Who acts on a tick is decided by a [`TurnOrder`]; what they do is decided
//! by the [`DecisionPolicy`]. Turns never overlap. A shutdown signal is only
//! observed between turns and between seed posts, so every committed action
//! is complete.

use genesis_config::{PacingConfig, ScheduleStrategy};
use genesis_core::error::Error;
use genesis_core::event::SimEvent;
use genesis_core::persona::Persona;
use genesis_core::thread::{CommentId, NewComment, NewPost, Notification, Post, ThreadStore};
use rand::Rng;
use rand::rngs::StdRng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::policy::{DecisionPolicy, ReplyTarget, TurnAction};

/// Chooses the roster index that acts next.
pub trait TurnOrder: Send {
    fn name(&self) -> &'static str;

    /// Index into a roster of `roster_len` (> 0) personas.
    fn next(&mut self, roster_len: usize, rng: &mut StdRng) -> usize;
}

/// Fixed successor order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl TurnOrder for RoundRobin {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn next(&mut self, roster_len: usize, _rng: &mut StdRng) -> usize {
        let index = self.cursor % roster_len;
        self.cursor = (index + 1) % roster_len;
        index
    }
}

/// A uniformly random persona every tick.
#[derive(Debug, Default)]
pub struct RandomTick;

impl TurnOrder for RandomTick {
    fn name(&self) -> &'static str {
        "random_tick"
    }

    fn next(&mut self, roster_len: usize, rng: &mut StdRng) -> usize {
        rng.random_range(0..roster_len)
    }
}

/// A full round-robin sweep followed by one random pick, repeated.
#[derive(Debug, Default)]
pub struct Hybrid {
    position: usize,
}

impl TurnOrder for Hybrid {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn next(&mut self, roster_len: usize, rng: &mut StdRng) -> usize {
        let cycle = roster_len + 1;
        let position = self.position % cycle;
        self.position = (position + 1) % cycle;
        if position < roster_len {
            position
        } else {
            rng.random_range(0..roster_len)
        }
    }
}

pub fn turn_order_for(strategy: ScheduleStrategy) -> Box<dyn TurnOrder> {
    match strategy {
        ScheduleStrategy::RoundRobin => Box::new(RoundRobin::default()),
        ScheduleStrategy::RandomTick => Box::new(RandomTick),
        ScheduleStrategy::Hybrid => Box::new(Hybrid::default()),
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Acted { persona: String, comment_id: CommentId },
    Lurked { persona: String, reason: String },
    /// The persona acted but the store rejected the result
    Dropped { persona: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldRunSummary {
    pub seed_posts: usize,
    pub ticks: u64,
    pub actions: u64,
    pub lurks: u64,
    pub interrupted: bool,
}

pub struct WorldScheduler {
    personas: Vec<Persona>,
    store: Arc<dyn ThreadStore>,
    policy: DecisionPolicy,
    order: Box<dyn TurnOrder>,
    pacing: PacingConfig,
    seed_topic: String,
    max_ticks: Option<u64>,
}

impl WorldScheduler {
    /// Any roster of at least one persona can run.
    pub fn new(
        personas: Vec<Persona>,
        store: Arc<dyn ThreadStore>,
        policy: DecisionPolicy,
        order: Box<dyn TurnOrder>,
    ) -> Result<Self, Error> {
        if personas.is_empty() {
            return Err(Error::NotEnoughParticipants { needed: 1, got: 0 });
        }
        Ok(Self {
            personas,
            store,
            policy,
            order,
            pacing: PacingConfig::default(),
            seed_topic: "The nature of consciousness".into(),
            max_ticks: None,
        })
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_seed_topic(mut self, topic: impl Into<String>) -> Self {
        self.seed_topic = topic.into();
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Seed posts, then tick until `max_ticks` or `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> WorldRunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = WorldRunSummary::default();

        info!(
            personas = self.personas.len(),
            strategy = self.order.name(),
            max_ticks = ?self.max_ticks,
            "World starting"
        );

        if fired_within(&mut shutdown, Duration::ZERO).await {
            summary.interrupted = true;
            return summary;
        }
        let (seed_posts, interrupted) = self.seed_until(shutdown.as_mut()).await;
        summary.seed_posts = seed_posts;
        summary.interrupted = interrupted;

        while !summary.interrupted {
            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            let outcome = self.tick().await;
            summary.ticks += 1;
            let pause = match &outcome {
                TickOutcome::Acted { .. } | TickOutcome::Dropped { .. } => {
                    summary.actions += 1;
                    Duration::from_millis(self.pacing.action_delay_ms)
                }
                TickOutcome::Lurked { .. } => {
                    summary.lurks += 1;
                    let [min, max] = self.pacing.lurk_delay_secs;
                    Duration::from_secs(self.policy.rng().random_range(min..=max))
                }
            };
            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => summary.interrupted = true,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(
            ticks = summary.ticks,
            seed_posts = summary.seed_posts,
            actions = summary.actions,
            lurks = summary.lurks,
            interrupted = summary.interrupted,
            "World stopped"
        );
        summary
    }

    /// Every persona with a home subreddit opens one post on the seed topic.
    pub async fn seed_world(&mut self) -> usize {
        let never = std::pin::pin!(std::future::pending::<()>());
        self.seed_until(never).await.0
    }

    /// Seed posts until done or until `shutdown` fires during the stagger
    /// between two seeders. Returns the posts created and whether seeding
    /// was cut short. A seeder that has started always finishes its post.
    async fn seed_until<F>(&mut self, mut shutdown: Pin<&mut F>) -> (usize, bool)
    where
        F: Future<Output = ()>,
    {
        let seeders: Vec<Persona> = self
            .personas
            .iter()
            .filter(|p| p.home_subreddit.is_some())
            .cloned()
            .collect();

        let mut created = 0;
        for (i, persona) in seeders.iter().enumerate() {
            let Some(home) = persona.home_subreddit.as_deref() else {
                continue;
            };
            let stagger = Duration::from_millis(self.pacing.stagger_ms);
            if i > 0 && fired_within(&mut shutdown, stagger).await {
                info!(created, remaining = seeders.len() - i, "Seeding interrupted");
                return (created, true);
            }

            let title_prompt = self.policy.context().seed_title(&self.seed_topic);
            let raw_title = self.generate(persona, &title_prompt, false).await;
            let title = clean_title(&raw_title, &self.seed_topic);

            let body_prompt = self.policy.context().seed_post(home, &self.seed_topic);
            let content = self.generate(persona, &body_prompt, false).await;

            let post = NewPost {
                subreddit: home.to_string(),
                author: persona.name.clone(),
                title: title.clone(),
                content,
            };
            match self.store.create_post(post).await {
                Ok(post_id) => {
                    created += 1;
                    info!(persona = %persona.name, subreddit = home, %title, "Seed post created");
                    self.policy.events().publish(SimEvent::PostCreated {
                        persona: persona.name.clone(),
                        subreddit: home.to_string(),
                        title,
                        post_id: post_id.0,
                        timestamp: chrono::Utc::now(),
                    });
                }
                Err(e) => self.policy.store_failed(&persona.name, "create seed post", &e),
            }
        }
        (created, false)
    }

    /// One persona's full turn.
    pub async fn tick(&mut self) -> TickOutcome {
        let index = self.order.next(self.personas.len(), self.policy.rng());
        let persona = self.personas[index].clone();
        debug!(persona = %persona.name, "Tick");

        match self.policy.decide(&persona, self.store.as_ref()).await {
            TurnAction::ReplyToNotification(notification) => {
                self.reply_to_notification(&persona, notification).await
            }
            TurnAction::ReplyInThread { post, target } => {
                self.reply_in_thread(&persona, post, target).await
            }
            TurnAction::Lurk { reason } => {
                info!(persona = %persona.name, %reason, "Lurking");
                self.policy.events().publish(SimEvent::Lurked {
                    persona: persona.name.clone(),
                    reason: reason.clone(),
                    timestamp: chrono::Utc::now(),
                });
                TickOutcome::Lurked {
                    persona: persona.name,
                    reason,
                }
            }
        }
    }

    async fn reply_to_notification(&mut self, persona: &Persona, notification: Notification) -> TickOutcome {
        let comment = &notification.comment;
        info!(
            persona = %persona.name,
            from = %comment.author,
            post = %notification.post_title,
            "Answering a notification"
        );
        self.policy.events().publish(SimEvent::NotificationSeen {
            persona: persona.name.clone(),
            from: comment.author.clone(),
            post_title: notification.post_title.clone(),
            timestamp: chrono::Utc::now(),
        });

        let plan = self.policy.plan_reply(persona, &comment.content).await;
        let instruction = self
            .policy
            .context()
            .notification_reply(&notification.post_title, comment, &plan);
        let text = self.generate(persona, &instruction, plan.use_full_backstory).await;

        let reply = NewComment::on_post(comment.post_id, &persona.name, text).replying_to(comment.id);
        let Some(comment_id) = self.commit(persona, reply).await else {
            return TickOutcome::Dropped {
                persona: persona.name.clone(),
            };
        };

        if let Err(e) = self.store.mark_read(comment.id).await {
            self.policy.store_failed(&persona.name, "mark notification read", &e);
        }

        TickOutcome::Acted {
            persona: persona.name.clone(),
            comment_id,
        }
    }

    async fn reply_in_thread(&mut self, persona: &Persona, post: Post, target: ReplyTarget) -> TickOutcome {
        let (target_author, target_content) = match &target {
            ReplyTarget::Post => (post.author.as_str(), post.content.as_str()),
            ReplyTarget::Comment(c) => (c.author.as_str(), c.content.as_str()),
        };
        info!(
            persona = %persona.name,
            post = %post.title,
            target = target.kind(),
            to = target_author,
            "Replying in thread"
        );

        let plan = self.policy.plan_reply(persona, target_content).await;
        let instruction = self.policy.context().thread_reply(
            &post.title,
            target.kind(),
            target_author,
            target_content,
            &plan,
        );
        let text = self.generate(persona, &instruction, plan.use_full_backstory).await;

        let mut reply = NewComment::on_post(post.id, &persona.name, text);
        reply.parent_comment_id = target.parent_id();

        match self.commit(persona, reply).await {
            Some(comment_id) => TickOutcome::Acted {
                persona: persona.name.clone(),
                comment_id,
            },
            None => TickOutcome::Dropped {
                persona: persona.name.clone(),
            },
        }
    }

    async fn generate(&self, persona: &Persona, instruction: &str, include_backstory: bool) -> String {
        let (text, error) = self
            .policy
            .gateway()
            .generate_or_placeholder(persona, instruction, include_backstory)
            .await;
        if let Some(e) = error {
            self.policy.events().publish(SimEvent::GenerationFailed {
                persona: persona.name.clone(),
                error_message: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
        text
    }

    async fn commit(&self, persona: &Persona, comment: NewComment) -> Option<CommentId> {
        let post_id = comment.post_id;
        let parent = comment.parent_comment_id;
        match self.store.create_comment(comment).await {
            Ok(id) => {
                self.policy.events().publish(SimEvent::CommentCreated {
                    persona: persona.name.clone(),
                    post_id: post_id.0,
                    comment_id: id.0,
                    parent_comment_id: parent.map(|p| p.0),
                    timestamp: chrono::Utc::now(),
                });
                Some(id)
            }
            Err(e) => {
                self.policy.store_failed(&persona.name, "create comment", &e);
                None
            }
        }
    }
}

/// Wait up to `pause` for `shutdown`. A zero pause only checks whether it
/// has already fired.
async fn fired_within<F>(shutdown: &mut Pin<&mut F>, pause: Duration) -> bool
where
    F: Future<Output = ()>,
{
    if pause.is_zero() {
        return tokio::select! {
            biased;
            _ = shutdown => true,
            _ = std::future::ready(()) => false,
        };
    }
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = tokio::time::sleep(pause) => false,
    }
}

/// First non-empty line of a generated title, without wrapping quotes or markdown.
fn clean_title(raw: &str, fallback: &str) -> String {
    let title = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_start_matches('#')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`') || c.is_whitespace());
    if title.is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}
