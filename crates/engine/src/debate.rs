//! Turn-based debate: one opening post, then strict round-robin replies.
//!
//! The roster is fixed up front and must hold at least two distinct personas.
//! A random participant opens the thread on the chosen topic (with its full
//! backstory available); every other turn is a top-level reply on that post,
//! starting with the participant after the opener.

use genesis_config::PacingConfig;
use genesis_core::error::{Error, Result};
use genesis_core::event::SimEvent;
use genesis_core::persona::Persona;
use genesis_core::thread::{CommentId, NewComment, NewPost, PostId, ThreadStore};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::context::Transcript;
use crate::policy::{DecisionPolicy, ReplyPlan};
use crate::topics::{Topic, pick_topic};

/// One persisted debate turn.
#[derive(Debug, Clone)]
pub struct DebateTurn {
    pub author: String,
    pub comment_id: Option<CommentId>,
    pub plan: ReplyPlan,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DebateOutcome {
    pub topic: Topic,
    pub opener: String,
    pub post_id: PostId,
    pub turns: Vec<DebateTurn>,
    pub transcript: Transcript,
}

pub struct DebateSession {
    participants: Vec<Persona>,
    store: Arc<dyn ThreadStore>,
    policy: DecisionPolicy,
    turns_per_persona: u32,
    pacing: PacingConfig,
}

impl DebateSession {
    /// Fails on a repeated name or fewer than two participants.
    pub fn new(
        participants: Vec<Persona>,
        store: Arc<dyn ThreadStore>,
        policy: DecisionPolicy,
        turns_per_persona: u32,
    ) -> Result<Self> {
        let mut distinct: HashSet<&str> = HashSet::new();
        for p in &participants {
            if !distinct.insert(p.name.as_str()) {
                return Err(Error::DuplicateParticipant(p.name.clone()));
            }
        }
        if distinct.len() < 2 {
            return Err(Error::NotEnoughParticipants {
                needed: 2,
                got: distinct.len(),
            });
        }

        Ok(Self {
            participants,
            store,
            policy,
            turns_per_persona,
            pacing: PacingConfig::default(),
        })
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Pick the debate topic uniformly at random.
    pub fn pick_topic(&mut self, topics: &[Topic]) -> Option<Topic> {
        pick_topic(topics, self.policy.rng()).cloned()
    }

    /// Run the whole debate on `topic`.
    ///
    /// Only a failure to store the opening post aborts the run; everything
    /// after that degrades turn by turn.
    pub async fn run(&mut self, topic: Topic) -> Result<DebateOutcome> {
        self.policy.events().publish(SimEvent::TopicChosen {
            subreddit: topic.subreddit.clone(),
            topic: topic.topic.clone(),
            timestamp: chrono::Utc::now(),
        });
        info!(subreddit = %topic.subreddit, topic = %topic.topic, "Debate starting");

        let count = self.participants.len();
        let opener_index = self.policy.rng().random_range(0..count);
        let opener = self.participants[opener_index].clone();

        let instruction = self
            .policy
            .context()
            .opening_post(&topic.subreddit, &topic.topic);
        let opening = self.generate(&opener, &instruction, true).await;

        let post_id = self
            .store
            .create_post(NewPost {
                subreddit: topic.subreddit.clone(),
                author: opener.name.clone(),
                title: topic.topic.clone(),
                content: opening.clone(),
            })
            .await?;
        self.policy.events().publish(SimEvent::PostCreated {
            persona: opener.name.clone(),
            subreddit: topic.subreddit.clone(),
            title: topic.topic.clone(),
            post_id: post_id.0,
            timestamp: chrono::Utc::now(),
        });
        info!(persona = %opener.name, post_id = %post_id, "Opening post created");

        let mut transcript = Transcript::new();
        transcript.push_post(&opener.name, &opening);

        let total = self.turns_per_persona as usize * count;
        let mut turns = Vec::with_capacity(total);
        for turn in 0..total {
            let speaker = self.participants[(opener_index + 1 + turn) % count].clone();
            let last = transcript.last_line().unwrap_or_default();

            let plan = self.policy.plan_reply(&speaker, &last).await;
            let instruction = self.policy.context().debate_reply(&transcript, &plan);
            let reply = self.generate(&speaker, &instruction, plan.use_full_backstory).await;

            let comment_id = match self
                .store
                .create_comment(NewComment::on_post(post_id, &speaker.name, &reply))
                .await
            {
                Ok(id) => {
                    self.policy.events().publish(SimEvent::CommentCreated {
                        persona: speaker.name.clone(),
                        post_id: post_id.0,
                        comment_id: id.0,
                        parent_comment_id: None,
                        timestamp: chrono::Utc::now(),
                    });
                    Some(id)
                }
                Err(e) => {
                    self.policy.store_failed(&speaker.name, "create debate reply", &e);
                    None
                }
            };

            info!(turn = turn + 1, of = total, persona = %speaker.name, "Debate reply");
            transcript.push_reply(&speaker.name, &reply);
            turns.push(DebateTurn {
                author: speaker.name.clone(),
                comment_id,
                plan,
                content: reply,
            });

            tokio::time::sleep(Duration::from_millis(self.pacing.turn_delay_ms)).await;
        }

        info!(post_id = %post_id, replies = turns.len(), "Debate finished");
        Ok(DebateOutcome {
            topic,
            opener: opener.name,
            post_id,
            turns,
            transcript,
        })
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
}
