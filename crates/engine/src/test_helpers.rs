//! Shared fixtures for engine tests.

use async_trait::async_trait;
use genesis_config::DecisionConfig;
use genesis_core::error::{GenerationError, StoreError};
use genesis_core::event::EventBus;
use genesis_core::message::Message;
use genesis_core::persona::{Demographics, Persona};
use genesis_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use genesis_core::thread::{
    Comment, CommentId, NewComment, NewPost, Notification, Post, PostId, ThreadStore,
};
use genesis_store::InMemoryThreadStore;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::gateway::GenerationGateway;
use crate::policy::DecisionPolicy;

/// A persona with three styles and three tactics, one of them an anecdote.
pub fn persona(name: &str, home: Option<&str>, interests: &[&str]) -> Persona {
    Persona {
        name: name.into(),
        archetype: "contrarian".into(),
        demographics: Demographics {
            location: "Lisbon".into(),
        },
        speech_patterns: "short, punchy sentences".into(),
        biography_summary: format!("{name} grew up above a bookshop"),
        defining_moment: format!("{name} lost a chess final on time"),
        home_subreddit: home.map(String::from),
        scrolling_interests: interests.iter().map(|s| s.to_string()).collect(),
        reply_style_preference: vec!["terse".into(), "sarcastic".into(), "long-form".into()],
        possible_tactics: vec![
            "cite anecdote".into(),
            "rebuttal".into(),
            "ask clarifying question".into(),
        ],
        activity_level: 0.5,
    }
}

/// Write `persona(...)` as `<dir>/<name>.json`.
pub fn write_persona(dir: &Path, name: &str, home: Option<&str>, interests: &[&str]) {
    let json = serde_json::to_string_pretty(&persona(name, home, interests)).unwrap();
    std::fs::write(dir.join(format!("{name}.json")), json).unwrap();
}

/// Returns scripted replies in order, then keeps repeating the last one.
/// Records every request it sees.
pub struct ScriptedProvider {
    replies: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: replies.into_iter().map(String::from).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len().min(self.replies.len().saturating_sub(1));
        let text = self.replies.get(index).cloned().unwrap_or_default();
        let model = request.model.clone();
        requests.push(request);
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// Fails every request.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        Err(GenerationError::Network("connection refused".into()))
    }
}

pub fn stub_gateway() -> Arc<GenerationGateway> {
    Arc::new(GenerationGateway::new(
        Arc::new(ScriptedProvider::new(vec!["A reply."])),
        "test-model",
    ))
}

pub fn policy_with(config: DecisionConfig, gateway: Arc<GenerationGateway>) -> DecisionPolicy {
    DecisionPolicy::new(config, gateway, Arc::new(EventBus::default()))
}

/// In-memory store that counts scroll queries.
pub struct CountingStore {
    inner: InMemoryThreadStore,
    scroll_queries: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryThreadStore::new(),
            scroll_queries: AtomicUsize::new(0),
        }
    }

    pub fn scroll_queries(&self) -> usize {
        self.scroll_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThreadStore for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError> {
        self.inner.create_post(post).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        self.inner.create_comment(comment).await
    }

    async fn mark_read(&self, id: CommentId) -> Result<(), StoreError> {
        self.inner.mark_read(id).await
    }

    async fn recent_posts_for_interests(
        &self,
        interests: &[String],
        exclude_author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        self.scroll_queries.fetch_add(1, Ordering::SeqCst);
        self.inner
            .recent_posts_for_interests(interests, exclude_author, limit)
            .await
    }

    async fn latest_unread_comment_on_own_posts(
        &self,
        author: &str,
    ) -> Result<Option<Notification>, StoreError> {
        self.inner.latest_unread_comment_on_own_posts(author).await
    }

    async fn recent_comments_on_post(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        self.inner.recent_comments_on_post(post_id, limit).await
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.inner.get_post(id).await
    }

    async fn subreddits(&self) -> Result<Vec<String>, StoreError> {
        self.inner.subreddits().await
    }

    async fn posts_in_subreddit(&self, subreddit: &str) -> Result<Vec<Post>, StoreError> {
        self.inner.posts_in_subreddit(subreddit).await
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        self.inner.comments_for_post(post_id).await
    }
}
