//! Thread store trait: durable posts, threaded comments and read-state.
//!
//! Comments form a forest per post: a comment either hangs off the post root
//! (`parent_comment_id == None`) or off an earlier comment of the same post.
//! Implementations must reject a parent that does not exist or belongs to a
//! different post, which makes cycles impossible by construction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StoreError;

/// Store-assigned post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

/// Store-assigned comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A top-level post in a subreddit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub subreddit: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A reply to a post or to another comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: String,
    pub content: String,

    /// `None` means the comment replies to the post itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<CommentId>,

    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

/// Fields for a post about to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub subreddit: String,
    pub author: String,
    pub title: String,
    pub content: String,
}

/// Fields for a comment about to be created.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub author: String,
    pub content: String,
    pub parent_comment_id: Option<CommentId>,
}

impl NewComment {
    /// A reply to the post root.
    pub fn on_post(post_id: PostId, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_id,
            author: author.into(),
            content: content.into(),
            parent_comment_id: None,
        }
    }

    /// Thread this comment under `parent`.
    pub fn replying_to(mut self, parent: CommentId) -> Self {
        self.parent_comment_id = Some(parent);
        self
    }
}

/// An unread comment on one of a persona's own posts.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub comment: Comment,
    pub post_title: String,
}

/// The core ThreadStore trait.
///
/// Implementations: SQLite, in-memory (for testing).
/// All list queries are bounded by `limit` and return most-recent-first unless
/// documented otherwise.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Create a post and return its id.
    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError>;

    /// Create a comment and return its id.
    ///
    /// Fails with `PostNotFound` or `InvalidParent` when the linkage is broken.
    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError>;

    /// Flag a comment as read.
    async fn mark_read(&self, id: CommentId) -> Result<(), StoreError>;

    /// Recent posts in any of `interests`, excluding those by `exclude_author`.
    ///
    /// An empty interest set matches nothing.
    async fn recent_posts_for_interests(
        &self,
        interests: &[String],
        exclude_author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError>;

    /// The most recent unread comment by someone else on a post by `author`.
    async fn latest_unread_comment_on_own_posts(
        &self,
        author: &str,
    ) -> Result<Option<Notification>, StoreError>;

    /// Recent comments on a post.
    async fn recent_comments_on_post(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Fetch a post by id.
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// Distinct subreddits that have at least one post, ascending.
    async fn subreddits(&self) -> Result<Vec<String>, StoreError>;

    /// All posts in a subreddit, newest first.
    async fn posts_in_subreddit(&self, subreddit: &str) -> Result<Vec<Post>, StoreError>;

    /// All comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError>;
}

/// A comment together with its replies.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// A post's comments reconstructed as a forest by parent id.
#[derive(Debug, Clone, Default)]
pub struct CommentForest {
    pub roots: Vec<CommentNode>,
}

impl CommentForest {
    /// Build the forest from a flat list.
    ///
    /// Siblings keep creation order. A comment whose parent is missing from
    /// the list is promoted to a root so nothing is hidden.
    pub fn build(mut comments: Vec<Comment>) -> Self {
        comments.sort_by_key(|c| (c.created_at, c.id));

        let present: std::collections::HashSet<CommentId> =
            comments.iter().map(|c| c.id).collect();
        let mut children: HashMap<Option<CommentId>, Vec<Comment>> = HashMap::new();
        for comment in comments {
            let key = comment.parent_comment_id.filter(|p| present.contains(p));
            children.entry(key).or_default().push(comment);
        }

        fn attach(
            parent: Option<CommentId>,
            children: &mut HashMap<Option<CommentId>, Vec<Comment>>,
        ) -> Vec<CommentNode> {
            children
                .remove(&parent)
                .unwrap_or_default()
                .into_iter()
                .map(|comment| {
                    let replies = attach(Some(comment.id), children);
                    CommentNode { comment, replies }
                })
                .collect()
        }

        Self { roots: attach(None, &mut children) }
    }

    /// Depth-first walk yielding `(depth, comment)`.
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        fn visit<'a>(nodes: &'a [CommentNode], depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
            for node in nodes {
                out.push((depth, &node.comment));
                visit(&node.replies, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.roots, 0, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
