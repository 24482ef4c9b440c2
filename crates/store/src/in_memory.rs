//! In-memory thread store, useful for testing and throwaway runs.

use async_trait::async_trait;
use chrono::Utc;
use genesis_core::error::StoreError;
use genesis_core::thread::{
    Comment, CommentId, NewComment, NewPost, Notification, Post, PostId, ThreadStore,
};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_post_id: i64,
    next_comment_id: i64,
}

/// A thread store that keeps everything in Vecs.
/// Nothing survives the process.
pub struct InMemoryThreadStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                next_post_id: 1,
                next_comment_id: 1,
                ..State::default()
            })),
        }
    }
}

impl Default for InMemoryThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError> {
        let mut state = self.state.write().await;
        let id = PostId(state.next_post_id);
        state.next_post_id += 1;
        state.posts.push(Post {
            id,
            subreddit: post.subreddit,
            author: post.author,
            title: post.title,
            content: post.content,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        let mut state = self.state.write().await;

        if !state.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(StoreError::PostNotFound(comment.post_id.0));
        }

        if let Some(parent) = comment.parent_comment_id {
            let valid = state
                .comments
                .iter()
                .any(|c| c.id == parent && c.post_id == comment.post_id);
            if !valid {
                return Err(StoreError::InvalidParent {
                    post: comment.post_id.0,
                    parent: parent.0,
                });
            }
        }

        let id = CommentId(state.next_comment_id);
        state.next_comment_id += 1;
        state.comments.push(Comment {
            id,
            post_id: comment.post_id,
            author: comment.author,
            content: comment.content,
            parent_comment_id: comment.parent_comment_id,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn mark_read(&self, id: CommentId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::CommentNotFound(id.0))?;
        comment.is_read = true;
        Ok(())
    }

    async fn recent_posts_for_interests(
        &self,
        interests: &[String],
        exclude_author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.author != exclude_author && interests.contains(&p.subreddit))
            .cloned()
            .collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn latest_unread_comment_on_own_posts(
        &self,
        author: &str,
    ) -> Result<Option<Notification>, StoreError> {
        let state = self.state.read().await;
        let notification = state
            .comments
            .iter()
            .filter(|c| !c.is_read && c.author != author)
            .filter_map(|c| {
                state
                    .posts
                    .iter()
                    .find(|p| p.id == c.post_id && p.author == author)
                    .map(|p| (c, p))
            })
            .max_by_key(|(c, _)| (c.created_at, c.id))
            .map(|(c, p)| Notification {
                comment: c.clone(),
                post_title: p.title.clone(),
            });
        Ok(notification)
    }

    async fn recent_comments_on_post(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| Reverse((c.created_at, c.id)));
        comments.truncate(limit);
        Ok(comments)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn subreddits(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let names: BTreeSet<String> = state.posts.iter().map(|p| p.subreddit.clone()).collect();
        Ok(names.into_iter().collect())
    }

    async fn posts_in_subreddit(&self, subreddit: &str) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.subreddit == subreddit)
            .cloned()
            .collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));
        Ok(posts)
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(subreddit: &str, author: &str, title: &str) -> NewPost {
        NewPost {
            subreddit: subreddit.into(),
            author: author.into(),
            title: title.into(),
            content: String::new(),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = InMemoryThreadStore::new();
        let a = store.create_post(new_post("r/a", "x", "1")).await.unwrap();
        let b = store.create_post(new_post("r/a", "x", "2")).await.unwrap();
        assert_eq!(a, PostId(1));
        assert_eq!(b, PostId(2));
    }

    #[tokio::test]
    async fn rejects_broken_linkage() {
        let store = InMemoryThreadStore::new();
        assert!(matches!(
            store
                .create_comment(NewComment::on_post(PostId(3), "x", "?"))
                .await,
            Err(StoreError::PostNotFound(3))
        ));

        let post = store.create_post(new_post("r/a", "x", "1")).await.unwrap();
        assert!(matches!(
            store
                .create_comment(NewComment::on_post(post, "y", "?").replying_to(CommentId(9)))
                .await,
            Err(StoreError::InvalidParent { .. })
        ));
    }

    #[tokio::test]
    async fn notification_excludes_self_and_read() {
        let store = InMemoryThreadStore::new();
        let post = store.create_post(new_post("r/a", "helios", "Mine")).await.unwrap();
        store
            .create_comment(NewComment::on_post(post, "helios", "me"))
            .await
            .unwrap();
        assert!(store.latest_unread_comment_on_own_posts("helios").await.unwrap().is_none());

        let c = store
            .create_comment(NewComment::on_post(post, "nyx", "you"))
            .await
            .unwrap();
        let note = store.latest_unread_comment_on_own_posts("helios").await.unwrap().unwrap();
        assert_eq!(note.comment.id, c);
        assert_eq!(note.post_title, "Mine");

        store.mark_read(c).await.unwrap();
        assert!(store.latest_unread_comment_on_own_posts("helios").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scroll_excludes_own_posts_and_other_subs() {
        let store = InMemoryThreadStore::new();
        store.create_post(new_post("r/a", "nyx", "own")).await.unwrap();
        store.create_post(new_post("r/b", "helios", "elsewhere")).await.unwrap();
        store.create_post(new_post("r/a", "helios", "match")).await.unwrap();

        let posts = store
            .recent_posts_for_interests(&["r/a".to_string()], "nyx", 10)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "match");
        assert!(store.recent_posts_for_interests(&[], "nyx", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ordering_matches_viewer_expectations() {
        let store = InMemoryThreadStore::new();
        let p1 = store.create_post(new_post("r/b", "x", "first")).await.unwrap();
        store.create_post(new_post("r/a", "x", "other")).await.unwrap();
        store.create_post(new_post("r/b", "x", "second")).await.unwrap();
        let c1 = store.create_comment(NewComment::on_post(p1, "y", "1")).await.unwrap();
        let c2 = store.create_comment(NewComment::on_post(p1, "z", "2")).await.unwrap();

        assert_eq!(store.subreddits().await.unwrap(), vec!["r/a", "r/b"]);
        let titles: Vec<String> = store
            .posts_in_subreddit("r/b")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);

        let oldest_first: Vec<CommentId> =
            store.comments_for_post(p1).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(oldest_first, vec![c1, c2]);
        let newest_first: Vec<CommentId> =
            store.recent_comments_on_post(p1, 10).await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(newest_first, vec![c2, c1]);
    }
}
