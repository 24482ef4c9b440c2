//! SQLite thread store.
//!
//! Uses a single SQLite database file with two tables:
//! - `posts`: one row per top-level post
//! - `comments`: replies, threaded through `parent_comment_id`
//!
//! Timestamps are stored as RFC 3339 text with microsecond precision so that
//! lexical order equals chronological order. Ties break on id.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use genesis_core::error::StoreError;
use genesis_core::thread::{
    Comment, CommentId, NewComment, NewPost, Notification, Post, PostId, ThreadStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A durable thread store backed by SQLite.
pub struct SqliteThreadStore {
    pool: SqlitePool,
}

impl SqliteThreadStore {
    /// Open (or create) the store at `path`.
    ///
    /// Accepts a plain file path, a `sqlite:` URL, or `":memory:"` /
    /// `"sqlite::memory:"` for an ephemeral in-process database.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}")
        };
        let ephemeral = url.contains(":memory:");

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(if ephemeral {
                SqliteJournalMode::Memory
            } else {
                SqliteJournalMode::Wal
            })
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // Every connection to ":memory:" is its own database, so pin to one.
        let pool_options = if ephemeral {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite thread store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations. Creates tables and indexes.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                subreddit   TEXT NOT NULL,
                author_name TEXT NOT NULL,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("posts table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id           INTEGER NOT NULL REFERENCES posts(id),
                author_name       TEXT NOT NULL,
                content           TEXT NOT NULL,
                parent_comment_id INTEGER REFERENCES comments(id),
                is_read           INTEGER NOT NULL DEFAULT 0,
                timestamp         TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("comments table: {e}")))?;

        for (name, ddl) in [
            (
                "posts subreddit index",
                "CREATE INDEX IF NOT EXISTS idx_posts_subreddit ON posts(subreddit, timestamp DESC)",
            ),
            (
                "posts author index",
                "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_name)",
            ),
            (
                "comments post index",
                "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, timestamp DESC)",
            ),
            (
                "comments unread index",
                "CREATE INDEX IF NOT EXISTS idx_comments_unread ON comments(is_read, post_id)",
            ),
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{name}: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse a stored timestamp. Also accepts SQLite's `CURRENT_TIMESTAMP`
    /// format so databases written by other tools still load.
    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.with_timezone(&Utc);
        }
        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            Ok(naive) => naive.and_utc(),
            Err(_) => {
                warn!(raw, "Unparseable timestamp, using epoch");
                DateTime::<Utc>::UNIX_EPOCH
            }
        }
    }

    fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post, StoreError> {
        let get_text = |col: &str| -> Result<String, StoreError> {
            row.try_get(col)
                .map_err(|e| StoreError::QueryFailed(format!("{col} column: {e}")))
        };
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;

        Ok(Post {
            id: PostId(id),
            subreddit: get_text("subreddit")?,
            author: get_text("author_name")?,
            title: get_text("title")?,
            content: get_text("content")?,
            created_at: Self::parse_timestamp(&get_text("timestamp")?),
        })
    }

    fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment, StoreError> {
        let get_text = |col: &str| -> Result<String, StoreError> {
            row.try_get(col)
                .map_err(|e| StoreError::QueryFailed(format!("{col} column: {e}")))
        };
        let get_int = |col: &str| -> Result<i64, StoreError> {
            row.try_get(col)
                .map_err(|e| StoreError::QueryFailed(format!("{col} column: {e}")))
        };
        let parent: Option<i64> = row
            .try_get("parent_comment_id")
            .map_err(|e| StoreError::QueryFailed(format!("parent_comment_id column: {e}")))?;

        Ok(Comment {
            id: CommentId(get_int("id")?),
            post_id: PostId(get_int("post_id")?),
            author: get_text("author_name")?,
            content: get_text("content")?,
            parent_comment_id: parent.map(CommentId),
            is_read: get_int("is_read")? != 0,
            created_at: Self::parse_timestamp(&get_text("timestamp")?),
        })
    }
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, StoreError> {
        let result = sqlx::query(
            "INSERT INTO posts (subreddit, author_name, title, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&post.subreddit)
        .bind(&post.author)
        .bind(&post.title)
        .bind(&post.content)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to insert post: {e}")))?;

        let id = PostId(result.last_insert_rowid());
        debug!(post_id = %id, subreddit = %post.subreddit, author = %post.author, "Post created");
        Ok(id)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to begin transaction: {e}")))?;

        let post_exists = sqlx::query("SELECT 1 FROM posts WHERE id = ?1")
            .bind(comment.post_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("post lookup: {e}")))?
            .is_some();
        if !post_exists {
            return Err(StoreError::PostNotFound(comment.post_id.0));
        }

        if let Some(parent) = comment.parent_comment_id {
            let parent_post: Option<i64> = sqlx::query("SELECT post_id FROM comments WHERE id = ?1")
                .bind(parent.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("parent lookup: {e}")))?
                .map(|row| row.try_get::<i64, _>("post_id"))
                .transpose()
                .map_err(|e| StoreError::QueryFailed(format!("post_id column: {e}")))?;

            if parent_post != Some(comment.post_id.0) {
                return Err(StoreError::InvalidParent {
                    post: comment.post_id.0,
                    parent: parent.0,
                });
            }
        }

        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_name, content, parent_comment_id, is_read, timestamp)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        )
        .bind(comment.post_id.0)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(comment.parent_comment_id.map(|p| p.0))
        .bind(Self::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to insert comment: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to commit comment: {e}")))?;

        let id = CommentId(result.last_insert_rowid());
        debug!(comment_id = %id, post_id = %comment.post_id, author = %comment.author, "Comment created");
        Ok(id)
    }

    async fn mark_read(&self, id: CommentId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE comments SET is_read = 1 WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to mark read: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CommentNotFound(id.0));
        }
        Ok(())
    }

    async fn recent_posts_for_interests(
        &self,
        interests: &[String],
        exclude_author: &str,
        limit: usize,
    ) -> Result<Vec<Post>, StoreError> {
        if interests.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        // ?1 = excluded author, ?2 = limit, ?3.. = subreddits
        let placeholders: Vec<String> = (0..interests.len()).map(|i| format!("?{}", i + 3)).collect();
        let sql = format!(
            "SELECT * FROM posts
             WHERE subreddit IN ({}) AND author_name != ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
            placeholders.join(", ")
        );

        let mut query = sqlx::query(&sql).bind(exclude_author).bind(limit as i64);
        for subreddit in interests {
            query = query.bind(subreddit);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("interest scroll: {e}")))?;

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn latest_unread_comment_on_own_posts(
        &self,
        author: &str,
    ) -> Result<Option<Notification>, StoreError> {
        let row = sqlx::query(
            "SELECT c.*, p.title AS post_title
             FROM comments c
             JOIN posts p ON c.post_id = p.id
             WHERE p.author_name = ?1 AND c.author_name != ?1 AND c.is_read = 0
             ORDER BY c.timestamp DESC, c.id DESC
             LIMIT 1",
        )
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("notification lookup: {e}")))?;

        match row {
            Some(row) => {
                let post_title: String = row
                    .try_get("post_title")
                    .map_err(|e| StoreError::QueryFailed(format!("post_title column: {e}")))?;
                Ok(Some(Notification {
                    comment: Self::row_to_comment(&row)?,
                    post_title,
                }))
            }
            None => Ok(None),
        }
    }

    async fn recent_comments_on_post(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE post_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )
        .bind(post_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("recent comments: {e}")))?;

        rows.iter().map(Self::row_to_comment).collect()
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("get post: {e}")))?;

        row.as_ref().map(Self::row_to_post).transpose()
    }

    async fn subreddits(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT subreddit FROM posts ORDER BY subreddit ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("subreddits: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get("subreddit")
                    .map_err(|e| StoreError::QueryFailed(format!("subreddit column: {e}")))
            })
            .collect()
    }

    async fn posts_in_subreddit(&self, subreddit: &str) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM posts WHERE subreddit = ?1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(subreddit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("posts in subreddit: {e}")))?;

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE post_id = ?1 ORDER BY timestamp ASC, id ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("comments for post: {e}")))?;

        rows.iter().map(Self::row_to_comment).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteThreadStore {
        SqliteThreadStore::new("sqlite::memory:").await.unwrap()
    }

    fn new_post(subreddit: &str, author: &str, title: &str) -> NewPost {
        NewPost {
            subreddit: subreddit.into(),
            author: author.into(),
            title: title.into(),
            content: format!("{title} body"),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_post() {
        let db = test_store().await;
        let id = db
            .create_post(new_post("r/philosophy", "helios", "On minds"))
            .await
            .unwrap();

        let post = db.get_post(id).await.unwrap().unwrap();
        assert_eq!(post.title, "On minds");
        assert_eq!(post.author, "helios");
        assert!(db.get_post(PostId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn comment_on_missing_post_rejected() {
        let db = test_store().await;
        let err = db
            .create_comment(NewComment::on_post(PostId(42), "nyx", "hello?"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PostNotFound(42)));
    }

    #[tokio::test]
    async fn parent_from_other_post_rejected() {
        let db = test_store().await;
        let a = db.create_post(new_post("r/a", "helios", "A")).await.unwrap();
        let b = db.create_post(new_post("r/b", "helios", "B")).await.unwrap();
        let on_a = db
            .create_comment(NewComment::on_post(a, "nyx", "on a"))
            .await
            .unwrap();

        let err = db
            .create_comment(NewComment::on_post(b, "jax", "cross").replying_to(on_a))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParent { .. }));

        let err = db
            .create_comment(NewComment::on_post(a, "jax", "ghost").replying_to(CommentId(77)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParent { parent: 77, .. }));
    }

    #[tokio::test]
    async fn threaded_comments_keep_parent() {
        let db = test_store().await;
        let post = db.create_post(new_post("r/a", "helios", "A")).await.unwrap();
        let root = db
            .create_comment(NewComment::on_post(post, "nyx", "first"))
            .await
            .unwrap();
        let reply = db
            .create_comment(NewComment::on_post(post, "helios", "answer").replying_to(root))
            .await
            .unwrap();

        let comments = db.comments_for_post(post).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, root);
        assert_eq!(comments[1].id, reply);
        assert_eq!(comments[1].parent_comment_id, Some(root));
        assert!(!comments[0].is_read);
    }

    #[tokio::test]
    async fn interest_scroll_filters_and_orders() {
        let db = test_store().await;
        db.create_post(new_post("r/tech", "nyx", "mine")).await.unwrap();
        db.create_post(new_post("r/tech", "helios", "old")).await.unwrap();
        db.create_post(new_post("r/cooking", "helios", "off-topic")).await.unwrap();
        db.create_post(new_post("r/art", "jax", "new")).await.unwrap();

        let interests = vec!["r/tech".to_string(), "r/art".to_string()];
        let posts = db
            .recent_posts_for_interests(&interests, "nyx", 10)
            .await
            .unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);

        let limited = db
            .recent_posts_for_interests(&interests, "nyx", 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].title, "new");
    }

    #[tokio::test]
    async fn empty_interests_match_nothing() {
        let db = test_store().await;
        db.create_post(new_post("r/tech", "helios", "x")).await.unwrap();
        let posts = db.recent_posts_for_interests(&[], "nyx", 10).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn notification_is_latest_unread_from_others() {
        let db = test_store().await;
        let post = db.create_post(new_post("r/a", "helios", "Mine")).await.unwrap();
        db.create_comment(NewComment::on_post(post, "helios", "self note"))
            .await
            .unwrap();
        let older = db
            .create_comment(NewComment::on_post(post, "nyx", "older"))
            .await
            .unwrap();
        let newer = db
            .create_comment(NewComment::on_post(post, "jax", "newer"))
            .await
            .unwrap();

        let note = db
            .latest_unread_comment_on_own_posts("helios")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.comment.id, newer);
        assert_eq!(note.post_title, "Mine");

        db.mark_read(newer).await.unwrap();
        let note = db
            .latest_unread_comment_on_own_posts("helios")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.comment.id, older);

        db.mark_read(older).await.unwrap();
        assert!(db.latest_unread_comment_on_own_posts("helios").await.unwrap().is_none());
        assert!(db.latest_unread_comment_on_own_posts("nyx").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_read_missing_comment() {
        let db = test_store().await;
        let err = db.mark_read(CommentId(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::CommentNotFound(5)));
    }

    #[tokio::test]
    async fn recent_comments_are_newest_first_and_bounded() {
        let db = test_store().await;
        let post = db.create_post(new_post("r/a", "helios", "A")).await.unwrap();
        for i in 0..5 {
            db.create_comment(NewComment::on_post(post, "nyx", format!("c{i}")))
                .await
                .unwrap();
        }
        let recent = db.recent_comments_on_post(post, 3).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["c4", "c3", "c2"]);
    }

    #[tokio::test]
    async fn subreddits_are_distinct_and_sorted() {
        let db = test_store().await;
        db.create_post(new_post("r/zen", "a", "1")).await.unwrap();
        db.create_post(new_post("r/art", "b", "2")).await.unwrap();
        db.create_post(new_post("r/zen", "c", "3")).await.unwrap();

        assert_eq!(db.subreddits().await.unwrap(), vec!["r/art", "r/zen"]);
        let zen = db.posts_in_subreddit("r/zen").await.unwrap();
        assert_eq!(zen[0].title, "3");
        assert_eq!(zen[1].title, "1");
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.db");
        let path = path.to_str().unwrap();

        {
            let db = SqliteThreadStore::new(path).await.unwrap();
            db.create_post(new_post("r/a", "helios", "Persisted")).await.unwrap();
        }

        let db = SqliteThreadStore::new(path).await.unwrap();
        let posts = db.posts_in_subreddit("r/a").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Persisted");
    }

    #[test]
    fn parses_legacy_timestamps() {
        let ts = SqliteThreadStore::parse_timestamp("2024-05-01 12:30:00");
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }
}
