//! `genesis view`: read the forum as threaded discussions.

use genesis_core::error::StoreError;
use genesis_core::thread::{CommentForest, Post, ThreadStore};
use std::path::Path;
use std::time::Duration;

use super::{CliResult, load_config, open_store};

pub async fn run(
    config_path: Option<&Path>,
    subreddit: Option<String>,
    follow: bool,
    interval: u64,
) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    loop {
        let page = render_forum(&*store, subreddit.as_deref()).await?;
        if follow {
            // Clear the terminal and home the cursor before each refresh
            print!("\x1B[2J\x1B[H");
            println!(
                "Genesis forum @ {} (refresh every {interval}s, Ctrl-C to quit)\n",
                chrono::Local::now().format("%H:%M:%S")
            );
        }
        println!("{page}");

        if !follow {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(Duration::from_secs(interval.max(1))) => {}
        }
    }
}

/// Every subreddit (or just `only`), newest posts first, comments indented
/// by reply depth.
pub async fn render_forum(store: &dyn ThreadStore, only: Option<&str>) -> Result<String, StoreError> {
    let subreddits = match only {
        Some(s) => vec![s.to_string()],
        None => store.subreddits().await?,
    };
    if subreddits.is_empty() {
        return Ok("The forum is empty. Run `genesis debate` or `genesis world` first.".into());
    }

    let mut out = String::new();
    for subreddit in subreddits {
        out.push_str(&format!("=== {subreddit} ===\n"));
        let posts = store.posts_in_subreddit(&subreddit).await?;
        if posts.is_empty() {
            out.push_str("  (no posts)\n");
        }
        for post in posts {
            render_post(store, &post, &mut out).await?;
        }
        out.push('\n');
    }
    Ok(out)
}

async fn render_post(store: &dyn ThreadStore, post: &Post, out: &mut String) -> Result<(), StoreError> {
    out.push_str(&format!(
        "\n[#{}] {}  (by {}, {})\n",
        post.id,
        post.title,
        post.author,
        post.created_at.format("%Y-%m-%d %H:%M")
    ));
    for line in post.content.lines() {
        out.push_str(&format!("    {line}\n"));
    }

    let forest = CommentForest::build(store.comments_for_post(post.id).await?);
    for (depth, comment) in forest.walk() {
        let indent = "    ".repeat(depth + 1);
        let mut lines = comment.content.lines();
        let first = lines.next().unwrap_or_default();
        out.push_str(&format!("{indent}└ {}: {first}\n", comment.author));
        for line in lines {
            out.push_str(&format!("{indent}  {line}\n"));
        }
    }
    Ok(())
}
