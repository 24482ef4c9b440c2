//! Debate topics: a JSON array of `{subreddit, topic}` records.

use genesis_core::error::TopicError;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub subreddit: String,
    pub topic: String,
}

/// Load the topic list. A missing, unreadable or empty file is an error.
pub fn load_topics(path: &Path) -> Result<Vec<Topic>, TopicError> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let topics: Vec<Topic> = serde_json::from_str(&content).map_err(|e| TopicError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if topics.is_empty() {
        return Err(TopicError::Empty(path.to_path_buf()));
    }
    Ok(topics)
}

/// Pick one topic uniformly at random.
pub fn pick_topic<'a, R: Rng + ?Sized>(topics: &'a [Topic], rng: &mut R) -> Option<&'a Topic> {
    topics.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn loads_topic_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");
        std::fs::write(
            &path,
            r#"[{"subreddit": "r/philosophy", "topic": "Free will"},
                {"subreddit": "r/tech", "topic": "AI art"}]"#,
        )
        .unwrap();

        let topics = load_topics(&path).unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].subreddit, "r/tech");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_topics(Path::new("/nonexistent/topics.json")).unwrap_err();
        assert!(matches!(err, TopicError::Read { .. }));
    }

    #[test]
    fn empty_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(load_topics(&path), Err(TopicError::Empty(_))));
    }

    #[test]
    fn pick_is_member_of_list() {
        let topics = vec![
            Topic { subreddit: "r/a".into(), topic: "one".into() },
            Topic { subreddit: "r/b".into(), topic: "two".into() },
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(topics.contains(pick_topic(&topics, &mut rng).unwrap()));
        }
        assert!(pick_topic(&[], &mut rng).is_none());
    }
}
