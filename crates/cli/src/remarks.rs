//! Moderator remarks: one console line per simulation event.

use genesis_core::event::{EventBus, SimEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// The remark for `event`, if any.
///
/// Commits and failures are always reported. Style, tactic, notification
/// and lurk decisions only when `decisions` is set.
pub fn remark(event: &SimEvent, decisions: bool) -> Option<String> {
    match event {
        SimEvent::TopicChosen { subreddit, topic, .. } => {
            Some(format!("<Moderator opens {subreddit}: {topic}>"))
        }
        SimEvent::PostCreated {
            persona,
            subreddit,
            title,
            post_id,
            ..
        } => Some(format!("<{persona} posts #{post_id} in {subreddit}: '{title}'>")),
        SimEvent::CommentCreated {
            persona,
            post_id,
            parent_comment_id,
            ..
        } => Some(match parent_comment_id {
            Some(parent) => format!("<{persona} replies to comment #{parent} on post #{post_id}>"),
            None => format!("<{persona} replies on post #{post_id}>"),
        }),
        SimEvent::GenerationFailed {
            persona,
            error_message,
            ..
        } => Some(format!("<{persona} could not speak: {error_message}>")),
        SimEvent::StoreFailed {
            persona,
            operation,
            error_message,
            ..
        } => Some(format!("<{operation} for {persona} was dropped: {error_message}>")),
        SimEvent::StyleChosen {
            persona,
            style,
            mode,
            ..
        } if decisions => Some(format!("<{persona} {mode} chooses style: {style}>")),
        SimEvent::TacticChosen {
            persona,
            tactic,
            mode,
            ..
        } if decisions => Some(format!("<{persona} {mode} chooses tactic: {tactic}>")),
        SimEvent::NotificationSeen {
            persona,
            from,
            post_title,
            ..
        } if decisions => Some(format!("<{persona} sees a reply from {from} on '{post_title}'>")),
        SimEvent::Lurked { persona, reason, .. } if decisions => {
            Some(format!("<{persona} lurks: {reason}>"))
        }
        _ => None,
    }
}

/// Print remarks until the task is aborted.
pub fn spawn(events: &EventBus, decisions: bool) -> JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = remark(&event, decisions) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Remark printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use genesis_core::event::ChoiceMode;

    #[test]
    fn style_remark_names_mode() {
        let event = SimEvent::StyleChosen {
            persona: "nyx".into(),
            style: "sarcastic".into(),
            mode: ChoiceMode::Impulsive,
            timestamp: Utc::now(),
        };
        assert_eq!(
            remark(&event, true).as_deref(),
            Some("<nyx impulsively chooses style: sarcastic>")
        );
        assert!(remark(&event, false).is_none());
    }

    #[test]
    fn threaded_comment_remark_mentions_parent() {
        let event = SimEvent::CommentCreated {
            persona: "helios".into(),
            post_id: 3,
            comment_id: 9,
            parent_comment_id: Some(7),
            timestamp: Utc::now(),
        };
        assert_eq!(
            remark(&event, false).as_deref(),
            Some("<helios replies to comment #7 on post #3>")
        );
    }

    #[test]
    fn lurk_is_a_decision_remark() {
        let event = SimEvent::Lurked {
            persona: "nyx".into(),
            reason: "nothing new to read".into(),
            timestamp: Utc::now(),
        };
        assert!(remark(&event, false).is_none());
        assert_eq!(
            remark(&event, true).as_deref(),
            Some("<nyx lurks: nothing new to read>")
        );
    }
}
