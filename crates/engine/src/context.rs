//! Prompt assembly: the persona's system identity and every instruction the
//! engine sends to the generation backend.

use genesis_core::persona::Persona;
use genesis_core::thread::Comment;
use std::fmt::Write;

use crate::policy::ReplyPlan;

/// Permission to draw on the private backstory; only added for anecdote tactics.
pub const BACKSTORY_CLAUSE: &str =
    "If required you can briefly reference your personal backstory to make your point.";

/// Closes every reply instruction.
pub const VOICE_DIRECTIVE: &str = "CRUCIALLY, you MUST reflect your specific voice.";

/// The system prompt for `persona`.
///
/// Biography and defining moment are included only with `include_backstory`.
pub fn system_identity(persona: &Persona, include_backstory: bool) -> String {
    let mut prompt = format!(
        "You are a human being in an online discussion.\n\
         Your identity:\n\
         - Name: {}\n\
         - Archetype: {}\n\
         - From: {}\n\
         - Voice: {}\n\
         You must stay in character. Do not reveal you are an AI.",
        persona.name, persona.archetype, persona.demographics.location, persona.speech_patterns,
    );

    if include_backstory {
        let _ = write!(
            prompt,
            "\n\n== SECRET KNOWLEDGE: YOUR BACKSTORY ==\n\
             Your Bio: {}\n\
             Your Defining Moment: {}",
            persona.biography_summary, persona.defining_moment,
        );
    }
    prompt
}

/// Which kind of contribution a transcript line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Post,
    Reply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub author: String,
    pub content: String,
}

/// The in-memory conversation of one debate, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_post(&mut self, author: impl Into<String>, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            kind: EntryKind::Post,
            author: author.into(),
            content: content.into(),
        });
    }

    pub fn push_reply(&mut self, author: impl Into<String>, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            kind: EntryKind::Reply,
            author: author.into(),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent line as rendered in the thread.
    pub fn last_line(&self) -> Option<String> {
        self.entries.last().map(Self::render_entry)
    }

    /// One `[POST by x]: ...` / `[REPLY by x]: ...` line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(Self::render_entry)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_entry(entry: &TranscriptEntry) -> String {
        let tag = match entry.kind {
            EntryKind::Post => "POST",
            EntryKind::Reply => "REPLY",
        };
        format!("[{tag} by {}]: {}", entry.author, entry.content)
    }
}

/// Builds the instructions for each kind of generation request.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    style_hint_chars: usize,
}

impl ContextBuilder {
    pub fn new(style_hint_chars: usize) -> Self {
        Self { style_hint_chars }
    }

    /// Ask for a style, showing a prefix of the last message.
    pub fn style_choice(&self, last_message: &str, styles: &[String]) -> String {
        let hint: String = last_message.chars().take(self.style_hint_chars).collect();
        format!(
            "Given the last comment was: \"{hint}...\"\n\
             Which of these reply styles is the most logical choice for you? {}\n\
             Just simply choose ONE option from the list, no need to explain why.",
            format_options(styles),
        )
    }

    /// Ask for a tactic compatible with the chosen style.
    pub fn tactic_choice(&self, style: &str, tactics: &[String]) -> String {
        format!(
            "Your chosen reply style will be '{style}'.\n\
             Given the last comment, which of these tactics is the most logical choice for you? {}\n\
             Just simply choose ONE option from the list, no need to explain why.",
            format_options(tactics),
        )
    }

    /// First post of a debate.
    pub fn opening_post(&self, subreddit: &str, topic: &str) -> String {
        format!(
            "You are starting a new thread in {subreddit} on the topic: '{topic}'. \
             Write a concise opening post."
        )
    }

    /// Title for a seed post.
    pub fn seed_title(&self, topic: &str) -> String {
        format!("Generate a short, catchy title for a post about '{topic}'.")
    }

    /// Body of a seed post.
    pub fn seed_post(&self, subreddit: &str, topic: &str) -> String {
        format!("You are making a post in '{subreddit}' about '{topic}'. Write a concise post.")
    }

    /// A debate reply given the whole conversation so far.
    pub fn debate_reply(&self, transcript: &Transcript, plan: &ReplyPlan) -> String {
        format!(
            "The conversation so far:\n{}\n\nYour Task: Write a reply.\n{}",
            transcript.render(),
            plan_bullets(plan),
        )
    }

    /// A reply to a post or comment found while scrolling.
    pub fn thread_reply(
        &self,
        post_title: &str,
        target_kind: &str,
        target_author: &str,
        target_content: &str,
        plan: &ReplyPlan,
    ) -> String {
        format!(
            "You are in a thread titled '{post_title}'. You are replying to a {target_kind} \
             from {target_author} that says: '{target_content}'.\n\
             Your Task: Write a direct reply.\n{}",
            plan_bullets(plan),
        )
    }

    /// A reply to a comment left on the persona's own post.
    pub fn notification_reply(&self, post_title: &str, comment: &Comment, plan: &ReplyPlan) -> String {
        format!(
            "You are replying to a comment on your post '{post_title}'. \
             The comment from {} is: '{}'.\n\
             Your Task: Write a reply.\n{}",
            comment.author,
            comment.content,
            plan_bullets(plan),
        )
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(200)
    }
}

fn format_options(options: &[String]) -> String {
    let quoted: Vec<String> = options.iter().map(|o| format!("'{o}'")).collect();
    format!("[{}]", quoted.join(", "))
}

fn plan_bullets(plan: &ReplyPlan) -> String {
    let mut bullets = format!("- Style: {}\n- Tactic: {}\n", plan.style, plan.tactic);
    if plan.use_full_backstory {
        let _ = writeln!(bullets, "- {BACKSTORY_CLAUSE}");
    }
    bullets.push_str("- ");
    bullets.push_str(VOICE_DIRECTIVE);
    bullets
}
