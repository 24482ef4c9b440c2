//! Per-persona repetition windows for tactics and styles.
//!
//! A window remembers the last `K` values a persona picked on one axis.
//! Values in the window are excluded from the next pick, unless that would
//! exclude everything, in which case the full candidate list is offered again.
//! The window is a soft preference; it can never deadlock selection.

use std::collections::{HashMap, VecDeque};

/// The last `capacity` choices on one axis, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CooldownWindow {
    capacity: usize,
    entries: VecDeque<String>,
}

impl CooldownWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a choice, evicting the oldest once at capacity.
    pub fn record(&mut self, value: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(value.into());
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|v| v == value)
    }

    pub fn entries(&self) -> Vec<&str> {
        self.entries.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cooldown windows for every persona on one axis (tactics or styles).
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    capacity: usize,
    windows: HashMap<String, CooldownWindow>,
}

impl CooldownTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `candidates` minus the persona's window, in the original order.
    ///
    /// Falls back to all of `candidates` when the window covers every one.
    pub fn available(&self, persona: &str, candidates: &[String]) -> Vec<String> {
        let Some(window) = self.windows.get(persona) else {
            return candidates.to_vec();
        };

        let open: Vec<String> = candidates
            .iter()
            .filter(|c| !window.contains(c))
            .cloned()
            .collect();

        if open.is_empty() {
            candidates.to_vec()
        } else {
            open
        }
    }

    /// Remember a choice for `persona`.
    pub fn record(&mut self, persona: &str, chosen: impl Into<String>) {
        let capacity = self.capacity;
        self.windows
            .entry(persona.to_string())
            .or_insert_with(|| CooldownWindow::new(capacity))
            .record(chosen);
    }

    pub fn window(&self, persona: &str) -> Option<&CooldownWindow> {
        self.windows.get(persona)
    }
}
