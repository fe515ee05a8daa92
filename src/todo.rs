// Data model for the todo list

use serde::{Deserialize, Serialize};

/// A single task entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    /// Manual ordering hint. Views follow array position, not this field.
    pub order: i64,
}

impl Todo {
    pub fn new(id: i64, text: impl Into<String>, order: i64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            order,
        }
    }
}

/// Completion counts over the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
    /// Percentage in 0..=100, zero for an empty list
    pub progress: f64,
}

impl CompletionStats {
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64) * 100.0
        };

        Self {
            completed,
            total,
            progress,
        }
    }
}

/// Current timestamp in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next todo id: the clock, bumped past `latest` so ids stay increasing
pub fn next_id(latest: Option<i64>) -> i64 {
    let now = now_ms();
    match latest {
        Some(latest) if latest >= now => latest.saturating_add(1),
        _ => now,
    }
}
