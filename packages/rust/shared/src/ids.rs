//! Identifier generation for synthesized sections.
//!
//! Production IDs embed a timestamp and a few random characters, so two runs
//! never agree. Tests inject [`SequentialIdGenerator`] instead.

use chrono::Utc;
use uuid::Uuid;

/// Source of unique ID tokens.
pub trait IdGenerator {
    /// Return a fresh token. Callers add their own prefix (`sec-`, `doc-`).
    fn next_id(&mut self) -> String;
}

/// `<unix-millis>-<counter>-<8 random hex chars>`.
///
/// The per-instance counter keeps IDs unique within a run even when many
/// are drawn in the same millisecond.
#[derive(Debug, Default, Clone)]
pub struct TimestampIdGenerator {
    issued: u64,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        let millis = Utc::now().timestamp_millis();
        let entropy = Uuid::now_v7().simple().to_string();
        // v7 keeps its random bits at the tail.
        let suffix = &entropy[entropy.len() - 8..];
        format!("{millis}-{}-{suffix}", self.issued)
    }
}

/// Deterministic `1`, `2`, `3`, ... with an optional prefix.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}{}", self.prefix, self.next)
    }
}
