//! Intent model
//!
//! Value types describing a classified utterance. Pure data, no behavior.

pub mod fallback;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use fallback::{ChatBackend, FallbackResponder, HttpChat};
pub use rules::RuleEngine;

/// Closed set of things the rover knows how to do.
///
/// Serialized names match the rules file (`"NAVIGATE"`, `"PLAY_RADIO"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Navigate,
    PlayRadio,
    PauseRadio,
    Dance,
    Estop,
    Help,
    Unknown,
}

/// A classified utterance: what the user asked for, plus extracted slots.
///
/// Immutable once constructed. Confidence is 1.0 for any rule match and
/// 0.0 for Unknown; it is informational only.
#[derive(Debug, Clone)]
pub struct Intent {
    pub kind: IntentKind,
    pub slots: HashMap<String, String>,
    pub confidence: f32,
    /// Original transcript, before normalization
    pub raw_text: String,
}

impl Intent {
    /// Build an intent for a rule match
    pub fn matched(kind: IntentKind, slots: HashMap<String, String>, raw_text: &str) -> Self {
        Self {
            kind,
            slots,
            confidence: 1.0,
            raw_text: raw_text.to_string(),
        }
    }

    /// The sentinel returned when no rule matches
    pub fn unknown(raw_text: &str) -> Self {
        Self {
            kind: IntentKind::Unknown,
            slots: HashMap::new(),
            confidence: 0.0,
            raw_text: raw_text.to_string(),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if !self.slots.is_empty() {
            let mut keys: Vec<_> = self.slots.iter().collect();
            keys.sort();
            let slots: Vec<String> = keys.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            write!(f, " [{}]", slots.join(", "))?;
        }
        Ok(())
    }
}
