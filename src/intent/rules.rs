//! Intent rule engine
//!
//! Ordered regex rules loaded from a declarative JSON list. Rules are
//! evaluated in file order and that order IS the priority order: the
//! emergency-stop rule sits above navigation so "stop the rover" can
//! never be read as a drive request.

use crate::intent::{Intent, IntentKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// One rule entry as it appears in the rules file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: IntentKind,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub slots: HashMap<String, String>,
}

/// A rule with its patterns compiled
struct Rule {
    kind: IntentKind,
    patterns: Vec<Regex>,
    default_slots: HashMap<String, String>,
}

/// Rule-based intent matcher
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Build an engine from rule specs, skipping malformed patterns
    pub fn new(specs: Vec<RuleSpec>) -> Self {
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for raw in &spec.patterns {
                match Regex::new(raw) {
                    Ok(re) => patterns.push(re),
                    Err(e) => warn!("⚠️ Skipping invalid pattern '{}': {}", raw, e),
                }
            }
            if patterns.is_empty() {
                warn!("⚠️ Rule {:?} has no usable patterns, skipping", spec.name);
                continue;
            }
            rules.push(Rule {
                kind: spec.name,
                patterns,
                default_slots: spec.slots,
            });
        }

        info!("📋 Loaded {} intent rules", rules.len());
        Self { rules }
    }

    /// Engine with the built-in rule set
    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }

    /// Load rules from a JSON file, falling back to the built-in set when
    /// the file is missing. Malformed entries are skipped, not fatal.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No rules file at {:?}, using built-in rules", path);
            return Self::builtin();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => Self::new(parse_rule_specs(&content)),
            Err(e) => {
                warn!("⚠️ Failed to read rules from {:?}: {}", path, e);
                Self::builtin()
            }
        }
    }

    /// Match input text against the rules in order; first match wins.
    ///
    /// Pure function of the rule list and the input: no state is mutated.
    /// Returns the Unknown sentinel when nothing matches.
    pub fn match_text(&self, text: &str) -> Intent {
        let normalized = text.trim().to_lowercase();

        debug!("Matching text: '{}'", normalized);

        for rule in &self.rules {
            for pattern in &rule.patterns {
                if pattern.is_match(&normalized) {
                    info!(
                        "🎯 Matched intent {:?} (pattern: {})",
                        rule.kind,
                        pattern.as_str()
                    );
                    return Intent::matched(rule.kind, rule.default_slots.clone(), text);
                }
            }
        }

        warn!("❓ No intent matched for: '{}'", text);
        Intent::unknown(text)
    }

    /// Intent kinds the rule set exposes, in priority order
    pub fn known_kinds(&self) -> Vec<IntentKind> {
        self.rules.iter().map(|r| r.kind).collect()
    }
}

/// Parse rule specs from a JSON document, skipping malformed entries
fn parse_rule_specs(content: &str) -> Vec<RuleSpec> {
    let doc: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            warn!("⚠️ Rules file is not valid JSON, using built-in rules: {}", e);
            return builtin_rules();
        }
    };

    let entries = match doc.get("intents").and_then(|v| v.as_array()) {
        Some(arr) => arr.clone(),
        None => {
            warn!("⚠️ Rules file has no 'intents' list, using built-in rules");
            return builtin_rules();
        }
    };

    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<RuleSpec>(entry.clone()) {
            Ok(spec) => specs.push(spec),
            Err(e) => warn!("⚠️ Skipping malformed rule entry: {}", e),
        }
    }
    specs
}

/// The built-in rule set. Order matters: Estop outranks everything.
fn builtin_rules() -> Vec<RuleSpec> {
    let destination_slot = HashMap::from([("destination".to_string(), "cafeteria".to_string())]);

    vec![
        RuleSpec {
            name: IntentKind::Estop,
            patterns: vec![
                r"emergency stop".to_string(),
                r"\be[- ]?stop\b".to_string(),
                r"\bstop\b".to_string(),
                r"\bhalt\b".to_string(),
            ],
            slots: HashMap::new(),
        },
        RuleSpec {
            name: IntentKind::Navigate,
            patterns: vec![
                r"\b(take me|drive|go|navigate) to\b.*\b(cafeteria|canteen|food court)\b"
                    .to_string(),
                r"\b(cafeteria|canteen|food court)\b".to_string(),
            ],
            slots: destination_slot,
        },
        RuleSpec {
            name: IntentKind::PauseRadio,
            patterns: vec![
                r"\bpause\b".to_string(),
                r"turn (off|down) the (radio|music)".to_string(),
                r"\bquiet\b".to_string(),
            ],
            slots: HashMap::new(),
        },
        RuleSpec {
            name: IntentKind::PlayRadio,
            patterns: vec![
                r"\b(play|turn on|start)\b.*\b(radio|music|song|tunes|fm)\b".to_string(),
                r"\bradio\b".to_string(),
            ],
            slots: HashMap::new(),
        },
        RuleSpec {
            name: IntentKind::Dance,
            patterns: vec![
                r"\bdance\b".to_string(),
                r"show me your moves".to_string(),
                r"bust a move".to_string(),
            ],
            slots: HashMap::new(),
        },
        RuleSpec {
            name: IntentKind::Help,
            patterns: vec![
                r"\bhelp\b".to_string(),
                r"what can you do".to_string(),
                r"\bcommands?\b".to_string(),
            ],
            slots: HashMap::new(),
        },
    ]
}
