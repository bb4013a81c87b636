//! Intent dispatcher
//!
//! Routes intents to their command handlers and normalizes every outcome,
//! including handler failures, into a DispatchResult. Help and Unknown
//! are special-cased outside the handler table.

use crate::commands::{self, DeviceContext};
use crate::error::RoverError;
use crate::intent::fallback::SAFE_REPLY;
use crate::intent::{FallbackResponder, Intent, IntentKind};
use std::collections::BTreeSet;
use tracing::{error, info, warn};

/// How a dispatch turned out, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Command understood and (possibly deferred) action taken
    Acknowledged,
    /// Command understood but refused, or a handler failed
    Error,
    /// Free-form chat reply rather than a command
    Conversation,
}

/// A side effect a handler wants applied after the spoken response.
///
/// Declaration order is execution priority: the derived `Ord` gives a
/// total order over effect kinds, so the loop applies a BTreeSet of
/// these front to back. The dance song must start before any hardware
/// signal; StartRadio is never applied in the effect stage, it feeds
/// the ambient-restore decision instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    PlayDanceSong,
    SendRoverDance,
    SendRoverRun,
    StartRadio,
}

/// Uniform result record: one per dispatch, consumed exactly once
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub status: DispatchStatus,
    pub message: String,
    pub deferred_effects: BTreeSet<Effect>,
    /// Speak this reply in the persona voice instead of the plain one
    pub use_persona_voice: bool,
}

impl DispatchResult {
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Acknowledged,
            message: message.into(),
            deferred_effects: BTreeSet::new(),
            use_persona_voice: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Error,
            message: message.into(),
            deferred_effects: BTreeSet::new(),
            use_persona_voice: false,
        }
    }

    pub fn conversation(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Conversation,
            message: message.into(),
            deferred_effects: BTreeSet::new(),
            use_persona_voice: true,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.deferred_effects.insert(effect);
        self
    }

    pub fn has_effect(&self, effect: Effect) -> bool {
        self.deferred_effects.contains(&effect)
    }
}

/// Maps intents to handlers and absorbs their failures
pub struct Dispatcher {
    context: DeviceContext,
    fallback: FallbackResponder,
}

impl Dispatcher {
    pub fn new(context: DeviceContext, fallback: FallbackResponder) -> Self {
        Self { context, fallback }
    }

    /// Route an intent to its handler.
    ///
    /// Never fails: handler errors and fallback failures come back as
    /// Error-status results. No side effects beyond logging.
    pub async fn dispatch(&self, intent: &Intent) -> DispatchResult {
        info!("🚦 Dispatching intent: {}", intent);

        // Help bypasses the handler table
        if intent.kind == IntentKind::Help {
            return self.handle_help();
        }

        // Unknown goes to the conversational fallback
        if intent.kind == IntentKind::Unknown {
            return match self.fallback.respond(&intent.raw_text).await {
                Ok(reply) => DispatchResult::conversation(reply),
                Err(e) => {
                    error!("Conversation failed: {}", e);
                    DispatchResult::error(SAFE_REPLY)
                }
            };
        }

        let outcome = match intent.kind {
            IntentKind::Navigate => commands::navigate::handle(intent, &self.context),
            IntentKind::PlayRadio => commands::play_radio::handle(intent, &self.context),
            IntentKind::PauseRadio => commands::pause_radio::handle(intent, &self.context),
            IntentKind::Dance => commands::dance::handle(intent, &self.context),
            IntentKind::Estop => commands::estop::handle(intent, &self.context),
            // Future intents land here until they get a handler
            IntentKind::Help | IntentKind::Unknown => {
                warn!("No handler for intent: {:?}", intent.kind);
                Ok(DispatchResult::error(format!(
                    "no handler for {:?}",
                    intent.kind
                )))
            }
        };

        match outcome {
            Ok(result) => {
                info!("✅ Handler completed: {:?}", result.status);
                result
            }
            Err(e) => {
                error!("{}", RoverError::Handler(e.to_string()));
                DispatchResult::error(format!("command failed: {}", e))
            }
        }
    }

    /// Static capability listing. Built from the device context so every
    /// supported destination and action shows up.
    fn handle_help(&self) -> DispatchResult {
        let destinations = self.context.destinations.join(", ");
        DispatchResult::acknowledged(format!(
            "I can drive to the {destinations}, play the radio, pause the radio, \
             dance for you, or stop everything if you say stop. What would you like?"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use crate::intent::ChatBackend;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct CannedChat(Result<String, String>);

    #[async_trait]
    impl ChatBackend for CannedChat {
        async fn generate_reply(&self, _text: &str) -> Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => anyhow::bail!("{}", e.clone()),
            }
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(test_context(), FallbackResponder::disabled())
    }

    fn navigate_to(destination: &str) -> Intent {
        Intent::matched(
            IntentKind::Navigate,
            HashMap::from([("destination".to_string(), destination.to_string())]),
            &format!("take me to the {destination}"),
        )
    }

    #[tokio::test]
    async fn test_navigate_dispatch() {
        let result = dispatcher().dispatch(&navigate_to("cafeteria")).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.message.to_lowercase().contains("cafeteria"));
        assert!(result.has_effect(Effect::SendRoverRun));
    }

    #[tokio::test]
    async fn test_navigate_unsupported_destination() {
        let result = dispatcher().dispatch(&navigate_to("moon")).await;
        assert_eq!(result.status, DispatchStatus::Error);
        assert!(result.message.contains("moon"));
        assert!(!result.has_effect(Effect::SendRoverRun));
        assert!(result.deferred_effects.is_empty());
    }

    #[tokio::test]
    async fn test_play_radio_dispatch() {
        let intent = Intent::matched(IntentKind::PlayRadio, HashMap::new(), "play the radio");
        let result = dispatcher().dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.has_effect(Effect::StartRadio));
    }

    #[tokio::test]
    async fn test_pause_radio_has_no_effects() {
        let intent = Intent::matched(IntentKind::PauseRadio, HashMap::new(), "pause");
        let result = dispatcher().dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.deferred_effects.is_empty());
    }

    #[tokio::test]
    async fn test_dance_dispatch() {
        let intent = Intent::matched(IntentKind::Dance, HashMap::new(), "dance");
        let result = dispatcher().dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.has_effect(Effect::SendRoverDance));
        assert!(result.has_effect(Effect::PlayDanceSong));
    }

    #[tokio::test]
    async fn test_estop_dispatch() {
        let intent = Intent::matched(IntentKind::Estop, HashMap::new(), "stop");
        let result = dispatcher().dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);
    }

    #[tokio::test]
    async fn test_help_mentions_everything() {
        let intent = Intent::matched(IntentKind::Help, HashMap::new(), "help");
        let result = dispatcher().dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Acknowledged);

        let message = result.message.to_lowercase();
        for needle in ["cafeteria", "radio", "pause", "dance", "stop"] {
            assert!(message.contains(needle), "help should mention '{needle}'");
        }
    }

    #[tokio::test]
    async fn test_unknown_conversation_success() {
        let dispatcher = Dispatcher::new(
            test_context(),
            FallbackResponder::new(Arc::new(CannedChat(Ok("lovely day for a drive".to_string())))),
        );
        let intent = Intent::unknown("how are you feeling");
        let result = dispatcher.dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Conversation);
        assert_eq!(result.message, "lovely day for a drive");
        assert!(result.use_persona_voice);
    }

    #[tokio::test]
    async fn test_unknown_conversation_failure_is_absorbed() {
        let dispatcher = Dispatcher::new(
            test_context(),
            FallbackResponder::new(Arc::new(CannedChat(Err("timeout".to_string())))),
        );
        let intent = Intent::unknown("how are you feeling");
        let result = dispatcher.dispatch(&intent).await;
        assert_eq!(result.status, DispatchStatus::Error);
        assert_eq!(result.message, SAFE_REPLY);
    }

    #[tokio::test]
    async fn test_dispatch_is_pure() {
        let dispatcher = dispatcher();
        let intent = Intent::matched(IntentKind::Dance, HashMap::new(), "dance");
        let first = dispatcher.dispatch(&intent).await;
        let second = dispatcher.dispatch(&intent).await;
        assert_eq!(first.status, second.status);
        assert_eq!(first.deferred_effects, second.deferred_effects);
    }

    #[test]
    fn test_effect_total_order() {
        // Dance song starts before any hardware signal; run comes last
        let mut effects = BTreeSet::new();
        effects.insert(Effect::SendRoverRun);
        effects.insert(Effect::PlayDanceSong);
        effects.insert(Effect::SendRoverDance);

        let ordered: Vec<Effect> = effects.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Effect::PlayDanceSong,
                Effect::SendRoverDance,
                Effect::SendRoverRun
            ]
        );
    }
}
