//! Text-to-result flow tests
//!
//! Drive the rule engine and dispatcher together, the way the pipeline
//! does, without any audio or hardware in the picture.

use rovertalk::commands::DeviceContext;
use rovertalk::config::Config;
use rovertalk::dispatch::{DispatchStatus, Dispatcher, Effect};
use rovertalk::intent::{FallbackResponder, IntentKind, RuleEngine};
use rovertalk::radio::StationDirectory;

fn dispatcher() -> Dispatcher {
    let context = DeviceContext::new(&Config::default(), &StationDirectory::builtin());
    Dispatcher::new(context, FallbackResponder::disabled())
}

#[tokio::test]
async fn test_navigate_text_to_result() {
    let engine = RuleEngine::builtin();
    let intent = engine.match_text("take me to the cafeteria");
    assert_eq!(intent.kind, IntentKind::Navigate);

    let result = dispatcher().dispatch(&intent).await;
    assert_eq!(result.status, DispatchStatus::Acknowledged);
    assert!(result.message.to_lowercase().contains("cafeteria"));
    assert!(result.has_effect(Effect::SendRoverRun));
}

#[tokio::test]
async fn test_estop_wins_over_navigation_tokens() {
    let engine = RuleEngine::builtin();
    // Both an estop token and a navigation token in one utterance
    let intent = engine.match_text("stop the rover");
    assert_eq!(intent.kind, IntentKind::Estop);

    let result = dispatcher().dispatch(&intent).await;
    assert_eq!(result.status, DispatchStatus::Acknowledged);
    assert!(result.deferred_effects.is_empty());
}

#[tokio::test]
async fn test_radio_text_to_result() {
    let engine = RuleEngine::builtin();

    let play = engine.match_text("play some music");
    assert_eq!(play.kind, IntentKind::PlayRadio);
    let result = dispatcher().dispatch(&play).await;
    assert!(result.has_effect(Effect::StartRadio));

    let pause = engine.match_text("pause");
    assert_eq!(pause.kind, IntentKind::PauseRadio);
    let result = dispatcher().dispatch(&pause).await;
    assert!(result.deferred_effects.is_empty());
}

#[tokio::test]
async fn test_help_covers_the_rule_set() {
    let engine = RuleEngine::builtin();
    let intent = engine.match_text("what can you do");
    assert_eq!(intent.kind, IntentKind::Help);

    let result = dispatcher().dispatch(&intent).await;
    let message = result.message.to_lowercase();

    // Every user-facing destination and action shows up
    for needle in ["cafeteria", "radio", "pause", "dance", "stop"] {
        assert!(message.contains(needle), "help is missing '{needle}'");
    }
}

#[tokio::test]
async fn test_unmatched_text_reaches_fallback() {
    let engine = RuleEngine::builtin();
    let intent = engine.match_text("what is the airspeed velocity of an unladen swallow");
    assert_eq!(intent.kind, IntentKind::Unknown);
    assert_eq!(intent.confidence, 0.0);

    // Chat disabled: still a spoken, non-crashing outcome
    let result = dispatcher().dispatch(&intent).await;
    assert_eq!(result.status, DispatchStatus::Conversation);
    assert!(!result.message.is_empty());
}
