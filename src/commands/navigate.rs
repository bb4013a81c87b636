//! Navigation command handler

use crate::commands::DeviceContext;
use crate::dispatch::{DispatchResult, Effect};
use crate::intent::Intent;
use anyhow::Result;
use tracing::{info, warn};

/// Drive to a destination. The route itself lives on the rover's
/// controller; this only decides whether to send the RUN signal.
pub fn handle(intent: &Intent, ctx: &DeviceContext) -> Result<DispatchResult> {
    let destination = intent
        .slots
        .get("destination")
        .map(String::as_str)
        .unwrap_or("unknown");

    info!("🚗 Navigation command: going to {}", destination);

    if !ctx.is_destination(destination) {
        warn!(
            "   Unknown destination '{}' (available: {})",
            destination,
            ctx.destinations.join(", ")
        );
        // No deferred effect on a refused destination
        return Ok(DispatchResult::error(format!(
            "I don't know the way to the {destination} yet"
        )));
    }

    Ok(
        DispatchResult::acknowledged(format!("Heading to the {destination}"))
            .with_effect(Effect::SendRoverRun),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use crate::dispatch::DispatchStatus;
    use crate::intent::IntentKind;
    use std::collections::HashMap;

    fn intent_for(destination: &str) -> Intent {
        Intent::matched(
            IntentKind::Navigate,
            HashMap::from([("destination".to_string(), destination.to_string())]),
            "take me there",
        )
    }

    #[test]
    fn test_supported_destination() {
        let result = handle(&intent_for("cafeteria"), &test_context()).expect("handle");
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.has_effect(Effect::SendRoverRun));
    }

    #[test]
    fn test_unsupported_destination() {
        let result = handle(&intent_for("moon"), &test_context()).expect("handle");
        assert_eq!(result.status, DispatchStatus::Error);
        assert!(result.message.contains("moon"));
        assert!(result.deferred_effects.is_empty());
    }

    #[test]
    fn test_missing_slot() {
        let intent = Intent::matched(IntentKind::Navigate, HashMap::new(), "drive somewhere");
        let result = handle(&intent, &test_context()).expect("handle");
        assert_eq!(result.status, DispatchStatus::Error);
        assert!(result.deferred_effects.is_empty());
    }
}
