//! Emergency stop command handler

use crate::commands::DeviceContext;
use crate::dispatch::DispatchResult;
use crate::intent::Intent;
use anyhow::Result;
use tracing::warn;

/// Emergency stop. The halt signal is fatal-priority: the loop sends it
/// ahead of the spoken reply and ignores ambient/hardware failures, so
/// this handler only has to acknowledge.
pub fn handle(_intent: &Intent, _ctx: &DeviceContext) -> Result<DispatchResult> {
    warn!("🛑 EMERGENCY STOP activated");

    Ok(DispatchResult::acknowledged("Emergency stop activated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use crate::dispatch::DispatchStatus;
    use crate::intent::IntentKind;
    use std::collections::HashMap;

    #[test]
    fn test_acknowledges() {
        let intent = Intent::matched(IntentKind::Estop, HashMap::new(), "stop");
        let result = handle(&intent, &test_context()).expect("handle");
        assert_eq!(result.status, DispatchStatus::Acknowledged);
        assert!(result.deferred_effects.is_empty());
    }
}
