//! Pause radio command handler

use crate::commands::DeviceContext;
use crate::dispatch::DispatchResult;
use crate::intent::Intent;
use anyhow::Result;
use tracing::info;

/// Keep the radio paused. The loop already paused it before capture;
/// a PauseRadio intent just suppresses the auto-resume afterwards.
pub fn handle(_intent: &Intent, _ctx: &DeviceContext) -> Result<DispatchResult> {
    info!("⏸️ Pause radio command: radio stays paused");

    Ok(DispatchResult::acknowledged("Radio paused."))
}
