//! Dance command handler

use crate::commands::DeviceContext;
use crate::dispatch::{DispatchResult, Effect};
use crate::intent::Intent;
use anyhow::Result;
use tracing::info;

/// Perform the dance routine: music first, then the DANCE signal, both
/// deferred until the spoken reply finishes.
pub fn handle(_intent: &Intent, _ctx: &DeviceContext) -> Result<DispatchResult> {
    info!("💃 Dance command: song and DANCE signal queued for after speech");

    Ok(DispatchResult::acknowledged("Let me show you my moves!")
        .with_effect(Effect::PlayDanceSong)
        .with_effect(Effect::SendRoverDance))
}
