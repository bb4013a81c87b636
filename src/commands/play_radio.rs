//! Play radio command handler

use crate::commands::DeviceContext;
use crate::dispatch::{DispatchResult, Effect};
use crate::intent::Intent;
use anyhow::Result;
use tracing::info;

/// Start radio playback. The stream starts AFTER the spoken reply, so
/// the handler only declares the effect.
pub fn handle(_intent: &Intent, ctx: &DeviceContext) -> Result<DispatchResult> {
    info!("📻 Radio command: will start {} after speech", ctx.default_station);

    Ok(DispatchResult::acknowledged(format!(
        "Tuning in to {}. Enjoy the music!",
        ctx.default_station
    ))
    .with_effect(Effect::StartRadio))
}
