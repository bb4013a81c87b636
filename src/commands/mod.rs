//! Command handlers
//!
//! One pure decision function per intent. Handlers never touch hardware
//! or audio themselves; they only declare the effects the orchestration
//! loop should apply after the spoken response finishes.

pub mod dance;
pub mod estop;
pub mod navigate;
pub mod pause_radio;
pub mod play_radio;

use crate::config::Config;
use crate::radio::StationDirectory;

/// Read-only view of the device handed to handlers.
///
/// Deliberately a stub: enough for handlers to make decisions, nothing
/// they could do I/O with.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    /// Destinations the rover has a stored route for
    pub destinations: Vec<String>,
    /// Station the radio tunes to by default
    pub default_station: String,
}

impl DeviceContext {
    pub fn new(config: &Config, stations: &StationDirectory) -> Self {
        Self {
            destinations: config.destinations.clone(),
            default_station: stations.default_name().to_string(),
        }
    }

    pub fn is_destination(&self, name: &str) -> bool {
        self.destinations.iter().any(|d| d == name)
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> DeviceContext {
    DeviceContext {
        destinations: vec!["cafeteria".to_string()],
        default_station: "92.5 FM".to_string(),
    }
}
