//! Audio capture and playback
//!
//! Capture is a bounded push-to-talk recording; playback runs on a
//! dedicated thread owning the output stream. The pipeline only sees
//! the two traits below.

pub mod capture;
pub mod playback;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use capture::PttRecorder;
pub use playback::SoundEngine;

/// Bounded microphone recording
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Record for the given duration and return a mono 16-bit WAV clip
    async fn record(&self, duration: Duration) -> Result<Vec<u8>>;
}

/// Speaker-side playback
#[async_trait]
pub trait Playback: Send + Sync {
    /// Play a WAV clip, returning only once it has finished
    async fn play_clip(&self, wav: Vec<u8>) -> Result<()>;

    /// Start playing a file without waiting for it (dance song)
    fn start_file(&self, path: &Path) -> Result<()>;

    /// Stop all current playback
    fn stop(&self);
}
