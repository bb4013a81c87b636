//! Speech backends
//!
//! Transcription and synthesis are external collaborators; these traits
//! are the boundary the pipeline sees. The remote implementation speaks
//! a JSON-lines-over-TCP protocol with bounded retry.

pub mod remote;

use anyhow::Result;
use async_trait::async_trait;

pub use remote::SpeechServerClient;

/// Which voice a spoken reply should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStyle {
    /// Plain voice for command acknowledgements
    Plain,
    /// Persona voice for conversational replies. Implementations fall
    /// back to the plain voice when the persona voice is unavailable.
    Persona,
}

/// Speech-to-text boundary
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a mono 16-bit WAV clip
    async fn transcribe(&self, wav: &[u8]) -> Result<String>;
}

/// Text-to-speech boundary
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into a WAV clip
    async fn synthesize(&self, text: &str, style: SpeechStyle) -> Result<Vec<u8>>;
}
