//! Shared mocks for pipeline integration tests
//!
//! Every mock appends to a single ordered event log so tests can assert
//! the sequencing invariants, not just that calls happened.

use anyhow::Result;
use async_trait::async_trait;
use rovertalk::audio::{Playback, Recorder};
use rovertalk::device::{RoverCommand, RoverControl};
use rovertalk::radio::AmbientAudio;
use rovertalk::speech::{SpeechStyle, Synthesizer, Transcriber};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of everything the pipeline touched
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.position(event).is_some()
    }

    /// Assert `earlier` appears in the log before `later`
    pub fn assert_order(&self, earlier: &str, later: &str) {
        let events = self.events();
        let a = self
            .position(earlier)
            .unwrap_or_else(|| panic!("'{earlier}' not in log: {events:?}"));
        let b = self
            .position(later)
            .unwrap_or_else(|| panic!("'{later}' not in log: {events:?}"));
        assert!(a < b, "'{earlier}' should precede '{later}': {events:?}");
    }
}

pub struct MockRecorder {
    log: EventLog,
    fail: bool,
}

impl MockRecorder {
    pub fn new(log: EventLog, fail: bool) -> Self {
        Self { log, fail }
    }
}

#[async_trait]
impl Recorder for MockRecorder {
    async fn record(&self, _duration: Duration) -> Result<Vec<u8>> {
        if self.fail {
            anyhow::bail!("microphone exploded");
        }
        self.log.push("record");
        Ok(vec![0u8; 64])
    }
}

pub struct MockTranscriber {
    log: EventLog,
    script: Result<String, String>,
}

impl MockTranscriber {
    pub fn returning(log: EventLog, text: &str) -> Self {
        Self {
            log,
            script: Ok(text.to_string()),
        }
    }

    pub fn failing(log: EventLog) -> Self {
        Self {
            log,
            script: Err("speech server unreachable".to_string()),
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> Result<String> {
        match &self.script {
            Ok(text) => {
                self.log.push("transcribe");
                Ok(text.clone())
            }
            Err(e) => anyhow::bail!("{}", e.clone()),
        }
    }
}

pub struct MockSynthesizer {
    log: EventLog,
    fail: bool,
}

impl MockSynthesizer {
    pub fn new(log: EventLog, fail: bool) -> Self {
        Self { log, fail }
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str, style: SpeechStyle) -> Result<Vec<u8>> {
        if self.fail {
            anyhow::bail!("synthesis failed");
        }
        self.log.push(format!("synthesize:{style:?}"));
        Ok(vec![1u8, 2, 3])
    }
}

pub struct MockPlayback {
    log: EventLog,
}

impl MockPlayback {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Playback for MockPlayback {
    async fn play_clip(&self, _wav: Vec<u8>) -> Result<()> {
        self.log.push("play-clip");
        Ok(())
    }

    fn start_file(&self, _path: &Path) -> Result<()> {
        self.log.push("dance-song");
        Ok(())
    }

    fn stop(&self) {
        self.log.push("playback-stop");
    }
}

pub struct MockAmbient {
    log: EventLog,
    active: AtomicBool,
}

impl MockAmbient {
    pub fn new(log: EventLog, active: bool) -> Self {
        Self {
            log,
            active: AtomicBool::new(active),
        }
    }

    pub fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl AmbientAudio for MockAmbient {
    fn is_active(&self) -> bool {
        self.active()
    }

    fn pause(&self) {
        self.log.push("radio-pause");
        self.active.store(false, Ordering::SeqCst);
    }

    fn resume(&self) -> Result<()> {
        self.log.push("radio-resume");
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start(&self, _station: Option<&str>) -> Result<()> {
        self.log.push("radio-start");
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) {
        self.log.push("radio-shutdown");
        self.active.store(false, Ordering::SeqCst);
    }
}

pub struct MockRover {
    log: EventLog,
}

impl MockRover {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl RoverControl for MockRover {
    fn send(&self, command: RoverCommand) -> bool {
        self.log.push(format!("rover-{}", command.label()));
        true
    }

    fn disconnect(&self) {
        self.log.push("rover-disconnect");
    }
}
