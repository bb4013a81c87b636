//! Orchestration loop
//!
//! The top-level sequencer. One push-to-talk trigger drives exactly one
//! cycle through capture → transcribe → match → dispatch → speak →
//! apply-deferred-effects → restore-ambient; between triggers the loop
//! is idle. Handlers only declare effects, so every ordering decision
//! (speech before hardware, dance song before the DANCE signal, the
//! three-way ambient restore) lives here and nowhere else.

use crate::audio::{Playback, Recorder};
use crate::config::Config;
use crate::device::{RoverCommand, RoverControl};
use crate::dispatch::{DispatchResult, DispatchStatus, Dispatcher, Effect};
use crate::intent::{Intent, IntentKind, RuleEngine};
use crate::radio::AmbientAudio;
use crate::speech::{SpeechStyle, Synthesizer, Transcriber};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error, info, warn};

/// Pipeline stages, in cycle order. Used for logging and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capturing,
    Transcribing,
    Matching,
    Dispatching,
    Speaking,
    ApplyingEffects,
    RestoringAmbient,
}

/// Outcome of a single cycle
#[derive(Debug)]
pub struct CycleReport {
    pub intent: Option<IntentKind>,
    pub status: Option<DispatchStatus>,
    /// Stage that aborted the cycle, if any
    pub failed_stage: Option<Stage>,
}

impl CycleReport {
    fn failed(stage: Stage) -> Self {
        Self {
            intent: None,
            status: None,
            failed_stage: Some(stage),
        }
    }

    fn completed(intent: IntentKind, status: DispatchStatus) -> Self {
        Self {
            intent: Some(intent),
            status: Some(status),
            failed_stage: None,
        }
    }
}

/// Tunables the loop reads from config
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Fixed push-to-talk capture window
    pub ptt_duration: Duration,
    /// Head start the dance song gets before the DANCE signal
    pub dance_grace: Duration,
    pub dance_song: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ptt_duration: Duration::from_secs_f32(config.ptt_seconds),
            dance_grace: Duration::from_millis(config.dance_grace_ms),
            dance_song: PathBuf::from(&config.dance_song),
        }
    }
}

/// The voice-command orchestrator
pub struct Pipeline {
    engine: RuleEngine,
    dispatcher: Dispatcher,
    recorder: Arc<dyn Recorder>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    playback: Arc<dyn Playback>,
    radio: Arc<dyn AmbientAudio>,
    rover: Arc<dyn RoverControl>,
    settings: PipelineSettings,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: RuleEngine,
        dispatcher: Dispatcher,
        recorder: Arc<dyn Recorder>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        playback: Arc<dyn Playback>,
        radio: Arc<dyn AmbientAudio>,
        rover: Arc<dyn RoverControl>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            recorder,
            transcriber,
            synthesizer,
            playback,
            radio,
            rover,
            settings,
        }
    }

    /// Outer loop: block on push-to-talk triggers until cancelled
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        info!("🎤 Ready - press Enter to talk, Ctrl+C to exit");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(_)) => {
                            info!("PTT activated - starting cycle");
                            self.run_cycle().await;
                            info!("");
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("PTT input error: {}", e);
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Run one full voice-command cycle.
    ///
    /// Never fails: every stage converts its errors into a restored-and-
    /// idle outcome so the next trigger always finds a clean state.
    pub async fn run_cycle(&self) -> CycleReport {
        // The ambient flag is read once, before capture, and drives the
        // restore decision for the whole cycle.
        let was_active = self.radio.is_active();
        if was_active {
            self.radio.pause();
        }

        // Capturing
        let clip = match self.recorder.record(self.settings.ptt_duration).await {
            Ok(clip) => clip,
            Err(e) => {
                error!("Recording failed: {}", e);
                self.restore_after_failure(was_active);
                return CycleReport::failed(Stage::Capturing);
            }
        };

        // Transcribing
        let transcript = match self.transcriber.transcribe(&clip).await {
            Ok(text) => text,
            Err(e) => {
                error!("Transcription failed: {}", e);
                self.restore_after_failure(was_active);
                return CycleReport::failed(Stage::Transcribing);
            }
        };
        info!("🗣️ USER SAID: '{}'", transcript);

        // Matching
        let intent = self.engine.match_text(&transcript);
        info!("INTENT: {}", intent);

        // Dispatching (never fails; outcomes are normalized)
        let result = self.dispatcher.dispatch(&intent).await;
        info!("RESULT: {}", result.message);

        // Estop is fatal-priority: silence everything and halt before
        // the confirmation is spoken.
        if intent.kind == IntentKind::Estop {
            self.playback.stop();
            self.signal_rover(RoverCommand::Halt).await;
        }

        // Speaking: completes fully before any deferred effect
        self.speak(&result).await;

        // ApplyingEffects, in Effect total order
        self.apply_effects(&result).await;

        // RestoringAmbient: three-way decision, evaluated last
        self.restore_ambient(was_active, &intent, &result);

        CycleReport::completed(intent.kind, result.status)
    }

    /// Orderly teardown on cancellation
    pub fn shutdown(&self) {
        self.radio.shutdown();
        self.playback.stop();
        self.rover.disconnect();
    }

    /// Speak the result message, blocking until playback finishes.
    /// Failures mean the user hears nothing this cycle; the cycle goes on.
    async fn speak(&self, result: &DispatchResult) {
        if result.message.is_empty() {
            return;
        }

        let style = if result.use_persona_voice {
            SpeechStyle::Persona
        } else {
            SpeechStyle::Plain
        };

        match self.synthesizer.synthesize(&result.message, style).await {
            Ok(wav) => {
                if let Err(e) = self.playback.play_clip(wav).await {
                    error!("Speech playback failed: {}", e);
                }
            }
            Err(e) => error!("Speech synthesis failed: {}", e),
        }
    }

    /// Apply deferred effects front to back. The BTreeSet iterates in
    /// the Effect total order, so the dance song always precedes the
    /// DANCE signal and hardware signals precede nothing they shouldn't.
    async fn apply_effects(&self, result: &DispatchResult) {
        for effect in &result.deferred_effects {
            match effect {
                Effect::PlayDanceSong => {
                    if self.settings.dance_song.exists() {
                        match self.playback.start_file(&self.settings.dance_song) {
                            // Give the song a head start before the signal
                            Ok(()) => tokio::time::sleep(self.settings.dance_grace).await,
                            Err(e) => {
                                warn!("⚠️ Dance song failed to start, dancing in silence: {}", e)
                            }
                        }
                    } else {
                        warn!(
                            "⚠️ Dance song missing at {:?}, dancing in silence",
                            self.settings.dance_song
                        );
                    }
                }
                Effect::SendRoverDance => self.signal_rover(RoverCommand::Dance).await,
                Effect::SendRoverRun => self.signal_rover(RoverCommand::Run).await,
                // Consumed by the ambient-restore decision
                Effect::StartRadio => {}
            }
        }
    }

    /// Send a hardware signal off the async loop; absorb every failure
    async fn signal_rover(&self, command: RoverCommand) {
        let rover = Arc::clone(&self.rover);
        let sent = tokio::task::spawn_blocking(move || rover.send(command))
            .await
            .unwrap_or(false);
        if !sent {
            debug!("🤖 {} completed in simulation only", command.label());
        }
    }

    /// Three-way restore: start if asked, stay paused if asked, else
    /// put things back the way the cycle found them.
    fn restore_ambient(&self, was_active: bool, intent: &Intent, result: &DispatchResult) {
        if result.has_effect(Effect::StartRadio) {
            if let Err(e) = self.radio.start(None) {
                error!("Failed to start radio: {}", e);
            }
        } else if intent.kind == IntentKind::PauseRadio {
            debug!("Radio stays paused by request");
        } else if was_active {
            if let Err(e) = self.radio.resume() {
                error!("Failed to resume radio: {}", e);
            }
        }
    }

    /// A failure at any stage must never leave ambient audio stuck in
    /// "paused": restore to the captured pre-cycle state immediately.
    fn restore_after_failure(&self, was_active: bool) {
        if was_active {
            if let Err(e) = self.radio.resume() {
                error!("Failed to resume radio after failure: {}", e);
            }
        }
    }
}
