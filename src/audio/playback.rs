//! Sound engine for speech and clip playback
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback
//! infrastructure.

use super::Playback;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::{error, info, warn};

/// Commands sent to the audio thread
enum AudioCommand {
    /// Play a WAV clip and signal when it has finished
    PlayClipWait(Vec<u8>, mpsc::Sender<Result<()>>),
    /// Queue a file without waiting
    PlayFile(PathBuf),
    Stop,
}

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine").finish()
    }
}

impl SoundEngine {
    pub fn new() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();

        // Spawn dedicated audio thread
        thread::spawn(move || {
            Self::audio_thread(receiver);
        });

        Ok(Self { sender })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>) {
        use rodio::OutputStream;

        // Initialize audio output on this thread
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                // Drain commands so senders never hang on a dead engine
                while let Ok(cmd) = receiver.recv() {
                    if let AudioCommand::PlayClipWait(_, resp) = cmd {
                        let _ = resp.send(Err(anyhow::anyhow!("No audio output available")));
                    }
                }
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                return;
            }
        };

        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::PlayClipWait(wav, resp) => {
                    let outcome = Self::append_clip(&sink, wav);
                    if outcome.is_ok() {
                        sink.sleep_until_end();
                    }
                    let _ = resp.send(outcome);
                }
                AudioCommand::PlayFile(path) => {
                    info!("🔊 Playing file: {:?}", path);
                    if let Err(e) = Self::append_file(&sink, &path) {
                        error!("❌ Audio playback failed for {:?}: {}", path, e);
                    }
                }
                AudioCommand::Stop => {
                    info!("🛑 Stopping all playback");
                    sink.stop();
                    // Re-create sink after stop as it becomes unusable if we want to play again
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    fn append_clip(sink: &rodio::Sink, wav: Vec<u8>) -> Result<()> {
        let source = rodio::Decoder::new(Cursor::new(wav))?;
        sink.append(source);
        Ok(())
    }

    fn append_file(sink: &rodio::Sink, path: &Path) -> Result<()> {
        use rodio::Decoder;
        use std::fs::File;
        use std::io::BufReader;

        if !path.exists() {
            anyhow::bail!("Audio file not found: {:?}", path);
        }

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))?;
        sink.append(source);
        Ok(())
    }

    /// Play a WAV clip and block until it finishes
    pub fn play_clip_sync(&self, wav: Vec<u8>) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.sender
            .send(AudioCommand::PlayClipWait(wav, tx))
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))?;

        rx.recv()
            .map_err(|e| anyhow::anyhow!("Audio thread dropped response: {}", e))?
    }
}

#[async_trait]
impl Playback for SoundEngine {
    async fn play_clip(&self, wav: Vec<u8>) -> Result<()> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.play_clip_sync(wav))
            .await
            .map_err(|e| anyhow::anyhow!("Playback task join error: {}", e))?
    }

    fn start_file(&self, path: &Path) -> Result<()> {
        self.sender
            .send(AudioCommand::PlayFile(path.to_path_buf()))
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))
    }

    fn stop(&self) {
        let _ = self.sender.send(AudioCommand::Stop);
    }
}
