//! Speech server client
//!
//! Talks to an external transcription/synthesis server using a simple
//! protocol of JSON events, one per line, over TCP. Audio payloads are
//! base64. Transient network failures are retried with exponential
//! backoff (3 attempts, 2-10s growth).

use super::{SpeechStyle, Synthesizer, Transcriber};
use crate::error::RoverError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, info, warn};

/// Bound on waiting for the server's reply events
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the remote speech server
#[derive(Clone)]
pub struct SpeechServerClient {
    host: String,
    port: u16,
    plain_voice: String,
    persona_voice: String,
}

impl SpeechServerClient {
    pub fn new(config: &crate::config::Config) -> Self {
        Self {
            host: config.speech_host.clone(),
            port: config.speech_port,
            plain_voice: config.tts_voice.clone(),
            persona_voice: config.persona_voice.clone(),
        }
    }

    /// 3 attempts, exponential delay from 2s capped at 10s
    fn retry_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2000)
            .max_delay(Duration::from_secs(10))
            .take(2)
    }

    /// Check if the server is reachable
    pub async fn health_check(&self) -> bool {
        match TcpStream::connect((&*self.host, self.port)).await {
            Ok(_) => {
                debug!("Speech server available at {}:{}", self.host, self.port);
                true
            }
            Err(e) => {
                warn!("Speech server not available: {}", e);
                false
            }
        }
    }

    async fn transcribe_once(&self, wav: &[u8]) -> Result<String> {
        let (rate, channels, pcm) = decode_wav(wav)?;

        let stream = TcpStream::connect((&*self.host, self.port))
            .await
            .map_err(|e| RoverError::Transient(format!("speech server connect: {e}")))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // Announce the stream, ship the audio, close it
        let transcribe = serde_json::json!({"type": "transcribe"});
        writer.write_all(transcribe.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;

        let audio_start = serde_json::json!({
            "type": "audio-start",
            "data": { "rate": rate, "width": 2, "channels": channels }
        });
        writer.write_all(audio_start.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;

        let audio_chunk = serde_json::json!({
            "type": "audio-chunk",
            "data": {
                "rate": rate,
                "width": 2,
                "channels": channels,
                "audio": STANDARD.encode(&pcm)
            }
        });
        writer.write_all(audio_chunk.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;

        let audio_stop = serde_json::json!({"type": "audio-stop"});
        writer.write_all(audio_stop.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        debug!("Sent audio ({} bytes), waiting for transcript...", pcm.len());

        let transcript = tokio::time::timeout(RESPONSE_TIMEOUT, async {
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await? == 0 {
                    break;
                }

                if let Ok(event) = serde_json::from_str::<serde_json::Value>(&line) {
                    if event.get("type").and_then(|t| t.as_str()) == Some("transcript") {
                        if let Some(text) = event
                            .get("data")
                            .and_then(|d| d.get("text"))
                            .and_then(|t| t.as_str())
                        {
                            return Ok::<_, anyhow::Error>(text.to_string());
                        }
                    }
                }
            }
            Ok(String::new())
        })
        .await
        .context("Timeout waiting for transcript")??;

        info!("📝 Transcript: '{}'", transcript);
        Ok(transcript)
    }

    async fn synthesize_once(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let stream = TcpStream::connect((&*self.host, self.port))
            .await
            .map_err(|e| RoverError::Transient(format!("speech server connect: {e}")))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let synthesize = serde_json::json!({
            "type": "synthesize",
            "data": { "text": text, "voice": { "name": voice } }
        });
        writer.write_all(synthesize.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        debug!("Requested synthesis ({} chars, voice: {})", text.len(), voice);

        // Collect audio-start + chunks until audio-stop
        let (rate, channels, pcm) = tokio::time::timeout(RESPONSE_TIMEOUT, async {
            let mut rate = 24000u32;
            let mut channels = 1u16;
            let mut pcm: Vec<u8> = Vec::new();

            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await? == 0 {
                    break;
                }

                let event: serde_json::Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                match event.get("type").and_then(|t| t.as_str()) {
                    Some("audio-start") => {
                        if let Some(data) = event.get("data") {
                            rate = data.get("rate").and_then(|r| r.as_u64()).unwrap_or(24000)
                                as u32;
                            channels =
                                data.get("channels").and_then(|c| c.as_u64()).unwrap_or(1) as u16;
                        }
                    }
                    Some("audio-chunk") => {
                        if let Some(audio) = event
                            .get("data")
                            .and_then(|d| d.get("audio"))
                            .and_then(|a| a.as_str())
                        {
                            pcm.extend(STANDARD.decode(audio)?);
                        }
                    }
                    Some("audio-stop") => break,
                    Some("error") => {
                        let message = event
                            .get("data")
                            .and_then(|d| d.get("text"))
                            .and_then(|t| t.as_str())
                            .unwrap_or("unspecified");
                        anyhow::bail!("speech server error: {}", message);
                    }
                    _ => {}
                }
            }

            if pcm.is_empty() {
                anyhow::bail!("speech server returned no audio");
            }
            Ok::<_, anyhow::Error>((rate, channels, pcm))
        })
        .await
        .context("Timeout waiting for synthesis")??;

        encode_wav(rate, channels, &pcm)
    }
}

#[async_trait]
impl Transcriber for SpeechServerClient {
    async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        Retry::spawn(Self::retry_strategy(), || self.transcribe_once(wav)).await
    }
}

#[async_trait]
impl Synthesizer for SpeechServerClient {
    async fn synthesize(&self, text: &str, style: SpeechStyle) -> Result<Vec<u8>> {
        let voice = match style {
            SpeechStyle::Plain => &self.plain_voice,
            SpeechStyle::Persona => &self.persona_voice,
        };

        match Retry::spawn(Self::retry_strategy(), || {
            self.synthesize_once(text, voice)
        })
        .await
        {
            Ok(wav) => Ok(wav),
            Err(e) if style == SpeechStyle::Persona => {
                // Persona voice is best-effort: degrade to the plain voice
                warn!("⚠️ Persona voice failed ({}), falling back to plain voice", e);
                Retry::spawn(Self::retry_strategy(), || {
                    self.synthesize_once(text, &self.plain_voice)
                })
                .await
            }
            Err(e) => Err(e),
        }
    }
}

/// Pull sample rate, channel count and raw PCM bytes out of a WAV clip
fn decode_wav(wav: &[u8]) -> Result<(u32, u16, Vec<u8>)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(wav)).context("Captured clip is not valid WAV")?;
    let spec = reader.spec();

    let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        pcm.extend_from_slice(&sample?.to_le_bytes());
    }

    Ok((spec.sample_rate, spec.channels, pcm))
}

/// Wrap raw 16-bit PCM into a WAV clip
fn encode_wav(rate: u32, channels: u16, pcm: &[u8]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for pair in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
