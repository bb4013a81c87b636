//! Microphone capture using cpal
//!
//! Push-to-talk means a fixed-length clip: open the input stream,
//! collect samples for the configured duration, encode to WAV, done.

use super::Recorder;
use crate::error::RoverError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::io::Cursor;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const CHUNK_SIZE: usize = 1024;

/// Fixed-duration recorder for the PTT cycle
pub struct PttRecorder {
    device_index: Option<usize>,
    sample_rate: u32,
}

impl PttRecorder {
    pub fn new(device_index: Option<usize>, sample_rate: u32) -> Self {
        Self {
            device_index,
            sample_rate,
        }
    }
}

#[async_trait]
impl Recorder for PttRecorder {
    async fn record(&self, duration: Duration) -> Result<Vec<u8>> {
        let device_index = self.device_index;
        let sample_rate = self.sample_rate;

        // cpal streams are not Send; keep the whole capture on one
        // blocking thread.
        tokio::task::spawn_blocking(move || record_clip(device_index, sample_rate, duration))
            .await
            .map_err(|e| anyhow::anyhow!("Capture task join error: {}", e))?
    }
}

/// Record a bounded clip from the selected input device
fn record_clip(
    device_index: Option<usize>,
    sample_rate: u32,
    duration: Duration,
) -> Result<Vec<u8>> {
    let host = cpal::default_host();

    // Select device
    let device = if let Some(idx) = device_index {
        host.input_devices()?
            .nth(idx)
            .context("Device index out of range")?
    } else {
        host.default_input_device()
            .context("No default input device")?
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("🎙️ Recording {:.1}s from: {}", duration.as_secs_f32(), device_name);

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Fixed(CHUNK_SIZE as u32),
    };

    let (tx, rx) = mpsc::channel::<Vec<i16>>();

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            if tx.send(data.to_vec()).is_err() {
                warn!("Audio receiver dropped");
            }
        },
        |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;

    stream.play()?;

    let target = (duration.as_secs_f32() * sample_rate as f32) as usize;
    let deadline = Instant::now() + duration + Duration::from_secs(2);
    let mut samples: Vec<i16> = Vec::with_capacity(target);

    while samples.len() < target && Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(chunk) => samples.extend(chunk),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(stream);
    samples.truncate(target);

    if samples.is_empty() {
        return Err(RoverError::Audio(format!("no audio captured from {device_name}")).into());
    }

    debug!("Recording complete ({} samples)", samples.len());
    encode_clip(&samples, sample_rate)
}

/// Encode samples as a mono 16-bit WAV clip
fn encode_clip(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_clip() {
        let samples = vec![0i16, 500, -500, 1000];
        let wav = encode_clip(&samples, 24000).expect("encode");

        let reader = hound::WavReader::new(Cursor::new(&wav)).expect("read back");
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }
}
