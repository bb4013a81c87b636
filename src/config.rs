use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Speech backend (transcription + synthesis server)
    pub speech_host: String,
    pub speech_port: u16,
    pub tts_voice: String,
    /// Persona voice used for conversational replies. Falls back to
    /// `tts_voice` when the server cannot produce it.
    pub persona_voice: String,

    // Chat fallback
    pub chat_enabled: bool,
    pub chat_url: String,
    pub chat_model: String,

    // Capture/PTT
    pub ptt_seconds: f32,
    pub sample_rate: u32,
    pub audio_device: Option<usize>,

    // Rover link
    pub rover_port: String,
    pub rover_baud: u32,
    /// Destinations the controller has a stored route for
    pub destinations: Vec<String>,

    // Media
    pub dance_song: String,
    pub rules_path: String,
    pub stations_path: String,

    // Pipeline timing
    /// Grace period given to the dance song to start before the DANCE
    /// signal fires, in milliseconds.
    pub dance_grace_ms: u64,
    /// Bound on waiting for the radio worker to exit after a stop signal.
    pub radio_stop_timeout_ms: u64,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speech_host: "localhost".to_string(),
            speech_port: 10300,
            tts_voice: "en_GB-alba-medium".to_string(),
            persona_voice: "rover".to_string(),
            chat_enabled: true,
            chat_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            ptt_seconds: 2.5,
            sample_rate: 24000,
            audio_device: None,
            rover_port: "/dev/ttyUSB0".to_string(),
            rover_baud: 9600,
            destinations: vec!["cafeteria".to_string()],
            dance_song: dirs::data_dir()
                .unwrap_or_default()
                .join("rovertalk/audio/dance.mp3")
                .to_string_lossy()
                .to_string(),
            rules_path: dirs::config_dir()
                .unwrap_or_default()
                .join("rovertalk/rules.json")
                .to_string_lossy()
                .to_string(),
            stations_path: dirs::config_dir()
                .unwrap_or_default()
                .join("rovertalk/stations.json")
                .to_string_lossy()
                .to_string(),
            dance_grace_ms: 700,
            radio_stop_timeout_ms: 2000,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the given path (or the default location), falling
    /// back to defaults when the file is missing or corrupt.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).unwrap_or_else(config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to its default location
    pub fn save(&self) -> Result<()> {
        let config_path = config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rovertalk")
        .join("config.json")
}
