//! Background radio
//!
//! Streams a station URL through an external player process on a worker
//! thread. The worker is signaled to stop via a cooperative flag and
//! joined with a bounded timeout; the active flag it maintains is the
//! ambient-audio state the pipeline reads.

use crate::error::RoverError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A radio station entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub url: String,
}

/// Declarative station list with a default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationDirectory {
    pub default: String,
    pub stations: Vec<Station>,
}

impl StationDirectory {
    /// Built-in directory used when no stations file exists
    pub fn builtin() -> Self {
        Self {
            default: "92.5 FM".to_string(),
            stations: vec![
                Station {
                    name: "92.5 FM".to_string(),
                    url: "https://stream.rcs.revma.com/an1ugyygzk8uv".to_string(),
                },
                Station {
                    name: "lofi".to_string(),
                    url: "https://streams.ilovemusic.de/iloveradio17.mp3".to_string(),
                },
            ],
        }
    }

    /// Load the directory from a JSON file, degrading to the built-in
    /// list when the file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No stations file at {:?}, using built-in directory", path);
            return Self::builtin();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(directory) => directory,
                Err(e) => {
                    warn!("⚠️ Stations file invalid, using built-in directory: {}", e);
                    Self::builtin()
                }
            },
            Err(e) => {
                warn!("⚠️ Failed to read stations from {:?}: {}", path, e);
                Self::builtin()
            }
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Find a station by name, or the default when none is given.
    /// Unknown names are a lookup failure, not a crash.
    pub fn resolve(&self, name: Option<&str>) -> Result<&Station> {
        let wanted = name.unwrap_or(&self.default);
        self.stations
            .iter()
            .find(|s| s.name == wanted)
            .ok_or_else(|| RoverError::Config(format!("station not found: {wanted}")).into())
    }
}

/// Ambient-audio surface the pipeline sequences against
pub trait AmbientAudio: Send + Sync {
    /// Is background audio currently active?
    fn is_active(&self) -> bool;

    /// Stop the stream for the duration of a voice cycle
    fn pause(&self);

    /// Restart the station that was playing (or the default)
    fn resume(&self) -> Result<()>;

    /// Start a named station (default when `None`)
    fn start(&self, station: Option<&str>) -> Result<()>;

    /// Final teardown at process shutdown
    fn shutdown(&self);
}

/// Handle to a running stream worker
struct StreamWorker {
    handle: JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
}

/// Background radio player driving an external stream process
pub struct RadioPlayer {
    directory: StationDirectory,
    worker: Mutex<Option<StreamWorker>>,
    last_station: Mutex<Option<String>>,
    stop_timeout: Duration,
}

impl RadioPlayer {
    pub fn new(directory: StationDirectory, stop_timeout: Duration) -> Self {
        Self {
            directory,
            worker: Mutex::new(None),
            last_station: Mutex::new(None),
            stop_timeout,
        }
    }

    /// Worker body: stream the URL until told to stop
    fn stream_worker(url: String, stop_flag: Arc<AtomicBool>) {
        let mut child = match Command::new("ffplay")
            .args(["-nodisp", "-autoexit", "-loglevel", "quiet", &url])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("❌ Failed to start stream player: {}", e);
                return;
            }
        };

        // Wait for stop signal or the player exiting on its own
        while !stop_flag.load(Ordering::Relaxed) {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Stream player exited: {}", status);
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(100)),
                Err(e) => {
                    error!("❌ Stream player poll failed: {}", e);
                    break;
                }
            }
        }

        let _ = child.kill();
        let _ = child.wait();
    }

    /// Signal the worker to stop and join it within the bounded timeout
    fn stop_worker(&self) {
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => return,
        };

        if let Some(worker) = worker {
            worker.stop_flag.store(true, Ordering::Relaxed);

            let deadline = Instant::now() + self.stop_timeout;
            while !worker.handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(50));
            }
            if worker.handle.is_finished() {
                let _ = worker.handle.join();
            } else {
                // Treat as stopped anyway; the flag will reap it
                warn!("⚠️ Radio worker did not stop within {:?}", self.stop_timeout);
            }
        }
    }

    fn start_station(&self, name: Option<&str>) -> Result<()> {
        // Stop current playback if any
        if self.is_active() {
            info!("Stopping current radio playback");
            self.stop_worker();
        }

        let station = self.directory.resolve(name)?;
        info!("📻 Starting radio: {}", station.name);

        let stop_flag = Arc::new(AtomicBool::new(false));
        let url = station.url.clone();
        let handle = {
            let stop_flag = Arc::clone(&stop_flag);
            thread::spawn(move || Self::stream_worker(url, stop_flag))
        };

        if let Ok(mut guard) = self.worker.lock() {
            *guard = Some(StreamWorker { handle, stop_flag });
        }
        if let Ok(mut guard) = self.last_station.lock() {
            *guard = Some(station.name.clone());
        }

        Ok(())
    }
}

impl AmbientAudio for RadioPlayer {
    fn is_active(&self) -> bool {
        match self.worker.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|w| !w.handle.is_finished())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn pause(&self) {
        info!("⏸️ Pausing radio for voice input");
        self.stop_worker();
    }

    fn resume(&self) -> Result<()> {
        let station = match self.last_station.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        info!("▶️ Resuming radio playback");
        self.start_station(station.as_deref())
    }

    fn start(&self, station: Option<&str>) -> Result<()> {
        self.start_station(station)
    }

    fn shutdown(&self) {
        if self.is_active() {
            info!("📻 Stopping radio for shutdown");
        }
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_directory_resolves_default() {
        let directory = StationDirectory::builtin();
        let station = directory.resolve(None).expect("default station");
        assert_eq!(station.name, directory.default_name());
    }

    #[test]
    fn test_unknown_station_is_an_error() {
        let directory = StationDirectory::builtin();
        assert!(directory.resolve(Some("pirate radio")).is_err());
    }

    #[test]
    fn test_directory_load_malformed_uses_builtin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stations.json");
        std::fs::write(&path, "not json at all").expect("write");

        let directory = StationDirectory::load(&path);
        assert_eq!(directory.default_name(), "92.5 FM");
    }

    #[test]
    fn test_directory_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stations.json");
        std::fs::write(
            &path,
            r#"{"default": "jazz", "stations": [{"name": "jazz", "url": "http://example.com/jazz"}]}"#,
        )
        .expect("write");

        let directory = StationDirectory::load(&path);
        assert_eq!(directory.default_name(), "jazz");
        assert_eq!(
            directory.resolve(Some("jazz")).expect("station").url,
            "http://example.com/jazz"
        );
    }

    #[test]
    fn test_player_starts_inactive() {
        let player = RadioPlayer::new(StationDirectory::builtin(), Duration::from_millis(100));
        assert!(!player.is_active());
        // pause and shutdown on an idle player are no-ops
        player.pause();
        player.shutdown();
        assert!(!player.is_active());
    }
}
