//! Rover serial link
//!
//! Talks to the motor controller over a serial port. The connection is
//! opened lazily on first use; commands are fire-and-forget with a
//! bounded window for logging whatever the controller says back. When
//! the port is unavailable the link degrades to simulation mode: the
//! command is logged, nothing is sent, and the cycle carries on.

use crate::error::RoverError;
use anyhow::Result;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SERIAL_TIMEOUT: Duration = Duration::from_millis(100);
/// Controllers reset when the port opens; give them a moment
const SERIAL_BOOT_DELAY: Duration = Duration::from_secs(2);
/// Window for reading back response lines after a command
const ACK_WINDOW: Duration = Duration::from_millis(500);
const READ_CHUNK: usize = 64;

/// Commands the rover controller understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoverCommand {
    /// Drive the stored route
    Run,
    /// Perform the dance routine
    Dance,
    /// Emergency stop
    Halt,
}

impl RoverCommand {
    pub fn wire_bytes(self) -> &'static [u8] {
        match self {
            Self::Run => b"RUN",
            Self::Dance => b"DANCE",
            Self::Halt => b"HALT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Run => "RUN",
            Self::Dance => "DANCE",
            Self::Halt => "HALT",
        }
    }
}

/// Hardware signaling surface the pipeline uses
pub trait RoverControl: Send + Sync {
    /// Send a command. Returns true when it reached the wire, false in
    /// simulation mode. Never fails the cycle.
    fn send(&self, command: RoverCommand) -> bool;

    /// Close the link. Idempotent.
    fn disconnect(&self);
}

/// Serial client for the rover's motor controller
pub struct RoverLink {
    port_path: String,
    baud: u32,
    /// Forced simulation mode (no hardware attached)
    simulate: bool,
    port: Mutex<Option<Box<dyn SerialPort>>>,
}

impl RoverLink {
    pub fn new(port_path: &str, baud: u32, simulate: bool) -> Self {
        if simulate {
            info!("🤖 Rover link in simulation mode (no serial port will be opened)");
        }
        Self {
            port_path: port_path.to_string(),
            baud,
            simulate,
            port: Mutex::new(None),
        }
    }

    fn open_port(&self) -> Result<Box<dyn SerialPort>> {
        info!("Connecting to rover on {} at {} baud...", self.port_path, self.baud);
        let port = serialport::new(&self.port_path, self.baud)
            .timeout(SERIAL_TIMEOUT)
            .open()
            .map_err(|e| RoverError::Device(format!("failed to open {}: {e}", self.port_path)))?;
        std::thread::sleep(SERIAL_BOOT_DELAY);
        info!("✅ Rover connected");
        Ok(port)
    }

    fn write_command(port: &mut dyn SerialPort, command: RoverCommand) -> Result<()> {
        port.write_all(command.wire_bytes())?;
        port.write_all(b"\n")?;
        port.flush()?;
        Ok(())
    }

    /// Read response lines for a bounded window, logging them
    fn log_responses(port: &mut dyn SerialPort) {
        let deadline = Instant::now() + ACK_WINDOW;
        let mut scratch = [0_u8; READ_CHUNK];

        while Instant::now() < deadline {
            match port.read(&mut scratch) {
                Ok(0) => {}
                Ok(n) => {
                    let raw = String::from_utf8_lossy(&scratch[..n]).replace('\r', "");
                    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
                        info!("🤖 Rover: {}", line.trim());
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => {
                    warn!("Rover response read error: {}", e);
                    return;
                }
            }
        }
    }
}

impl RoverControl for RoverLink {
    fn send(&self, command: RoverCommand) -> bool {
        if self.simulate {
            info!("🤖 [simulation] {} command", command.label());
            return false;
        }

        let mut guard = match self.port.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Rover link lock poisoned: {}", e);
                return false;
            }
        };

        // Lazy connect on first use
        if guard.is_none() {
            match self.open_port() {
                Ok(port) => *guard = Some(port),
                Err(e) => {
                    warn!("⚠️ Rover not available, running in simulation mode: {}", e);
                    return false;
                }
            }
        }

        info!("📤 Sending {} to rover", command.label());
        let written = match guard.as_mut() {
            Some(port) => Self::write_command(port.as_mut(), command),
            None => return false,
        };

        match written {
            Ok(()) => {
                if let Some(port) = guard.as_mut() {
                    Self::log_responses(port.as_mut());
                }
                true
            }
            Err(e) => {
                warn!("⚠️ Failed to send {}: {}", command.label(), e);
                // Drop the port so the next command reconnects
                *guard = None;
                false
            }
        }
    }

    fn disconnect(&self) {
        if let Ok(mut guard) = self.port.lock() {
            if guard.take().is_some() {
                info!("🔌 Rover disconnected");
            }
        }
    }
}
