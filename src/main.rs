//! RoverTalk - Voice Control for a Hobby Rover
//!
//! Push-to-talk voice assistant: record, transcribe, match an intent,
//! run its handler, speak the reply, then fire any deferred hardware
//! or media effects.

use anyhow::Result;
use clap::Parser;
use rovertalk::audio::{PttRecorder, SoundEngine};
use rovertalk::commands::DeviceContext;
use rovertalk::config::Config;
use rovertalk::device::RoverLink;
use rovertalk::dispatch::Dispatcher;
use rovertalk::intent::{FallbackResponder, HttpChat, RuleEngine};
use rovertalk::pipeline::{Pipeline, PipelineSettings};
use rovertalk::radio::{RadioPlayer, StationDirectory};
use rovertalk::speech::SpeechServerClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the rover controller
    #[arg(short, long)]
    device: Option<String>,

    /// Run without hardware (log signals instead of sending them)
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.rover_port = device;
    }

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🤖 RoverTalk v{} starting...", env!("CARGO_PKG_VERSION"));

    // Declarative sources: rules and stations, both degrade gracefully
    let engine = RuleEngine::load(Path::new(&config.rules_path));
    let stations = StationDirectory::load(Path::new(&config.stations_path));

    // Conversational fallback
    let fallback = if config.chat_enabled {
        FallbackResponder::new(Arc::new(HttpChat::new(&config)))
    } else {
        warn!("💬 Chat fallback disabled in config");
        FallbackResponder::disabled()
    };

    let context = DeviceContext::new(&config, &stations);
    let dispatcher = Dispatcher::new(context, fallback);

    // Adapters
    let speech = Arc::new(SpeechServerClient::new(&config));
    if !speech.health_check().await {
        warn!("⚠️ Speech server unreachable - cycles will fail until it comes back");
    }
    let sound = Arc::new(SoundEngine::new()?);
    let recorder = Arc::new(PttRecorder::new(config.audio_device, config.sample_rate));
    let radio = Arc::new(RadioPlayer::new(
        stations,
        Duration::from_millis(config.radio_stop_timeout_ms),
    ));
    let rover = Arc::new(RoverLink::new(
        &config.rover_port,
        config.rover_baud,
        args.simulate,
    ));

    let settings = PipelineSettings::from_config(&config);
    let pipeline = Pipeline::new(
        engine,
        dispatcher,
        recorder,
        speech.clone(),
        speech,
        sound,
        radio,
        rover,
        settings,
    );

    pipeline.run().await
}
