use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xy_scope_core::AppConfig;

fn main() -> xy_scope_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            config,
            device,
            seconds,
            export,
        } => {
            let mut config = load_config(config.as_ref())?;
            if device.is_some() {
                config.capture.device = device;
            }
            live::run(&config, seconds, export.as_deref())
        }
        Commands::Devices => live::list_devices(),
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> xy_scope_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Live dual-channel X-Y correlation scope", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture reference/effect inputs and plot them on the render timer.
    Live {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input device name; overrides the configuration.
        #[arg(short, long)]
        device: Option<String>,
        /// How long to capture before stopping.
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,
        /// Write the displayed points to this file when capture ends.
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// List the available audio input devices.
    Devices,
    /// Print the effective configuration as JSON.
    Config {
        /// JSON configuration file to merge over the defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "backend")]
mod live {
    use std::path::Path;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::{Duration, Instant};

    use xy_scope_core::{
        export_to_path, list_input_devices, AppConfig, AudioEngine, CaptureContext, Raster,
        Renderer, Result, Ticker,
    };

    const STATS_INTERVAL: Duration = Duration::from_secs(1);

    pub fn run(config: &AppConfig, seconds: u64, export: Option<&Path>) -> Result<()> {
        config.validate()?;
        tracing::info!(
            history = config.capture.history_len,
            tick_ms = config.display.tick_interval_ms,
            seconds,
            "starting live capture"
        );

        let (capture, publisher) = CaptureContext::new(config.capture.history()?);
        let session = AudioEngine::open(&config.capture, capture)?;

        let renderer = Arc::new(Mutex::new(Renderer::new(Arc::clone(&publisher))));
        let mut surface = Raster::new(config.display.width, config.display.height);
        let ticker = {
            let renderer = Arc::clone(&renderer);
            Ticker::new(config.display.tick_interval()).spawn(move || {
                let mut renderer = renderer.lock().unwrap_or_else(PoisonError::into_inner);
                renderer.tick(&mut surface);
            })?
        };

        let deadline = Instant::now() + Duration::from_secs(seconds);
        let mut last = publisher.stats();
        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            std::thread::sleep(STATS_INTERVAL.min(remaining));
            let stats = publisher.stats();
            tracing::debug!(
                published = stats.published - last.published,
                skipped = stats.skipped - last.skipped,
                samples = stats.samples_written - last.samples_written,
                "publish activity"
            );
            last = stats;
        }

        ticker.stop();
        drop(session);

        let stats = publisher.stats();
        tracing::info!(
            published = stats.published,
            skipped = stats.skipped,
            samples = stats.samples_written,
            "capture stopped"
        );

        if let Some(path) = export {
            let renderer = renderer.lock().unwrap_or_else(PoisonError::into_inner);
            export_to_path(path, renderer.displayed())?;
        }
        Ok(())
    }

    pub fn list_devices() -> Result<()> {
        for name in list_input_devices()? {
            println!("{name}");
        }
        Ok(())
    }
}

#[cfg(not(feature = "backend"))]
mod live {
    use std::path::Path;

    use xy_scope_core::{AppConfig, Result, ScopeError};

    pub fn run(_config: &AppConfig, _seconds: u64, _export: Option<&Path>) -> Result<()> {
        Err(ScopeError::setup("built without the `backend` feature"))
    }

    pub fn list_devices() -> Result<()> {
        Err(ScopeError::setup("built without the `backend` feature"))
    }
}
