//! GPX replay (gpx-replay) - Main entry point
//!
//! Replays a GPX file through the simulator and logs every sensor event it
//! produces. Optionally records the replayed fixes back into the GPX
//! directory, the way a live session would be recorded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scape_common::config::{TomlConfig, CONFIG_ENV_VAR};
use scape_gpx::files::GpxFileManager;
use scape_gpx::tracker::GpxTracker;
use scape_gpx::{GpxLocation, GpxSimulator, LocationProvider, SensorEvent, SimulatorSettings};

/// Command-line arguments for gpx-replay
#[derive(Parser, Debug)]
#[command(name = "gpx-replay")]
#[command(about = "Replay a GPX track as simulated location updates")]
#[command(version)]
struct Args {
    /// GPX file to replay
    gpx_file: PathBuf,

    /// Configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Skip this many points after the first fix
    #[arg(short, long, default_value = "0")]
    jump: usize,

    /// Only report fixes that moved significantly
    #[arg(long)]
    significant_change: bool,

    /// Override the tick interval in seconds
    #[arg(long)]
    tick_interval: Option<f64>,

    /// Record the replayed fixes into the GPX directory
    #[arg(long)]
    record: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loaded before tracing so the configured level can seed the default filter
    let config = TomlConfig::load_or_default(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to load configuration")?;

    // Initialize tracing
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gpx_replay={level},scape_gpx={level},scape_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting gpx-replay v{} (built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("GPX directory: {}", config.gpx_directory().display());

    let mut settings = SimulatorSettings::from_config(&config.simulator);
    if let Some(tick) = args.tick_interval {
        settings = settings
            .with_tick_interval(tick)
            .context("Invalid --tick-interval")?;
    }

    let simulator = GpxSimulator::from_file(&args.gpx_file, settings)
        .with_context(|| format!("Failed to load {}", args.gpx_file.display()))?;
    info!(
        "Replaying {} ({} points)",
        args.gpx_file.display(),
        simulator.document().point_count()
    );

    let tracker = args.record.then(|| {
        let tracker = GpxTracker::new(GpxFileManager::new(config.gpx_directory()));
        tracker.start_tracking();
        tracker
    });

    let mut events = simulator.subscribe();

    if args.significant_change {
        anyhow::ensure!(
            simulator.start_monitoring_significant_location_changes(),
            "Significant-change monitoring unavailable"
        );
    } else {
        simulator.start_location_updates();
        simulator.start_course_updates();
        simulator.start_device_heading_updates();
    }

    if args.jump > 0 {
        simulator.simulate_jump_forward(args.jump);
    }

    let mut heading = None;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SensorEvent::SimulationEnded) => {
                    info!("Simulation ended at {}", simulator.current_index());
                    break;
                }
                Ok(SensorEvent::Location(location)) => {
                    info!(
                        "Location {:.6}, {:.6} course {:?} speed {:?}",
                        location.coordinate.latitude,
                        location.coordinate.longitude,
                        location.course,
                        location.speed
                    );
                    if let Some(tracker) = &tracker {
                        let mut fix = GpxLocation::new(location)
                            .with_activity(simulator.activity());
                        fix.device_heading = heading;
                        tracker.track(fix, true);
                    }
                }
                Ok(SensorEvent::DeviceHeading(value)) => {
                    heading = value;
                    info!("Device heading {:?}", value);
                }
                Ok(event) => info!("{:?}", event),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} sensor events", missed),
                Err(RecvError::Closed) => break,
            },
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, stopping replay");
                break;
            }
        }
    }

    if args.significant_change {
        simulator.stop_monitoring_significant_location_changes();
    } else {
        simulator.stop_device_heading_updates();
        simulator.stop_course_updates();
        simulator.stop_location_updates();
    }

    if let Some(tracker) = tracker {
        for path in tracker.stop_tracking().context("Failed to save recording")? {
            info!("Recording saved to {}", path.display());
        }
    }

    info!("Replay complete");
    Ok(())
}
