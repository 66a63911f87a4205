// src/main.rs - Startup wiring for the endless preset tour

use clap::Parser;

use ptztour::camera::channel::CameraChannel;
use ptztour::camera::{MotionApi, REQUIRED_CAPABILITIES};
use ptztour::config;
use ptztour::presets;
use ptztour::tour::path::PathBuilder;
use ptztour::tour::resolve_max_speed;
use ptztour::tour::runner::{release_control, Tour};

#[derive(Parser, Debug)]
#[command(name = "ptztour", about = "Endless PTZ tour along operator presets")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ptztour.toml")]
    config: String,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::info!("Starting ptztour");
    tracing::info!("Loading configuration from: {}", args.config);

    let config = config::load_config(&args.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", args.config, e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    let mut camera = CameraChannel::connect(
        &config.camera.host,
        config.camera.port,
        config.camera.video_channel,
    )
    .await?;

    let max_speed = resolve_max_speed(&mut camera).await?;
    tracing::info!("Max pan/tilt speed {}", max_speed);

    let capabilities = camera.move_capabilities().await?;
    for capability in &capabilities {
        tracing::info!("Capability: {}", capability);
    }
    if let Some(missing) = REQUIRED_CAPABILITIES
        .iter()
        .find(|&&required| !capabilities.iter().any(|c| c.as_str() == required))
    {
        tracing::error!(
            "Absolute or continuous movement not supported (missing {})",
            missing
        );
        return Err(format!("required capability {} not supported", missing).into());
    }

    let position = camera.status().await?;
    tracing::info!(
        "Current position pan {} tilt {} zoom {}",
        position.pan,
        position.tilt,
        position.zoom
    );
    let limits = camera.limits().await?;
    tracing::info!(
        "Limits pan [{}, {}] tilt [{}, {}] zoom [{}, {}]",
        limits.pan_min,
        limits.pan_max,
        limits.tilt_min,
        limits.tilt_max,
        limits.zoom_min,
        limits.zoom_max
    );

    let stops = presets::list_stops(&mut camera).await?;
    tracing::info!("Preset stop count: {}", stops.len());

    let builder = PathBuilder::new(config.tour.interpolation_count, config.tour.goto_speed);
    let Some(path) = builder.build(&mut camera, &stops).await? else {
        tracing::info!("Not enough presets for a tour; exiting");
        release_control(&mut camera).await?;
        tracing::info!("ptztour finished");
        return Ok(());
    };

    let mut tour = Tour::new(camera, path, max_speed);
    tour.run().await?;
    Ok(())
}
