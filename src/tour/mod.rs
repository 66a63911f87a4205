// src/tour/mod.rs - Shared types and helpers for the endless preset tour

pub mod arrival;
pub mod path;
pub mod planner;
pub mod runner;

use std::time::Duration;
use thiserror::Error;

use crate::camera::{CameraError, MotionApi, Parameters, PtzPosition};

#[derive(Debug, Error)]
pub enum TourError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Timed out waiting for camera movement to finish")]
    MoveTimeout,
    #[error("Parameter {key} has unusable value {value:?}")]
    BadParameter { key: String, value: String },
}

/// Cadence of every status poll in the tour.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Settle time between issuing a continuous move and the first status read.
pub const SETTLE_TIME: Duration = Duration::from_millis(20);
/// Device-side safety timeout on every continuous move, in case a stop
/// command is lost on the wire.
pub const MOVE_SAFETY_TIMEOUT: Duration = Duration::from_secs(600);
/// Most polls allowed in the simple movement-finished wait.
const MOVE_FINISH_POLL_LIMIT: u32 = 5000;

pub const MIN_PAN_TILT_SPEED: f32 = 0.1;
pub const MAX_PAN_TILT_SPEED: f32 = 0.5;

const MAX_SPEED_PARAMETER: &str = "MaxPanTiltSpeed";

/// One entry of the closed tour path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPoint {
    pub position: PtzPosition,
    /// Present exactly on the points that sample a preset stop; the tour
    /// pauses here for the operator-chosen time.
    pub dwell: Option<Duration>,
}

/// Closed, immutable sequence of path points, traversed with wrap-around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourPath {
    points: Vec<PathPoint>,
}

impl TourPath {
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> &PathPoint {
        &self.points[index]
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }
}

/// Read the tour's maximum synchronized speed from the device parameter
/// store, clamped into the supported band.
pub async fn resolve_max_speed<P: Parameters>(params: &mut P) -> Result<f32, TourError> {
    let value = params.get_parameter(MAX_SPEED_PARAMETER).await?;
    tracing::info!("The value of {:?} is {:?}", MAX_SPEED_PARAMETER, value);
    let speed: f32 = value
        .trim()
        .parse()
        .ok()
        .filter(|speed: &f32| speed.is_finite())
        .ok_or_else(|| TourError::BadParameter {
            key: MAX_SPEED_PARAMETER.to_string(),
            value: value.clone(),
        })?;
    let clamped = speed.clamp(MIN_PAN_TILT_SPEED, MAX_PAN_TILT_SPEED);
    if clamped != speed {
        tracing::warn!(
            "Max pan/tilt speed {} outside [{}, {}], clamped to {}",
            speed,
            MIN_PAN_TILT_SPEED,
            MAX_PAN_TILT_SPEED,
            clamped
        );
    }
    Ok(clamped)
}

/// Poll until the device reports it is no longer moving. Bounded: gives up
/// after 5000 polls, unlike the arrival controller's convergence loop.
pub async fn wait_for_movement_to_finish<C: MotionApi>(camera: &mut C) -> Result<(), TourError> {
    let mut polls = 0u32;
    while camera.is_moving().await? {
        if polls >= MOVE_FINISH_POLL_LIMIT {
            tracing::error!(
                "Camera still moving after {} polls; giving up",
                MOVE_FINISH_POLL_LIMIT
            );
            return Err(TourError::MoveTimeout);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        polls += 1;
    }
    Ok(())
}
