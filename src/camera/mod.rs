// src/camera/mod.rs - Data model and traits for the on-camera PTZ motion service

pub mod channel;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not connected to the PTZ daemon")]
    NotConnected,
    #[error("Timeout waiting for response")]
    Timeout,
    #[error("Device rejected command: {0}")]
    Rejected(String),
    #[error("Malformed response: {0}")]
    BadResponse(String),
}

/// One point in the camera's normalized unitless coordinate space.
///
/// The device reports and accepts plain counts per axis; no physical unit is
/// implied. Observed ranges are roughly ±32768 for pan/tilt and 3..35748 for
/// zoom, but the actual bounds come from [`MotionApi::limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PtzPosition {
    pub pan: i32,
    pub tilt: i32,
    pub zoom: i32,
}

/// Per-axis continuous-movement speeds in the device's normalized speed
/// space. Sign is direction; magnitude is rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisSpeeds {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

/// Unitless-space axis bounds, read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtzLimits {
    pub pan_min: i32,
    pub pan_max: i32,
    pub tilt_min: i32,
    pub tilt_max: i32,
    pub zoom_min: i32,
    pub zoom_max: i32,
}

/// Operations on the shared control queue that arbitrates motion authority
/// between applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOp {
    Drop,
    Get,
    QueryStatus,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueInfo {
    pub queue_pos: i32,
    pub time_to_pos_one: i32,
    pub poll_time: i32,
}

/// Capability tags the tour requires before it will run.
pub const REQUIRED_CAPABILITIES: [&str; 6] = [
    "abs-pan", "abs-tilt", "abs-zoom", "cont-pan", "cont-tilt", "cont-zoom",
];

/// Motion and preset surface of the PTZ service.
///
/// Movement commands are fire-and-forget at the device: an `Ok` means the
/// command was accepted, not that the motion completed. Completion is
/// observed through [`MotionApi::is_moving`] and [`MotionApi::status`].
#[async_trait]
pub trait MotionApi {
    async fn move_capabilities(&mut self) -> Result<Vec<String>, CameraError>;

    async fn is_moving(&mut self) -> Result<bool, CameraError>;

    async fn absolute_move(&mut self, target: PtzPosition, speed: f32) -> Result<(), CameraError>;

    /// Start moving at the given per-axis speeds until stopped or until the
    /// device-side `timeout` elapses.
    async fn continuous_move(
        &mut self,
        speeds: AxisSpeeds,
        timeout: Duration,
    ) -> Result<(), CameraError>;

    /// Stop a continuous movement. The device only supports stopping pan and
    /// tilt jointly, or zoom alone.
    async fn stop_continuous(
        &mut self,
        stop_pan_tilt: bool,
        stop_zoom: bool,
    ) -> Result<(), CameraError>;

    async fn status(&mut self) -> Result<PtzPosition, CameraError>;

    async fn limits(&mut self) -> Result<PtzLimits, CameraError>;

    /// Labels of every stored preset, in device order.
    async fn list_presets(&mut self) -> Result<Vec<String>, CameraError>;

    async fn goto_preset(&mut self, index: u32, speed: f32) -> Result<(), CameraError>;

    async fn queue_request(&mut self, op: QueueOp) -> Result<QueueInfo, CameraError>;

    /// Re-resolve this application's control-queue group handle. Must be
    /// called after taking the queue before issuing movement.
    async fn reacquire_group(&mut self) -> Result<(), CameraError>;
}

/// Key-value parameter store exposed by the device.
#[async_trait]
pub trait Parameters {
    async fn get_parameter(&mut self, key: &str) -> Result<String, CameraError>;
}
