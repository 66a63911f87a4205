// src/lib.rs - Library surface for the tour components

pub mod camera;
pub mod config;
pub mod presets;
pub mod tour;

pub use camera::{
    AxisSpeeds, CameraError, MotionApi, Parameters, PtzLimits, PtzPosition, QueueInfo, QueueOp,
};
pub use config::{load_config, Config};
pub use presets::{decode_label, PresetStop};
pub use tour::{PathPoint, TourError, TourPath};
