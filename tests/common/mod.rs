// tests/common/mod.rs - Scripted PTZ collaborator for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ptztour::camera::{
    AxisSpeeds, CameraError, MotionApi, Parameters, PtzLimits, PtzPosition, QueueInfo, QueueOp,
    REQUIRED_CAPABILITIES,
};

/// Unitless counts pan and tilt cover per status poll at a commanded speed
/// of 1.0.
pub const PAN_TILT_RATE: f32 = 500.0;
/// Zoom covers counts proportionally faster, matching its wire scale.
pub const ZOOM_RATE: f32 = 6553.6;

#[derive(Debug, Default)]
struct SimState {
    position: PtzPosition,
    speeds: AxisSpeeds,
    presets: HashMap<u32, PtzPosition>,
    labels: Vec<String>,
    parameters: HashMap<String, String>,
    moving_polls: u32,
    commands: Vec<String>,
}

/// Deterministic stand-in for the camera's motion service: presets snap the
/// position instantly after a short "moving" phase, continuous movement
/// advances the position linearly on every status poll, and every command
/// is logged for assertions.
#[derive(Debug, Clone, Default)]
pub struct SimCamera {
    state: Arc<Mutex<SimState>>,
}

impl SimCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_preset(&self, index: u32, label: &str, position: PtzPosition) {
        let mut state = self.state.lock().unwrap();
        state.presets.insert(index, position);
        state.labels.push(label.to_string());
    }

    pub fn set_parameter(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .parameters
            .insert(key.to_string(), value.to_string());
    }

    pub fn position(&self) -> PtzPosition {
        self.state.lock().unwrap().position
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    fn advance(state: &mut SimState) {
        state.position.pan += (state.speeds.pan * PAN_TILT_RATE) as i32;
        state.position.tilt += (state.speeds.tilt * PAN_TILT_RATE) as i32;
        state.position.zoom += (state.speeds.zoom * ZOOM_RATE) as i32;
    }
}

#[async_trait]
impl MotionApi for SimCamera {
    async fn move_capabilities(&mut self) -> Result<Vec<String>, CameraError> {
        Ok(REQUIRED_CAPABILITIES.iter().map(|s| s.to_string()).collect())
    }

    async fn is_moving(&mut self) -> Result<bool, CameraError> {
        let mut state = self.state.lock().unwrap();
        if state.moving_polls > 0 {
            state.moving_polls -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn absolute_move(&mut self, target: PtzPosition, _speed: f32) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();
        state
            .commands
            .push(format!("abs {} {} {}", target.pan, target.tilt, target.zoom));
        state.position = target;
        state.moving_polls = 2;
        Ok(())
    }

    async fn continuous_move(
        &mut self,
        speeds: AxisSpeeds,
        _timeout: Duration,
    ) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(format!(
            "cont {:.3} {:.3} {:.3}",
            speeds.pan, speeds.tilt, speeds.zoom
        ));
        state.speeds = speeds;
        Ok(())
    }

    async fn stop_continuous(
        &mut self,
        stop_pan_tilt: bool,
        stop_zoom: bool,
    ) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();
        state
            .commands
            .push(format!("stop {} {}", stop_pan_tilt as u8, stop_zoom as u8));
        if stop_pan_tilt {
            state.speeds.pan = 0.0;
            state.speeds.tilt = 0.0;
        }
        if stop_zoom {
            state.speeds.zoom = 0.0;
        }
        Ok(())
    }

    async fn status(&mut self) -> Result<PtzPosition, CameraError> {
        let mut state = self.state.lock().unwrap();
        Self::advance(&mut state);
        Ok(state.position)
    }

    async fn limits(&mut self) -> Result<PtzLimits, CameraError> {
        Ok(PtzLimits {
            pan_min: -32768,
            pan_max: 32768,
            tilt_min: -16384,
            tilt_max: 3641,
            zoom_min: 3,
            zoom_max: 35748,
        })
    }

    async fn list_presets(&mut self) -> Result<Vec<String>, CameraError> {
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn goto_preset(&mut self, index: u32, _speed: f32) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(format!("goto {}", index));
        let position = *state
            .presets
            .get(&index)
            .ok_or_else(|| CameraError::Rejected(format!("no preset {}", index)))?;
        state.position = position;
        state.moving_polls = 2;
        Ok(())
    }

    async fn queue_request(&mut self, op: QueueOp) -> Result<QueueInfo, CameraError> {
        let verb = match op {
            QueueOp::Drop => "drop",
            QueueOp::Get => "get",
            QueueOp::QueryStatus => "query",
        };
        self.state
            .lock()
            .unwrap()
            .commands
            .push(format!("queue {}", verb));
        Ok(QueueInfo {
            queue_pos: 1,
            time_to_pos_one: 0,
            poll_time: 5000,
        })
    }

    async fn reacquire_group(&mut self) -> Result<(), CameraError> {
        self.state.lock().unwrap().commands.push("group".to_string());
        Ok(())
    }
}

#[async_trait]
impl Parameters for SimCamera {
    async fn get_parameter(&mut self, key: &str) -> Result<String, CameraError> {
        self.state
            .lock()
            .unwrap()
            .parameters
            .get(key)
            .cloned()
            .ok_or_else(|| CameraError::Rejected(format!("no parameter {}", key)))
    }
}
