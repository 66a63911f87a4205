// src/tour/arrival.rs - Poll-based arrival tracking for one waypoint transit

use tokio::time::sleep;

use crate::camera::{AxisSpeeds, MotionApi, PtzPosition};
use crate::tour::{planner, TourError, MOVE_SAFETY_TIMEOUT, POLL_INTERVAL};

/// Pan and tilt travel at a roughly fixed physical rate, so they share a
/// fixed positional band in unitless counts.
pub const PAN_TILT_TOLERANCE: i32 = 200;

/// Zoom's physical rate tracks the commanded speed, so its band does too:
/// 0.05 of the commanded speed at the wire's Q16.16 count scale.
pub const ZOOM_TOLERANCE_PER_SPEED: f32 = 0.05 * 65536.0;

/// Polls between stall warnings, about one minute apart.
const STALL_WARN_POLLS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisState {
    Moving,
    Arrived,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct AxisProgress {
    target: i32,
    speed: f32,
    state: AxisState,
}

impl AxisProgress {
    fn new(target: i32, speed: f32) -> Self {
        // Nothing to wait for on an axis that was never commanded.
        let state = if speed == 0.0 {
            AxisState::Stopped
        } else {
            AxisState::Moving
        };
        Self {
            target,
            speed,
            state,
        }
    }

    /// Direction-aware arrival test with a closed tolerance band: an axis
    /// exactly on the band edge has arrived.
    fn check(&mut self, current: i32, tolerance: i32) {
        if self.state != AxisState::Moving {
            return;
        }
        let arrived = if self.speed > 0.0 {
            current >= self.target - tolerance
        } else {
            current <= self.target + tolerance
        };
        if arrived {
            self.state = AxisState::Arrived;
        }
    }
}

fn zoom_tolerance(speed: f32) -> i32 {
    (speed.abs() * ZOOM_TOLERANCE_PER_SPEED) as i32
}

/// Tracks per-axis progress toward one waypoint, stopping axes as they
/// arrive and re-balancing the speeds of the axes still under way.
#[derive(Debug)]
pub struct ArrivalController {
    target: PtzPosition,
    max_speed: f32,
    pan: AxisProgress,
    tilt: AxisProgress,
    zoom: AxisProgress,
}

impl ArrivalController {
    pub fn new(target: PtzPosition, speeds: AxisSpeeds, max_speed: f32) -> Self {
        Self {
            target,
            max_speed,
            pan: AxisProgress::new(target.pan, speeds.pan),
            tilt: AxisProgress::new(target.tilt, speeds.tilt),
            zoom: AxisProgress::new(target.zoom, speeds.zoom),
        }
    }

    pub fn states(&self) -> [AxisState; 3] {
        [self.pan.state, self.tilt.state, self.zoom.state]
    }

    fn all_stopped(&self) -> bool {
        self.states().iter().all(|state| *state == AxisState::Stopped)
    }

    fn active(&self) -> [bool; 3] {
        self.states().map(|state| state == AxisState::Moving)
    }

    /// Poll until every axis has arrived and stopped.
    ///
    /// Deliberately unbounded, unlike the simple movement-finished wait: a
    /// mechanism that never reports arrival keeps this loop polling forever,
    /// with a periodic warning so the stall is visible in logs.
    pub async fn converge<C: MotionApi>(&mut self, camera: &mut C) -> Result<(), TourError> {
        let mut polls: u32 = 0;
        while !self.all_stopped() {
            let status = camera.status().await?;
            tracing::debug!(
                "Arrival check: at ({}, {}, {}), heading for ({}, {}, {})",
                status.pan,
                status.tilt,
                status.zoom,
                self.target.pan,
                self.target.tilt,
                self.target.zoom
            );
            self.pan.check(status.pan, PAN_TILT_TOLERANCE);
            self.tilt.check(status.tilt, PAN_TILT_TOLERANCE);
            self.zoom.check(status.zoom, zoom_tolerance(self.zoom.speed));
            if self.take_arrivals() {
                self.stop_and_replan(camera).await?;
                if self.all_stopped() {
                    break;
                }
            }
            polls += 1;
            if polls % STALL_WARN_POLLS == 0 {
                tracing::warn!(
                    "Still converging on ({}, {}, {}) after {} polls",
                    self.target.pan,
                    self.target.tilt,
                    self.target.zoom,
                    polls
                );
            }
            sleep(POLL_INTERVAL).await;
        }
        tracing::info!(
            "Arrived at pan {} tilt {} zoom {}",
            self.target.pan,
            self.target.tilt,
            self.target.zoom
        );
        Ok(())
    }

    /// Mark every freshly arrived axis stopped. Returns whether any was.
    fn take_arrivals(&mut self) -> bool {
        let mut any = false;
        for axis in [&mut self.pan, &mut self.tilt, &mut self.zoom] {
            if axis.state == AxisState::Arrived {
                axis.state = AxisState::Stopped;
                axis.speed = 0.0;
                any = true;
            }
        }
        any
    }

    /// The device only stops pan+tilt jointly or zoom alone, so stop
    /// everything, then re-issue movement for the axes still under way with
    /// speeds re-balanced around the new dominant axis.
    async fn stop_and_replan<C: MotionApi>(&mut self, camera: &mut C) -> Result<(), TourError> {
        camera.stop_continuous(true, true).await?;
        if self.all_stopped() {
            return Ok(());
        }
        let current = camera.status().await?;
        let speeds = planner::plan_active(current, self.target, self.max_speed, self.active());
        self.pan.speed = speeds.pan;
        self.tilt.speed = speeds.tilt;
        self.zoom.speed = speeds.zoom;
        tracing::info!(
            "Replanned speeds pan {:.3} tilt {:.3} zoom {:.3}",
            speeds.pan,
            speeds.tilt,
            speeds.zoom
        );
        camera.continuous_move(speeds, MOVE_SAFETY_TIMEOUT).await?;
        Ok(())
    }
}
