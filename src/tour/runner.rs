// src/tour/runner.rs - Endless tour over the closed path

use tokio::time::sleep;

use crate::camera::{MotionApi, QueueOp};
use crate::tour::arrival::ArrivalController;
use crate::tour::{planner, TourError, TourPath, MOVE_SAFETY_TIMEOUT, SETTLE_TIME};

/// Drives the camera around the closed path forever, one waypoint transit
/// at a time. The path is immutable for the life of the tour.
pub struct Tour<C> {
    camera: C,
    path: TourPath,
    max_speed: f32,
    cursor: usize,
    lap: u64,
}

impl<C: MotionApi> Tour<C> {
    pub fn new(camera: C, path: TourPath, max_speed: f32) -> Self {
        Self {
            camera,
            path,
            max_speed,
            cursor: 0,
            lap: 0,
        }
    }

    /// Index of the next path point to visit.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Completed laps around the path.
    pub fn lap(&self) -> u64 {
        self.lap
    }

    pub fn into_camera(self) -> C {
        self.camera
    }

    /// Run forever. Returns only with a fatal error; there is no natural
    /// exit from the tour.
    pub async fn run(&mut self) -> Result<(), TourError> {
        tracing::info!(
            "Endless tour along {} path points starting",
            self.path.len()
        );
        loop {
            self.step().await?;
        }
    }

    /// One waypoint transit: arbitrate for motion control, plan synchronized
    /// speeds, move, converge, dwell if this point samples a preset, advance.
    pub async fn step(&mut self) -> Result<(), TourError> {
        self.acquire_control().await?;

        let point = *self.path.get(self.cursor);
        let from = self.camera.status().await?;
        tracing::info!(
            "Path point {}/{}: from ({}, {}, {}) to ({}, {}, {})",
            self.cursor + 1,
            self.path.len(),
            from.pan,
            from.tilt,
            from.zoom,
            point.position.pan,
            point.position.tilt,
            point.position.zoom
        );

        let speeds = planner::plan(from, point.position, self.max_speed);
        tracing::info!(
            "Planned speeds pan {:.3} tilt {:.3} zoom {:.3} (max {:.3})",
            speeds.pan,
            speeds.tilt,
            speeds.zoom,
            self.max_speed
        );
        self.camera.continuous_move(speeds, MOVE_SAFETY_TIMEOUT).await?;
        sleep(SETTLE_TIME).await;

        let mut controller = ArrivalController::new(point.position, speeds, self.max_speed);
        controller.converge(&mut self.camera).await?;

        if let Some(dwell) = point.dwell {
            tracing::info!(
                "Dwelling {} ms at path point {}",
                dwell.as_millis(),
                self.cursor
            );
            sleep(dwell).await;
        }

        self.cursor += 1;
        if self.cursor == self.path.len() {
            self.cursor = 0;
            self.lap += 1;
            tracing::info!("Tour lap {} complete", self.lap);
        }
        Ok(())
    }

    /// Take exclusive motion control for the coming transit: drop whatever
    /// queue position we hold, take the queue, and re-resolve our group
    /// handle. Any failure here is fatal to the tour.
    async fn acquire_control(&mut self) -> Result<(), TourError> {
        let info = self.camera.queue_request(QueueOp::Drop).await?;
        tracing::debug!(
            "Control queue drop: pos {} time_to_pos_one {} poll {}",
            info.queue_pos,
            info.time_to_pos_one,
            info.poll_time
        );
        let info = self.camera.queue_request(QueueOp::Get).await?;
        tracing::debug!(
            "Control queue get: pos {} time_to_pos_one {} poll {}",
            info.queue_pos,
            info.time_to_pos_one,
            info.poll_time
        );
        self.camera.reacquire_group().await?;
        Ok(())
    }
}

/// Give up motion control and report the queue state. Used on the clean
/// exit paths, where another application should take over smoothly.
pub async fn release_control<C: MotionApi>(camera: &mut C) -> Result<(), TourError> {
    let info = camera.queue_request(QueueOp::Drop).await?;
    tracing::info!(
        "Control dropped: queue pos {} time_to_pos_one {} poll {}",
        info.queue_pos,
        info.time_to_pos_one,
        info.poll_time
    );
    let info = camera.queue_request(QueueOp::QueryStatus).await?;
    tracing::info!(
        "Queue status: pos {} time_to_pos_one {} poll {}",
        info.queue_pos,
        info.time_to_pos_one,
        info.poll_time
    );
    Ok(())
}
