// src/tour/path.rs - Closed tour path construction from preset stops

use std::time::Duration;
use tokio::time::sleep;

use crate::camera::{MotionApi, PtzPosition};
use crate::presets::PresetStop;
use crate::tour::{wait_for_movement_to_finish, PathPoint, TourError, TourPath, POLL_INTERVAL};

/// Position actually reached for one round-trip stop, with the dwell it
/// inherits from its preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopSample {
    pub position: PtzPosition,
    pub dwell_ms: u64,
}

/// Builds the closed tour path by physically visiting every stop and
/// sampling where the camera actually ends up, then interpolating the gaps.
///
/// Sampling achieved positions rather than nominal preset coordinates
/// absorbs the device's own preset-arrival tolerance.
pub struct PathBuilder {
    interpolation_count: usize,
    goto_speed: f32,
}

impl PathBuilder {
    pub fn new(interpolation_count: usize, goto_speed: f32) -> Self {
        Self {
            interpolation_count,
            goto_speed,
        }
    }

    /// Visit every stop out and back, then close the loop. Returns `None`
    /// when fewer than two stops are usable; that is not an error, there is
    /// simply no tour to run.
    pub async fn build<C: MotionApi>(
        &self,
        camera: &mut C,
        stops: &[PresetStop],
    ) -> Result<Option<TourPath>, TourError> {
        if stops.len() < 2 {
            tracing::info!("No tour path available from {} preset stop(s)", stops.len());
            return Ok(None);
        }

        let mut samples = Vec::with_capacity(2 * stops.len() - 2);
        tracing::info!("Sampling preset positions");
        for stop in stops {
            samples.push(self.sample_stop(camera, stop).await?);
        }
        // Return leg: every stop between the two endpoints, in reverse, so
        // the loop closes without one long jump back across the range.
        for stop in stops[1..stops.len() - 1].iter().rev() {
            samples.push(self.sample_stop(camera, stop).await?);
        }

        let path = interpolate_closed(&samples, self.interpolation_count);
        for (number, point) in path.points().iter().enumerate() {
            tracing::info!(
                "Path point {}: pan {} tilt {} zoom {}{}",
                number,
                point.position.pan,
                point.position.tilt,
                point.position.zoom,
                if point.dwell.is_some() { " (stop)" } else { "" }
            );
        }
        tracing::info!("Closed tour path with {} points", path.len());
        Ok(Some(path))
    }

    async fn sample_stop<C: MotionApi>(
        &self,
        camera: &mut C,
        stop: &PresetStop,
    ) -> Result<StopSample, TourError> {
        tracing::info!("Moving to preset {} (order {})", stop.index, stop.order);
        camera.goto_preset(stop.index, self.goto_speed).await?;
        sleep(POLL_INTERVAL).await;
        wait_for_movement_to_finish(camera).await?;
        let position = camera.status().await?;
        tracing::info!(
            "Preset {} sampled at pan {} tilt {} zoom {}",
            stop.index,
            position.pan,
            position.tilt,
            position.zoom
        );
        Ok(StopSample {
            position,
            dwell_ms: stop.dwell_ms,
        })
    }
}

/// Insert `count` evenly spaced points after every sample, including along
/// the wrap edge from the last sample back to the first, closing the path.
/// Every sample keeps its dwell; interpolated points carry none.
pub fn interpolate_closed(samples: &[StopSample], count: usize) -> TourPath {
    let mut points = Vec::with_capacity(samples.len() * (count + 1));
    for (i, sample) in samples.iter().enumerate() {
        points.push(PathPoint {
            position: sample.position,
            dwell: Some(Duration::from_millis(sample.dwell_ms)),
        });
        let next = samples[(i + 1) % samples.len()].position;
        for k in 1..=count {
            points.push(PathPoint {
                position: lerp(sample.position, next, k as i64, (count + 1) as i64),
                dwell: None,
            });
        }
    }
    TourPath::new(points)
}

// Per-axis linear interpolation at num/den, in i64 to keep the product of a
// full-range delta and the numerator out of overflow.
fn lerp(a: PtzPosition, b: PtzPosition, num: i64, den: i64) -> PtzPosition {
    let axis = |a: i32, b: i32| (a as i64 + (b as i64 - a as i64) * num / den) as i32;
    PtzPosition {
        pan: axis(a.pan, b.pan),
        tilt: axis(a.tilt, b.tilt),
        zoom: axis(a.zoom, b.zoom),
    }
}
