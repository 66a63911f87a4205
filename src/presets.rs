// src/presets.rs - Preset label decoding and tour-stop listing

use crate::camera::{CameraError, MotionApi};

/// Head token of the device home preset; the home position is never toured.
pub const HOME_PRESET_HEAD: &str = "presetposno1";

/// Most stops honored in one tour.
pub const MAX_STOPS: usize = 20;

const MIN_LABEL_LEN: usize = 17;
const MAX_LABEL_LEN: usize = 30;
const HEAD_PREFIX_LEN: usize = 11;
const MAX_HEAD_LEN: usize = 14;

/// One operator-defined tour stop, decoded from a preset label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetStop {
    /// Physical preset to recall.
    pub index: u32,
    /// Operator-chosen visiting rank.
    pub order: i32,
    /// Pause when physically at this stop.
    pub dwell_ms: u64,
}

/// Decode an operator preset label.
///
/// Grammar: `<head>_<order>_<dwell_ms>` where `<head>` is an 11-character
/// prefix followed by 1..=3 decimal digits of preset index, `<order>` and
/// `<dwell_ms>` are decimal, and the whole label is 17..=30 bytes. `=` is
/// accepted as a delimiter alongside `_`. Labels outside the grammar, and
/// the reserved home head, decode to `None`; rejection is never an error.
pub fn decode_label(label: &str) -> Option<PresetStop> {
    if label.len() < MIN_LABEL_LEN || label.len() > MAX_LABEL_LEN {
        return None;
    }
    let mut tokens = label.split(['_', '=']);
    let head = tokens.next()?;
    if head == HOME_PRESET_HEAD {
        return None;
    }
    if head.len() <= HEAD_PREFIX_LEN || head.len() > MAX_HEAD_LEN {
        return None;
    }
    let index: u32 = head.get(HEAD_PREFIX_LEN..)?.parse().ok()?;
    let order: i32 = tokens.next()?.parse().ok()?;
    let dwell_ms: u64 = tokens.next()?.parse().ok()?;
    Some(PresetStop {
        index,
        order,
        dwell_ms,
    })
}

/// Decode every usable label, keeping at most [`MAX_STOPS`], sorted
/// ascending by operator order. The sort is stable, so equal orders keep
/// their device listing order.
pub fn collect_stops<'a, I>(labels: I) -> Vec<PresetStop>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stops = Vec::new();
    for label in labels {
        if stops.len() == MAX_STOPS {
            tracing::warn!("More than {} usable presets; ignoring the rest", MAX_STOPS);
            break;
        }
        match decode_label(label) {
            Some(stop) => {
                tracing::info!(
                    "Preset stop {}: index {} order {} dwell {} ms ({})",
                    stops.len(),
                    stop.index,
                    stop.order,
                    stop.dwell_ms,
                    label
                );
                stops.push(stop);
            }
            None => tracing::debug!("Skipping preset label {:?}", label),
        }
    }
    stops.sort_by_key(|stop| stop.order);
    stops
}

/// List the tour stops stored on the device. Fails only if the listing call
/// itself fails; unusable labels are skipped.
pub async fn list_stops<C: MotionApi>(camera: &mut C) -> Result<Vec<PresetStop>, CameraError> {
    let labels = camera.list_presets().await?;
    Ok(collect_stops(labels.iter().map(String::as_str)))
}
