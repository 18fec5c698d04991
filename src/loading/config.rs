use serde::{Deserialize, Serialize};

use crate::{
    DUMMY_LINK_LENGTH, LINE_FIX_ATTEMPTS, MAX_TRANSFER_STOPS, TRANSFER_RADIUS, WALKING_SPEED,
};

/// Tunables for one import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Search radius for walking transfers, in network distance units.
    pub transfer_radius: f64,
    /// Keep at most this many walking transfers per stop.
    pub max_transfer_stops: usize,
    /// Pedestrian walking speed in distance units per second.
    pub walking_speed: f64,
    /// Length of the synthetic boarding link at a transit line origin.
    pub dummy_link_length: f64,
    /// Attempts to repair a discontinuous transit line before reporting it.
    pub line_fix_attempts: u32,
    /// Lane width used for link construction.
    pub lane_width: f64,
    /// Setback of a line stop from its host link's downstream end.
    pub stop_setback: f64,
    /// Default physical length of a stop.
    pub stop_length: f64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            transfer_radius: TRANSFER_RADIUS,
            max_transfer_stops: MAX_TRANSFER_STOPS,
            walking_speed: WALKING_SPEED,
            dummy_link_length: DUMMY_LINK_LENGTH,
            line_fix_attempts: LINE_FIX_ATTEMPTS,
            lane_width: 2.0,
            stop_setback: 10.0,
            stop_length: 10.0,
        }
    }
}
