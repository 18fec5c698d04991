//! Transit components - vehicle types, stops, lines and walking transfers.

use crate::{LinkId, ModeId, StopId, VehicleId, WalkingTime};

/// Vehicle type available on the network. Base vehicles come from the
/// modes section, transit vehicles from `vehicles.202`.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub external_id: String,
    pub name: String,
    /// Unresolvable mode references are tolerated.
    pub mode: Option<ModeId>,
    pub seating_capacity: f64,
    pub total_capacity: f64,
    /// Passenger-car units occupied by one vehicle.
    pub pcus: u32,
}

/// Boarding/alighting point fixed to a link.
#[derive(Debug, Clone)]
pub struct BusStop {
    pub external_id: String,
    pub link: LinkId,
    /// Lateral lane index occupied by the stop.
    pub lane: usize,
    /// Longitudinal offset from the link start.
    pub position: f64,
    pub length: f64,
    /// Range into [`crate::Network::walk_edges`] written by the transfer
    /// builder.
    pub transfers_start: usize,
    pub transfers_len: usize,
}

/// Scheduled service route threaded through the link graph.
#[derive(Debug, Clone)]
pub struct TransitLine {
    pub external_id: String,
    pub name: String,
    pub vehicle: VehicleId,
    /// The entire traversal including the boarding link. `None` marks a
    /// path step that could not be resolved to a link.
    pub path: Vec<Option<LinkId>>,
    /// Aligned with `path` plus one leading slot; `None` means no boarding
    /// or alighting at that point.
    pub stops: Vec<Option<StopId>>,
    /// Whether continuity validation passed within the repair bound.
    pub continuous: bool,
}

/// Directed pedestrian transfer between two stops.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEdge {
    pub from: StopId,
    pub to: StopId,
    pub time: WalkingTime,
}
