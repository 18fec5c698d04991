//! Road network components - nodes, links, turns and their registries.

use fixedbitset::FixedBitSet;
use geo::Point;

use crate::model::geometry::polyline_length;
use crate::{LinkId, ModeId, NodeId, RoadTypeId, VehicleId};

/// Intersection or terminus in the road graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub external_id: String,
    /// Node coordinates
    pub position: Point<f64>,
    /// Synthetic nodes anchor boarding links and take no part in turn
    /// inference.
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    Road,
    /// Synthetic boarding link at a transit line origin.
    Boarding,
}

/// Directed road segment between two nodes.
///
/// Endpoints live on the graph edge holding the link; the geometry always
/// starts at the origin position and ends at the destination position,
/// with any curvature points in between.
#[derive(Debug, Clone)]
pub struct Link {
    pub external_id: String,
    pub class: LinkClass,
    /// Lane count, never below one.
    pub lanes: usize,
    pub lane_width: f64,
    /// Free-flow speed.
    pub speed: f64,
    pub capacity_per_lane: f64,
    /// User-defined cost consumed by volume-delay functions.
    pub user_cost: f64,
    /// Modes allowed on this link, as indices into the mode registry.
    pub allowed_modes: FixedBitSet,
    /// Explicit vehicle whitelist; `None` defers to `allowed_modes`.
    pub allowed_vehicles: Option<Vec<VehicleId>>,
    pub road_type: RoadTypeId,
    pub geometry: Vec<Point<f64>>,
}

impl Link {
    pub fn length(&self) -> f64 {
        polyline_length(&self.geometry)
    }

    pub fn capacity(&self) -> f64 {
        self.lanes as f64 * self.capacity_per_lane
    }

    pub fn allows_vehicle(&self, vehicle: VehicleId, vehicle_mode: Option<ModeId>) -> bool {
        match (&self.allowed_vehicles, vehicle_mode) {
            (Some(list), _) => list.contains(&vehicle),
            (None, Some(mode)) => self.allowed_modes.contains(mode),
            (None, None) => false,
        }
    }
}

/// Allowed movement from one link onto another at their shared node.
#[derive(Debug, Clone)]
pub struct Turn {
    pub external_id: String,
    pub at: NodeId,
    pub from: LinkId,
    pub to: LinkId,
}

/// Travel mode declared by the modes section.
#[derive(Debug, Clone)]
pub struct Mode {
    /// Single-letter mode key used in link records.
    pub external_id: String,
    pub name: String,
}

/// Road type tag, one per declared volume-delay function.
#[derive(Debug, Clone)]
pub struct RoadType {
    pub external_id: String,
    pub name: String,
    /// Hidden types exist only for synthetic boarding links.
    pub hidden: bool,
}
