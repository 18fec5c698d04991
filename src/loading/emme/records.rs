//! Typed records extracted from the flat-file sections, in file order.

use geo::Point;

/// `a` / `a*` row in the nodes section of the base network.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// `a*` marker: the node is a zone centroid.
    pub centroid: bool,
}

/// `a` row in the links section of the base network.
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub from: String,
    pub to: String,
    /// Concatenated single-letter mode keys allowed on the link.
    pub modes: String,
    pub lanes: f64,
    /// Volume-delay function code; resolves to road type `fd{vdf}`.
    pub vdf: String,
    pub user_cost: f64,
    pub speed: f64,
    pub capacity_per_lane: f64,
}

/// Explicit allowed-turn row (`flag == -1`) from the turns file.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub at: String,
    pub from_node: String,
    pub to_node: String,
}

/// Mode declaration.
#[derive(Debug, Clone)]
pub struct ModeRecord {
    pub id: String,
    pub name: String,
}

/// Volume-delay function declaration.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub name: String,
}

/// `r`-headed block of curvature points from the shapes file.
#[derive(Debug, Clone)]
pub struct ShapeRecord {
    pub from: String,
    pub to: String,
    pub points: Vec<Point<f64>>,
}

/// Transit vehicle type declaration.
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub id: String,
    pub name: String,
    pub mode: String,
    pub seating_capacity: f64,
    pub total_capacity: f64,
    pub pcus: u32,
}

/// One step of a transit line's node path.
#[derive(Debug, Clone)]
pub struct PathStep {
    pub node: String,
    /// Dwell time indicator; non-zero means the line stops here.
    pub dwell: f64,
}

/// Header plus continuation rows of one transit line.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub id: String,
    pub vehicle: String,
    pub name: String,
    pub path: Vec<PathStep>,
}
