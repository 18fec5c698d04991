//! Synthesis of a multimodal transportation network from EMME flat-file
//! exports.
//!
//! An EMME "network package" describes a transport model as a handful of
//! line-oriented sectioned text files: intersections and road segments
//! (`base.211`), travel modes (`modes.201`), volume-delay functions
//! (`functions.411`), explicit turn restrictions (`turns.231`), link
//! curvature (`shapes.251`), transit vehicle types (`vehicles.202`) and
//! transit line itineraries (`transit.221`). This crate reads such a
//! package and produces a fully resolved [`Network`]: road topology with
//! turning movements, zone centroids with connector edges, transit lines
//! threaded through concrete link paths with stop objects, and a
//! distance-bounded pedestrian transfer graph between stops.
//!
//! The entry point is [`import_network`]; tunables live in
//! [`ImportConfig`]. Inconsistencies that do not prevent a usable graph
//! are collected into an [`ImportReport`] instead of failing the run.

pub mod error;
pub mod export;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod report;

pub use error::Error;
pub use loading::{ImportConfig, ImportOutcome, NetworkPackage, import_network};
pub use model::Network;
pub use report::{Defect, ImportReport};

/// Handle to a node in the road graph.
pub type NodeId = petgraph::graph::NodeIndex;
/// Handle to a directed link in the road graph.
pub type LinkId = petgraph::graph::EdgeIndex;

pub type ModeId = usize;
pub type RoadTypeId = usize;
pub type VehicleId = usize;
pub type CentroidId = usize;
pub type StopId = usize;
pub type LineId = usize;

/// Walking time in seconds.
pub type WalkingTime = f64;

/// Pedestrian walking speed in network distance units per second.
pub const WALKING_SPEED: f64 = 1.4;
/// Search radius for walking transfers between stops.
pub const TRANSFER_RADIUS: f64 = 200.0;
/// Upper bound on kept walking transfers per stop.
pub const MAX_TRANSFER_STOPS: usize = 10;
/// Nominal length of a synthetic boarding link.
pub const DUMMY_LINK_LENGTH: f64 = 20.0;
/// Attempts to repair a discontinuous transit line before reporting it.
pub const LINE_FIX_ATTEMPTS: u32 = 5;
