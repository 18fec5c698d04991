//! Data model for the resolved multimodal network.
//!
//! Contains the entity types and the arena holding them. Entities
//! reference each other exclusively through handles, never by ownership,
//! so the apparent node/link/turn cycles are plain lookups.

pub mod geometry;
pub mod network;
pub mod road;
pub mod transit;
pub mod zones;

pub use network::{Network, NetworkSummary};
pub use road::{Link, LinkClass, Mode, Node, RoadType, Turn};
pub use transit::{BusStop, TransitLine, Vehicle, WalkEdge};
pub use zones::{Centroid, CentroidConfig, Connector, ConnectorDirection, ConnectorEnd};
