//! Zone components - centroids, connector edges and the centroid
//! configuration.

use geo::Point;

use crate::{CentroidId, NodeId, StopId};

/// Network endpoint of a centroid connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorEnd {
    Node(NodeId),
    Stop(StopId),
}

/// Direction of flow over a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorDirection {
    /// From the network endpoint into the centroid.
    ToCentroid,
    /// From the centroid out to the network endpoint.
    FromCentroid,
}

/// Connector edge between a centroid and the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    pub end: ConnectorEnd,
    pub direction: ConnectorDirection,
}

/// Aggregate demand origin/destination anchored to the graph by
/// connector edges.
#[derive(Debug, Clone)]
pub struct Centroid {
    pub external_id: String,
    pub position: Point<f64>,
    pub connectors: Vec<Connector>,
}

/// Named set of centroids forming one demand configuration.
#[derive(Debug, Clone)]
pub struct CentroidConfig {
    pub external_id: String,
    pub centroids: Vec<CentroidId>,
}
