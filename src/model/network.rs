//! The network arena: topology, entity storage and the external-id
//! catalog.
//!
//! Every pipeline stage commits entities through the methods here and
//! resolves references through the `find_*` lookups, so later stages only
//! ever see handles minted by earlier ones.

use std::fmt;

use geo::Point;
use hashbrown::HashMap;
use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::error::Error;
use crate::model::geometry::point_at_offset;
use crate::model::road::{Link, Mode, Node, RoadType, Turn};
use crate::model::transit::{BusStop, TransitLine, Vehicle, WalkEdge};
use crate::model::zones::{Centroid, CentroidConfig};
use crate::{CentroidId, LineId, LinkId, ModeId, NodeId, RoadTypeId, StopId, VehicleId};

/// Fully resolved network produced by one import run.
#[derive(Debug, Default)]
pub struct Network {
    /// Road topology; node weights are [`Node`]s, edge weights [`Link`]s.
    pub graph: DiGraph<Node, Link>,
    /// Turning movements per node.
    pub turns: HashMap<NodeId, Vec<Turn>>,
    pub modes: Vec<Mode>,
    pub road_types: Vec<RoadType>,
    pub vehicles: Vec<Vehicle>,
    pub centroids: Vec<Centroid>,
    pub centroid_config: Option<CentroidConfig>,
    pub stops: Vec<BusStop>,
    pub lines: Vec<TransitLine>,
    /// Flat walking-transfer storage; each stop indexes its own range.
    pub walk_edges: Vec<WalkEdge>,

    node_index: HashMap<String, NodeId>,
    link_index: HashMap<String, LinkId>,
    mode_index: HashMap<String, ModeId>,
    road_type_index: HashMap<String, RoadTypeId>,
    vehicle_index: HashMap<String, VehicleId>,
    centroid_index: HashMap<String, CentroidId>,
    stop_index: HashMap<String, StopId>,
    line_index: HashMap<String, LineId>,
    stops_by_link: HashMap<LinkId, Vec<StopId>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a road node. Duplicate external ids are fatal.
    pub fn add_node(&mut self, external_id: &str, position: Point<f64>) -> Result<NodeId, Error> {
        self.insert_node(external_id, position, false)
    }

    /// Creates a synthetic node anchoring a boarding link.
    pub(crate) fn add_synthetic_node(
        &mut self,
        external_id: &str,
        position: Point<f64>,
    ) -> Result<NodeId, Error> {
        self.insert_node(external_id, position, true)
    }

    fn insert_node(
        &mut self,
        external_id: &str,
        position: Point<f64>,
        synthetic: bool,
    ) -> Result<NodeId, Error> {
        if self.node_index.contains_key(external_id) {
            return Err(Error::DuplicateExternalId(external_id.to_string()));
        }
        let id = self.graph.add_node(Node {
            external_id: external_id.to_string(),
            position,
            synthetic,
        });
        self.node_index.insert(external_id.to_string(), id);
        Ok(id)
    }

    /// Creates a directed link between two committed nodes.
    pub fn add_link(
        &mut self,
        origin: NodeId,
        destination: NodeId,
        link: Link,
    ) -> Result<LinkId, Error> {
        if self.link_index.contains_key(&link.external_id) {
            return Err(Error::DuplicateExternalId(link.external_id.clone()));
        }
        let key = link.external_id.clone();
        let id = self.graph.add_edge(origin, destination, link);
        self.link_index.insert(key, id);
        Ok(id)
    }

    /// Creates the turn unless the (from, to) pair already exists at the
    /// node. Returns whether a new turn was created.
    pub fn add_turn(&mut self, at: NodeId, from: LinkId, to: LinkId) -> bool {
        let external_id = format!(
            "turn_{}_{}",
            self.graph[from].external_id, self.graph[to].external_id
        );
        let list = self.turns.entry(at).or_default();
        if list.iter().any(|t| t.from == from && t.to == to) {
            return false;
        }
        list.push(Turn {
            external_id,
            at,
            from,
            to,
        });
        true
    }

    pub fn turn_exists(&self, at: NodeId, from: LinkId, to: LinkId) -> bool {
        self.turns
            .get(&at)
            .is_some_and(|list| list.iter().any(|t| t.from == from && t.to == to))
    }

    pub fn turns_at(&self, node: NodeId) -> &[Turn] {
        match self.turns.get(&node) {
            Some(list) => list,
            None => &[],
        }
    }

    /// Sorts a node's turns by destination link external id so downstream
    /// consumers get a deterministic enumeration order.
    pub fn order_turnings(&mut self, node: NodeId) {
        let graph = &self.graph;
        if let Some(list) = self.turns.get_mut(&node) {
            list.sort_by(|a, b| graph[a.to].external_id.cmp(&graph[b.to].external_id));
        }
    }

    /// Registers a mode, returning the existing handle on repeat ids.
    pub fn add_mode(&mut self, mode: Mode) -> ModeId {
        if let Some(&existing) = self.mode_index.get(&mode.external_id) {
            return existing;
        }
        let id = self.modes.len();
        self.mode_index.insert(mode.external_id.clone(), id);
        self.modes.push(mode);
        id
    }

    /// Registers a road type, returning the existing handle on repeat ids.
    pub fn add_road_type(&mut self, road_type: RoadType) -> RoadTypeId {
        if let Some(&existing) = self.road_type_index.get(&road_type.external_id) {
            return existing;
        }
        let id = self.road_types.len();
        self.road_type_index.insert(road_type.external_id.clone(), id);
        self.road_types.push(road_type);
        id
    }

    /// Registers a vehicle type, returning the existing handle on repeat
    /// ids.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleId {
        if let Some(&existing) = self.vehicle_index.get(&vehicle.external_id) {
            return existing;
        }
        let id = self.vehicles.len();
        self.vehicle_index.insert(vehicle.external_id.clone(), id);
        self.vehicles.push(vehicle);
        id
    }

    /// Returns the centroid registered under `external_id`, creating it on
    /// first request. Connector declarations may arrive from multiple
    /// source sections, so repeat requests must not duplicate the entity.
    pub fn get_or_create_centroid(&mut self, external_id: &str, position: Point<f64>) -> CentroidId {
        if let Some(&existing) = self.centroid_index.get(external_id) {
            return existing;
        }
        let id = self.centroids.len();
        self.centroid_index.insert(external_id.to_string(), id);
        self.centroids.push(Centroid {
            external_id: external_id.to_string(),
            position,
            connectors: Vec::new(),
        });
        id
    }

    /// Returns the stop registered under the record's external id,
    /// creating it on first request.
    pub fn get_or_create_stop(&mut self, stop: BusStop) -> StopId {
        if let Some(&existing) = self.stop_index.get(&stop.external_id) {
            return existing;
        }
        let id = self.stops.len();
        self.stop_index.insert(stop.external_id.clone(), id);
        self.stops_by_link.entry(stop.link).or_default().push(id);
        self.stops.push(stop);
        id
    }

    pub fn add_line(&mut self, line: TransitLine) -> LineId {
        let id = self.lines.len();
        self.line_index.insert(line.external_id.clone(), id);
        self.lines.push(line);
        id
    }

    pub fn find_node(&self, external_id: &str) -> Option<NodeId> {
        self.node_index.get(external_id).copied()
    }

    pub fn find_link(&self, external_id: &str) -> Option<LinkId> {
        self.link_index.get(external_id).copied()
    }

    pub fn find_mode(&self, external_id: &str) -> Option<ModeId> {
        self.mode_index.get(external_id).copied()
    }

    pub fn find_road_type(&self, external_id: &str) -> Option<RoadTypeId> {
        self.road_type_index.get(external_id).copied()
    }

    pub fn find_vehicle(&self, external_id: &str) -> Option<VehicleId> {
        self.vehicle_index.get(external_id).copied()
    }

    pub fn find_centroid(&self, external_id: &str) -> Option<CentroidId> {
        self.centroid_index.get(external_id).copied()
    }

    pub fn find_stop(&self, external_id: &str) -> Option<StopId> {
        self.stop_index.get(external_id).copied()
    }

    pub fn find_line(&self, external_id: &str) -> Option<LineId> {
        self.line_index.get(external_id).copied()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.graph[id]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.graph[id]
    }

    pub fn link_endpoints(&self, id: LinkId) -> (NodeId, NodeId) {
        self.graph
            .edge_endpoints(id)
            .expect("link handles are only minted by add_link")
    }

    /// Links terminating at `node`, in creation order.
    pub fn incoming_links(&self, node: NodeId) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Links departing `node`, in creation order.
    pub fn outgoing_links(&self, node: NodeId) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn stops_on_link(&self, link: LinkId) -> &[StopId] {
        match self.stops_by_link.get(&link) {
            Some(list) => list,
            None => &[],
        }
    }

    /// Absolute position of a stop along its host link's geometry.
    pub fn stop_position(&self, stop: StopId) -> Point<f64> {
        let stop = &self.stops[stop];
        point_at_offset(&self.link(stop.link).geometry, stop.position)
    }

    /// Walking transfers departing a stop, ascending by time.
    pub fn walk_transfers(&self, stop: StopId) -> &[WalkEdge] {
        let stop = &self.stops[stop];
        &self.walk_edges[stop.transfers_start..stop.transfers_start + stop.transfers_len]
    }

    pub fn turn_count(&self) -> usize {
        self.turns.values().map(Vec::len).sum()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            nodes: self.graph.node_count(),
            links: self.graph.edge_count(),
            turns: self.turn_count(),
            modes: self.modes.len(),
            road_types: self.road_types.len(),
            vehicles: self.vehicles.len(),
            centroids: self.centroids.len(),
            stops: self.stops.len(),
            lines: self.lines.len(),
            walk_edges: self.walk_edges.len(),
        }
    }
}

/// Entity counts for one resolved network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub links: usize,
    pub turns: usize,
    pub modes: usize,
    pub road_types: usize,
    pub vehicles: usize,
    pub centroids: usize,
    pub stops: usize,
    pub lines: usize,
    pub walk_edges: usize,
}

impl fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} links, {} turns, {} centroids, {} transit lines, {} stops, {} walk transfers",
            self.nodes,
            self.links,
            self.turns,
            self.centroids,
            self.lines,
            self.stops,
            self.walk_edges
        )
    }
}
