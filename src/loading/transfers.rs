//! Distance-bounded walking transfers between stops.
//!
//! Each stop's query is independent of every other stop, so candidates
//! are gathered in parallel; the results are committed serially into one
//! flat edge vector that each stop indexes by range.

use log::info;
use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::config::ImportConfig;
use crate::StopId;
use crate::model::Network;
use crate::model::transit::WalkEdge;

/// Stop position entry in the spatial index.
#[derive(Debug, Clone)]
pub struct StopLocation {
    pub stop: StopId,
    point: [f64; 2],
}

impl StopLocation {
    fn new(stop: StopId, point: geo::Point<f64>) -> Self {
        Self {
            stop,
            point: [point.x(), point.y()],
        }
    }
}

impl RTreeObject for StopLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Builds the R-tree over every stop's absolute position.
pub fn build_stop_index(network: &Network) -> RTree<StopLocation> {
    let entries = (0..network.stops.len())
        .map(|stop| StopLocation::new(stop, network.stop_position(stop)))
        .collect();
    RTree::bulk_load(entries)
}

/// Computes capped walking transfers for every stop and stores them on
/// the network.
pub fn build_walking_transfers(
    network: &mut Network,
    index: &RTree<StopLocation>,
    config: &ImportConfig,
) {
    info!(
        "calculating walking transfers between {} stops",
        network.stops.len()
    );
    let stop_transfers = calculate_stop_transfers(network, index, config);
    commit_transfers(network, stop_transfers);
    info!("calculated {} walking transfers", network.walk_edges.len());
}

/// Per-stop candidate search: everything within the radius, ranked by
/// walking time, capped at the configured count. Ties break by stop id
/// so the kept set is deterministic.
fn calculate_stop_transfers(
    network: &Network,
    index: &RTree<StopLocation>,
    config: &ImportConfig,
) -> Vec<Vec<WalkEdge>> {
    let speed_inv = 1.0 / config.walking_speed;
    let radius_sq = config.transfer_radius * config.transfer_radius;

    (0..network.stops.len())
        .into_par_iter()
        .map(|source| {
            let position = network.stop_position(source);
            let origin = [position.x(), position.y()];
            let mut candidates: Vec<WalkEdge> = index
                .locate_within_distance(origin, radius_sq)
                .filter(|entry| entry.stop != source)
                .map(|entry| WalkEdge {
                    from: source,
                    to: entry.stop,
                    time: entry.distance_2(&origin).sqrt() * speed_inv,
                })
                .collect();
            candidates.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.to.cmp(&b.to)));
            candidates.truncate(config.max_transfer_stops);
            candidates
        })
        .collect()
}

fn commit_transfers(network: &mut Network, stop_transfers: Vec<Vec<WalkEdge>>) {
    let mut all_edges = Vec::new();
    for (stop, transfers) in stop_transfers.into_iter().enumerate() {
        let start = all_edges.len();
        let count = transfers.len();
        all_edges.extend(transfers);
        let entry = &mut network.stops[stop];
        entry.transfers_start = start;
        entry.transfers_len = count;
    }
    network.walk_edges = all_edges;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::road::{Link, LinkClass};
    use crate::model::transit::BusStop;
    use fixedbitset::FixedBitSet;
    use geo::Point;

    /// One long straight link hosting stops at the given offsets.
    fn network_with_stops(offsets: &[f64]) -> Network {
        let mut network = Network::new();
        let a = network.add_node("1", Point::new(0.0, 0.0)).unwrap();
        let b = network.add_node("2", Point::new(10_000.0, 0.0)).unwrap();
        let link = network
            .add_link(a, b, Link {
                external_id: "link1_2".to_string(),
                class: LinkClass::Road,
                lanes: 1,
                lane_width: 2.0,
                speed: 50.0,
                capacity_per_lane: 800.0,
                user_cost: 0.0,
                allowed_modes: FixedBitSet::new(),
                allowed_vehicles: None,
                road_type: 0,
                geometry: vec![Point::new(0.0, 0.0), Point::new(10_000.0, 0.0)],
            })
            .unwrap();
        for (i, offset) in offsets.iter().enumerate() {
            network.get_or_create_stop(BusStop {
                external_id: format!("stop_{i}"),
                link,
                lane: 0,
                position: *offset,
                length: 10.0,
                transfers_start: 0,
                transfers_len: 0,
            });
        }
        network
    }

    #[test]
    fn transfers_are_capped_sorted_and_radius_bounded() {
        // stop 0 at origin, neighbors at growing distances, one out of range
        let mut network = network_with_stops(&[0.0, 50.0, 100.0, 150.0, 500.0]);
        let config = ImportConfig {
            max_transfer_stops: 2,
            ..ImportConfig::default()
        };
        let index = build_stop_index(&network);
        build_walking_transfers(&mut network, &index, &config);

        let transfers = network.walk_transfers(0);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].to, 1);
        assert_eq!(transfers[1].to, 2);
        assert!(transfers[0].time <= transfers[1].time);
        // 50m at 1.4 m/s
        assert!((transfers[0].time - 50.0 / 1.4).abs() < 1e-9);
        // the far stop appears in nobody's list
        assert!(
            network
                .walk_edges
                .iter()
                .all(|edge| edge.from != 4 || edge.to != 0)
        );
    }

    #[test]
    fn isolated_stop_gets_no_transfers() {
        let mut network = network_with_stops(&[0.0, 5_000.0]);
        let config = ImportConfig::default();
        let index = build_stop_index(&network);
        build_walking_transfers(&mut network, &index, &config);
        assert!(network.walk_transfers(0).is_empty());
        assert!(network.walk_transfers(1).is_empty());
        assert!(network.walk_edges.is_empty());
    }

    #[test]
    fn cap_may_admit_one_direction_only() {
        // stop 0 is crowded out at stop 2 but keeps its own edge to 2
        let mut network = network_with_stops(&[0.0, 90.0, 100.0, 110.0]);
        let config = ImportConfig {
            max_transfer_stops: 2,
            ..ImportConfig::default()
        };
        let index = build_stop_index(&network);
        build_walking_transfers(&mut network, &index, &config);

        let from_zero: Vec<StopId> = network.walk_transfers(0).iter().map(|e| e.to).collect();
        assert_eq!(from_zero, vec![1, 2]);
        let from_two: Vec<StopId> = network.walk_transfers(2).iter().map(|e| e.to).collect();
        // stop 2's nearest neighbors are 1 and 3; 0 is dropped by the cap
        assert_eq!(from_two, vec![1, 3]);
        assert!(!from_two.contains(&0));
    }
}
