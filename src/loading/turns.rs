//! Turn construction over the committed road graph.
//!
//! Two policies, selected per node: the permissive cross product of
//! incoming and outgoing links, or the explicit list from the turns file.
//! A node named by any explicit record is excluded from the permissive
//! pass even when none of its records resolve.

use hashbrown::HashSet;
use itertools::iproduct;
use log::info;

use super::emme::records::TurnRecord;
use crate::NodeId;
use crate::model::Network;
use crate::report::{Defect, ImportReport};

/// Builds turns for the whole network.
pub fn build_turns(network: &mut Network, records: &[TurnRecord], report: &mut ImportReport) {
    if records.is_empty() {
        info!("no explicit turn records, building all possible turns");
    }
    let explicit = apply_explicit_turns(network, records, report);
    let fallback: Vec<NodeId> = network
        .graph
        .node_indices()
        .filter(|n| !explicit.contains(n) && !network.node(*n).synthetic)
        .collect();
    for node in fallback {
        infer_all_turns(network, node);
    }
}

/// Explicit policy: construct only the listed (from, to) pairs. A pair
/// whose links cannot be found at the node is recorded and skipped, never
/// fatal. Returns the nodes claimed by explicit records.
pub fn apply_explicit_turns(
    network: &mut Network,
    records: &[TurnRecord],
    report: &mut ImportReport,
) -> HashSet<NodeId> {
    let mut claimed = HashSet::new();
    for record in records {
        let Some(at) = network.find_node(&record.at) else {
            report.record(Defect::UnresolvedTurn {
                at: record.at.clone(),
                from_node: record.from_node.clone(),
                to_node: record.to_node.clone(),
            });
            continue;
        };
        claimed.insert(at);
        let from_link = network.find_link(&format!("link{}_{}", record.from_node, record.at));
        let to_link = network.find_link(&format!("link{}_{}", record.at, record.to_node));
        match (from_link, to_link) {
            (Some(from), Some(to)) => {
                network.add_turn(at, from, to);
            }
            _ => report.record(Defect::UnresolvedTurn {
                at: record.at.clone(),
                from_node: record.from_node.clone(),
                to_node: record.to_node.clone(),
            }),
        }
    }
    // Deterministic enumeration order for downstream consumers.
    for &node in &claimed {
        network.order_turnings(node);
    }
    claimed
}

/// Permissive default policy: every link terminating at the node may turn
/// onto every link departing it.
pub fn infer_all_turns(network: &mut Network, node: NodeId) {
    let incoming = network.incoming_links(node);
    let outgoing = network.outgoing_links(node);
    for (&entering, &exiting) in iproduct!(&incoming, &outgoing) {
        network.add_turn(node, entering, exiting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::config::ImportConfig;
    use crate::loading::emme::records::LinkRecord;
    use crate::loading::roads;
    use geo::Point;

    /// Cross intersection: four arms in, four arms out through node 0.
    fn cross_network() -> Network {
        let mut network = Network::new();
        roads::add_road_types(&mut network, &[]);
        let config = ImportConfig::default();
        let mut report = ImportReport::default();
        network.add_node("0", Point::new(0.0, 0.0)).unwrap();
        for (id, x, y) in [
            ("1", 100.0, 0.0),
            ("2", 0.0, 100.0),
            ("3", -100.0, 0.0),
            ("4", 0.0, -100.0),
        ] {
            network.add_node(id, Point::new(x, y)).unwrap();
            for (from, to) in [(id, "0"), ("0", id)] {
                let record = LinkRecord {
                    from: from.to_string(),
                    to: to.to_string(),
                    modes: "c".to_string(),
                    lanes: 1.0,
                    vdf: "0".to_string(),
                    user_cost: 0.0,
                    speed: 50.0,
                    capacity_per_lane: 800.0,
                };
                roads::add_link(&mut network, &record, &config, &mut report).unwrap();
            }
        }
        network
    }

    #[test]
    fn permissive_policy_builds_full_cross_product() {
        let mut network = cross_network();
        let mut report = ImportReport::default();
        build_turns(&mut network, &[], &mut report);
        let center = network.find_node("0").unwrap();
        // 4 incoming x 4 outgoing
        assert_eq!(network.turns_at(center).len(), 16);
        // end nodes each see one incoming and one outgoing arm
        let end = network.find_node("1").unwrap();
        assert_eq!(network.turns_at(end).len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn explicit_records_suppress_inference_at_their_node() {
        let mut network = cross_network();
        let mut report = ImportReport::default();
        let records = [
            TurnRecord {
                at: "0".to_string(),
                from_node: "1".to_string(),
                to_node: "2".to_string(),
            },
            TurnRecord {
                at: "0".to_string(),
                from_node: "3".to_string(),
                to_node: "4".to_string(),
            },
        ];
        build_turns(&mut network, &records, &mut report);
        let center = network.find_node("0").unwrap();
        assert_eq!(network.turns_at(center).len(), 2);
        // other nodes still fall back to the permissive policy
        let end = network.find_node("1").unwrap();
        assert_eq!(network.turns_at(end).len(), 1);
    }

    #[test]
    fn unresolvable_pairs_are_recorded_not_fatal() {
        let mut network = cross_network();
        let mut report = ImportReport::default();
        let records = [
            TurnRecord {
                at: "0".to_string(),
                from_node: "1".to_string(),
                to_node: "2".to_string(),
            },
            // node 9 has no link into 0
            TurnRecord {
                at: "0".to_string(),
                from_node: "9".to_string(),
                to_node: "2".to_string(),
            },
        ];
        build_turns(&mut network, &records, &mut report);
        let center = network.find_node("0").unwrap();
        assert_eq!(network.turns_at(center).len(), 1);
        assert_eq!(report.defect_count(), 1);
        assert!(matches!(
            report.defects[0],
            Defect::UnresolvedTurn { ref from_node, .. } if from_node == "9"
        ));
    }

    #[test]
    fn explicit_turns_are_ordered_by_destination_link() {
        let mut network = cross_network();
        let mut report = ImportReport::default();
        let records: Vec<TurnRecord> = ["4", "2", "1", "3"]
            .iter()
            .map(|to| TurnRecord {
                at: "0".to_string(),
                from_node: "1".to_string(),
                to_node: (*to).to_string(),
            })
            .collect();
        build_turns(&mut network, &records, &mut report);
        let center = network.find_node("0").unwrap();
        let destinations: Vec<&str> = network
            .turns_at(center)
            .iter()
            .map(|t| network.link(t.to).external_id.as_str())
            .collect();
        let mut sorted = destinations.clone();
        sorted.sort_unstable();
        assert_eq!(destinations, sorted);
    }
}
