//! Transit vehicles and line threading.
//!
//! Each line's node path is resolved to a concrete link path, given a
//! synthetic boarding link at its origin, stop objects at its dwell
//! points, and then validated for continuity. A missing turn between
//! adjacent path links is repaired by synthesizing the turn, bounded by
//! the configured attempt count; any other break downgrades the line to a
//! reported defect.

use geo::Point;
use log::info;

use super::config::ImportConfig;
use super::emme::records::{LineRecord, VehicleRecord};
use super::roads::DUMMY_ROAD_TYPE;
use crate::error::Error;
use crate::model::Network;
use crate::model::road::{Link, LinkClass};
use crate::model::transit::{BusStop, TransitLine, Vehicle};
use crate::report::{Defect, ImportReport};
use crate::{LinkId, NodeId, StopId, VehicleId};

/// Registers transit vehicle types from the vehicles section.
pub fn import_vehicles(network: &mut Network, records: &[VehicleRecord]) {
    info!("import {} transit vehicle types", records.len());
    for record in records {
        let mode = network.find_mode(&record.mode);
        network.add_vehicle(Vehicle {
            external_id: format!("transitVeh_{}", record.id),
            name: record.name.clone(),
            mode,
            seating_capacity: record.seating_capacity,
            total_capacity: record.total_capacity,
            pcus: record.pcus,
        });
    }
}

/// Threads every transit line through the link graph.
pub fn import_lines(
    network: &mut Network,
    records: &[LineRecord],
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<(), Error> {
    info!("number of transit lines to import: {}", records.len());
    for record in records {
        import_line(network, record, config, report)?;
    }
    Ok(())
}

fn import_line(
    network: &mut Network,
    record: &LineRecord,
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<(), Error> {
    let Some(vehicle) = network.find_vehicle(&format!("transitVeh_{}", record.vehicle)) else {
        report.record(Defect::UnknownLineVehicle {
            line: record.id.clone(),
            vehicle: record.vehicle.clone(),
        });
        return Ok(());
    };
    let links = resolve_link_path(network, record, report);

    // Without a resolved first link the line has no boarding point.
    let Some(first_link) = links.first().copied().flatten() else {
        report.record(Defect::DiscontinuousLine {
            line: record.id.clone(),
            name: record.name.clone(),
        });
        return Ok(());
    };

    let (boarding_link, boarding_stop) =
        ensure_boarding_link(network, vehicle, first_link, config)?;

    let mut path: Vec<Option<LinkId>> = Vec::with_capacity(links.len() + 1);
    path.push(Some(boarding_link));
    path.extend(links.iter().copied());

    // One stop slot per traversed node: the boarding point, the first real
    // node (never a stop, boarding is handled by the synthetic link), then
    // one per remaining path node.
    let mut stops: Vec<Option<StopId>> = Vec::with_capacity(path.len() + 1);
    stops.push(Some(boarding_stop));
    stops.push(None);
    for step in 1..record.path.len() {
        let terminal = step == record.path.len() - 1;
        if record.path[step].dwell != 0.0 || terminal {
            let Some(host) = links[step - 1] else {
                report.record(Defect::UnplacedStop {
                    line: record.id.clone(),
                    node: record.path[step].node.clone(),
                });
                stops.push(None);
                continue;
            };
            let stop = line_stop(network, &record.path[step].node, host, &stops, config);
            stops.push(Some(stop));
        } else {
            stops.push(None);
        }
    }

    let continuous = validate_and_repair(
        network,
        &record.id,
        &record.name,
        &path,
        config.line_fix_attempts,
        report,
    );

    network.add_line(TransitLine {
        external_id: record.id.clone(),
        name: record.name.clone(),
        vehicle,
        path,
        stops,
        continuous,
    });
    Ok(())
}

/// Resolves each consecutive node pair to the link between them. An
/// unresolvable interior pair yields a `None` entry but does not abort
/// the line.
fn resolve_link_path(
    network: &Network,
    record: &LineRecord,
    report: &mut ImportReport,
) -> Vec<Option<LinkId>> {
    let mut links = Vec::new();
    for pair in record.path.windows(2) {
        let link = match (
            network.find_node(&pair[0].node),
            network.find_node(&pair[1].node),
        ) {
            (Some(from), Some(to)) => find_connecting_link(network, from, to),
            _ => None,
        };
        if link.is_none() {
            report.record(Defect::UnresolvedPathStep {
                line: record.id.clone(),
                from_node: pair[0].node.clone(),
                to_node: pair[1].node.clone(),
            });
        }
        links.push(link);
    }
    links
}

fn find_connecting_link(network: &Network, from: NodeId, to: NodeId) -> Option<LinkId> {
    network
        .outgoing_links(from)
        .into_iter()
        .find(|&link| network.link_endpoints(link).1 == to)
}

/// Finds or creates the boarding link anchored at `first_link`'s origin.
/// A boarding link is shared between lines boarding at the same point:
/// on reuse only the vehicle whitelist is extended and the turn onto the
/// line's first link verified.
fn ensure_boarding_link(
    network: &mut Network,
    vehicle: VehicleId,
    first_link: LinkId,
    config: &ImportConfig,
) -> Result<(LinkId, StopId), Error> {
    let (anchor, _) = network.link_endpoints(first_link);
    let anchor_ext = network.node(anchor).external_id.clone();
    let external_id = format!("dummylink_at_{anchor_ext}");

    if let Some(existing) = network.find_link(&external_id) {
        if let Some(allowed) = &mut network.link_mut(existing).allowed_vehicles
            && !allowed.contains(&vehicle)
        {
            allowed.push(vehicle);
        }
        network.add_turn(anchor, existing, first_link);
        let stop = match network.stops_on_link(existing).first().copied() {
            Some(stop) => stop,
            None => boarding_stop(network, existing, &anchor_ext, config),
        };
        return Ok((existing, stop));
    }

    let anchor_position = network.node(anchor).position;
    let start = Point::new(
        anchor_position.x() - config.dummy_link_length,
        anchor_position.y(),
    );
    let origin = network.add_synthetic_node(&format!("dummynode_at_{anchor_ext}"), start)?;
    let road_type = network
        .find_road_type(DUMMY_ROAD_TYPE)
        .ok_or_else(|| Error::InvalidData("dummy link road type not registered".to_string()))?;
    let link = network.add_link(origin, anchor, Link {
        external_id,
        class: LinkClass::Boarding,
        lanes: 1,
        lane_width: config.lane_width,
        speed: 0.0,
        capacity_per_lane: 0.0,
        user_cost: 0.0,
        allowed_modes: fixedbitset::FixedBitSet::with_capacity(network.modes.len()),
        allowed_vehicles: Some(vec![vehicle]),
        road_type,
        geometry: vec![start, anchor_position],
    })?;
    network.add_turn(anchor, link, first_link);
    let stop = boarding_stop(network, link, &anchor_ext, config);
    Ok((link, stop))
}

/// Stop at the midpoint of a boarding link.
fn boarding_stop(
    network: &mut Network,
    link: LinkId,
    anchor_ext: &str,
    config: &ImportConfig,
) -> StopId {
    network.get_or_create_stop(BusStop {
        external_id: format!("stop_{anchor_ext}_dummylink_at_{anchor_ext}"),
        link,
        lane: 0,
        position: config.dummy_link_length / 2.0,
        length: config.dummy_link_length / 2.0,
        transfers_start: 0,
        transfers_len: 0,
    })
}

/// Creates (or reuses) the stop near the downstream end of `host`. A stop
/// already used earlier in this line's stop list gets a fresh instance
/// with the next repeat number so the list stays injective.
fn line_stop(
    network: &mut Network,
    node_ext: &str,
    host: LinkId,
    used: &[Option<StopId>],
    config: &ImportConfig,
) -> StopId {
    let link = network.link(host);
    let link_ext = link.external_id.clone();
    let lanes = link.lanes.max(1);
    let position = (link.length() - config.stop_setback).max(0.0);
    let mut repeat = 0;
    loop {
        let stop = network.get_or_create_stop(BusStop {
            external_id: format!("stop_{node_ext}_{link_ext}_{repeat}"),
            link: host,
            lane: lanes - 1,
            position,
            length: config.stop_length,
            transfers_start: 0,
            transfers_len: 0,
        });
        if !used.contains(&Some(stop)) {
            return stop;
        }
        repeat += 1;
    }
}

enum LineBreak {
    /// A path entry could not be resolved to a link.
    Unresolved,
    /// Adjacent links do not share a node.
    Mismatch,
    /// Adjacent links share a node but no turn connects them.
    MissingTurn {
        at: NodeId,
        from: LinkId,
        to: LinkId,
    },
}

fn check_line(network: &Network, path: &[Option<LinkId>]) -> Result<(), LineBreak> {
    for pair in path.windows(2) {
        let (Some(from), Some(to)) = (pair[0], pair[1]) else {
            return Err(LineBreak::Unresolved);
        };
        let (_, from_end) = network.link_endpoints(from);
        let (to_start, _) = network.link_endpoints(to);
        if from_end != to_start {
            return Err(LineBreak::Mismatch);
        }
        if !network.turn_exists(from_end, from, to) {
            return Err(LineBreak::MissingTurn {
                at: from_end,
                from,
                to,
            });
        }
    }
    Ok(())
}

/// Bounded repair loop over the assembled path. Returns whether the line
/// ended up continuous.
fn validate_and_repair(
    network: &mut Network,
    line_id: &str,
    line_name: &str,
    path: &[Option<LinkId>],
    attempts: u32,
    report: &mut ImportReport,
) -> bool {
    let mut remaining = attempts;
    loop {
        match check_line(network, path) {
            Ok(()) => return true,
            Err(LineBreak::MissingTurn { at, from, to }) if remaining > 0 => {
                remaining -= 1;
                info!("fix a discontinuity in transit line {line_id} {line_name}");
                network.add_turn(at, from, to);
            }
            Err(_) => {
                report.record(Defect::DiscontinuousLine {
                    line: line_id.to_string(),
                    name: line_name.to_string(),
                });
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::emme::records::{LinkRecord, ModeRecord, PathStep};
    use crate::loading::{roads, turns};

    fn vehicle_record(id: &str, mode: &str) -> VehicleRecord {
        VehicleRecord {
            id: id.to_string(),
            name: "bus12".to_string(),
            mode: mode.to_string(),
            seating_capacity: 40.0,
            total_capacity: 60.0,
            pcus: 2,
        }
    }

    fn line_record(id: &str, vehicle: &str, steps: &[(&str, f64)]) -> LineRecord {
        LineRecord {
            id: id.to_string(),
            vehicle: vehicle.to_string(),
            name: format!("line {id}"),
            path: steps
                .iter()
                .map(|(node, dwell)| PathStep {
                    node: (*node).to_string(),
                    dwell: *dwell,
                })
                .collect(),
        }
    }

    /// Chain network over the given nodes with one link per listed pair.
    fn chain_network(nodes: &[&str], links: &[(&str, &str)]) -> Network {
        let mut network = Network::new();
        roads::add_modes(
            &mut network,
            &[
                ModeRecord {
                    id: "c".to_string(),
                    name: "car".to_string(),
                },
                ModeRecord {
                    id: "b".to_string(),
                    name: "bus".to_string(),
                },
            ],
        );
        roads::add_road_types(&mut network, &[]);
        let config = ImportConfig::default();
        let mut report = ImportReport::default();
        for (i, id) in nodes.iter().enumerate() {
            network
                .add_node(id, Point::new(i as f64 * 100.0, 0.0))
                .unwrap();
        }
        for (from, to) in links {
            let record = LinkRecord {
                from: (*from).to_string(),
                to: (*to).to_string(),
                modes: "cb".to_string(),
                lanes: 2.0,
                vdf: "0".to_string(),
                user_cost: 0.0,
                speed: 50.0,
                capacity_per_lane: 800.0,
            };
            roads::add_link(&mut network, &record, &config, &mut report).unwrap();
        }
        import_vehicles(&mut network, &[vehicle_record("12", "b")]);
        network
    }

    #[test]
    fn line_threads_with_boarding_link_and_aligned_stops() {
        let mut network = chain_network(&["1", "2", "3", "4"], &[
            ("1", "2"),
            ("2", "3"),
            ("3", "4"),
        ]);
        let mut report = ImportReport::default();
        turns::build_turns(&mut network, &[], &mut report);
        let config = ImportConfig::default();
        let record = line_record("T1", "12", &[
            ("1", 0.0),
            ("2", 5.0),
            ("3", 0.0),
            ("4", 5.0),
        ]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();

        let line = &network.lines[0];
        assert_eq!(line.path.len(), 4);
        assert_eq!(line.stops.len(), 5);
        assert!(line.continuous);

        // boarding link first, restricted to the line's vehicle
        let boarding = line.path[0].unwrap();
        assert_eq!(network.link(boarding).class, LinkClass::Boarding);
        let vehicle = network.find_vehicle("transitVeh_12").unwrap();
        assert_eq!(
            network.link(boarding).allowed_vehicles,
            Some(vec![vehicle])
        );

        // the boarding stop sits on the boarding link
        let boarding_stop = line.stops[0].unwrap();
        assert_eq!(network.stops[boarding_stop].link, boarding);

        // exactly two interior stops: dwell at node 2, terminal at node 4
        let interior: Vec<&Option<StopId>> =
            line.stops.iter().skip(1).filter(|s| s.is_some()).collect();
        assert_eq!(interior.len(), 2);
        assert!(line.stops[2].is_some());
        assert!(line.stops[4].is_some());
        assert!(line.stops[1].is_none());
        assert!(line.stops[3].is_none());

        // continuity across every adjacent pair
        for pair in line.path.windows(2) {
            let (_, from_end) = network.link_endpoints(pair[0].unwrap());
            let (to_start, _) = network.link_endpoints(pair[1].unwrap());
            assert_eq!(from_end, to_start);
        }
        assert!(report.is_clean());
    }

    #[test]
    fn boarding_link_is_shared_and_extended() {
        let mut network = chain_network(&["1", "2", "3"], &[("1", "2"), ("2", "3")]);
        import_vehicles(&mut network, &[vehicle_record("13", "b")]);
        let mut report = ImportReport::default();
        turns::build_turns(&mut network, &[], &mut report);
        let config = ImportConfig::default();
        let records = [
            line_record("T1", "12", &[("1", 0.0), ("2", 5.0)]),
            line_record("T2", "13", &[("1", 0.0), ("2", 0.0), ("3", 5.0)]),
        ];
        import_lines(&mut network, &records, &config, &mut report).unwrap();

        let first = network.lines[0].path[0].unwrap();
        let second = network.lines[1].path[0].unwrap();
        assert_eq!(first, second);
        let twelve = network.find_vehicle("transitVeh_12").unwrap();
        let thirteen = network.find_vehicle("transitVeh_13").unwrap();
        assert_eq!(
            network.link(first).allowed_vehicles,
            Some(vec![twelve, thirteen])
        );
        // both lines share the boarding stop
        assert_eq!(network.lines[0].stops[0], network.lines[1].stops[0]);
    }

    #[test]
    fn revisited_stop_gets_distinct_instance() {
        let mut network = chain_network(&["1", "2"], &[("1", "2"), ("2", "1")]);
        let mut report = ImportReport::default();
        turns::build_turns(&mut network, &[], &mut report);
        let config = ImportConfig::default();
        let record = line_record("T1", "12", &[
            ("1", 0.0),
            ("2", 5.0),
            ("1", 5.0),
            ("2", 5.0),
        ]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();

        let line = &network.lines[0];
        let first = line.stops[2].unwrap();
        let second = line.stops[4].unwrap();
        assert_ne!(first, second);
        assert_eq!(network.stops[first].link, network.stops[second].link);
        assert_eq!(network.stops[first].external_id, "stop_2_link1_2_0");
        assert_eq!(network.stops[second].external_id, "stop_2_link1_2_1");
        // the stop list stays injective over its non-null entries
        let mut seen: Vec<StopId> = line.stops.iter().filter_map(|s| *s).collect();
        let before = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), before);
    }

    #[test]
    fn missing_turn_is_repaired_within_bound() {
        let mut network = chain_network(&["1", "2", "3", "4"], &[
            ("1", "2"),
            ("2", "3"),
            ("3", "4"),
        ]);
        let mut report = ImportReport::default();
        // claim node 2 with an unresolvable record so no turn exists there
        let claim = crate::loading::emme::records::TurnRecord {
            at: "2".to_string(),
            from_node: "9".to_string(),
            to_node: "9".to_string(),
        };
        turns::build_turns(&mut network, &[claim], &mut report);
        let ab = network.find_link("link1_2").unwrap();
        let bc = network.find_link("link2_3").unwrap();
        let node_b = network.find_node("2").unwrap();
        assert!(!network.turn_exists(node_b, ab, bc));

        let config = ImportConfig::default();
        let record = line_record("T1", "12", &[("1", 0.0), ("2", 0.0), ("3", 0.0), (
            "4", 5.0,
        )]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();

        assert!(network.lines[0].continuous);
        assert!(network.turn_exists(node_b, ab, bc));
        // the only defect is the unresolvable turn record from setup
        assert_eq!(report.defect_count(), 1);
    }

    #[test]
    fn repair_bound_exhaustion_reports_the_line() {
        let mut network = chain_network(&["1", "2", "3", "4"], &[
            ("1", "2"),
            ("2", "3"),
            ("3", "4"),
        ]);
        let mut report = ImportReport::default();
        let claim = crate::loading::emme::records::TurnRecord {
            at: "2".to_string(),
            from_node: "9".to_string(),
            to_node: "9".to_string(),
        };
        turns::build_turns(&mut network, &[claim], &mut report);

        let config = ImportConfig {
            line_fix_attempts: 0,
            ..ImportConfig::default()
        };
        let record = line_record("T1", "12", &[("1", 0.0), ("2", 0.0), ("3", 5.0)]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();

        assert!(!network.lines[0].continuous);
        assert!(report.defects.iter().any(|d| matches!(
            d,
            Defect::DiscontinuousLine { line, .. } if line == "T1"
        )));
    }

    #[test]
    fn unresolved_interior_step_keeps_line_with_null_entry() {
        let mut network = chain_network(&["1", "2", "3"], &[("1", "2")]);
        let mut report = ImportReport::default();
        turns::build_turns(&mut network, &[], &mut report);
        let config = ImportConfig::default();
        let record = line_record("T1", "12", &[("1", 0.0), ("2", 0.0), ("3", 5.0)]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();

        let line = &network.lines[0];
        assert_eq!(line.path.len(), 3);
        assert!(line.path[1].is_some());
        assert!(line.path[2].is_none());
        assert!(!line.continuous);
        assert!(report.defects.iter().any(|d| matches!(
            d,
            Defect::UnresolvedPathStep { to_node, .. } if to_node == "3"
        )));
        // the terminal stop had no host link
        assert!(line.stops[3].is_none());
        assert!(report.defects.iter().any(|d| matches!(
            d,
            Defect::UnplacedStop { node, .. } if node == "3"
        )));
    }

    #[test]
    fn unknown_vehicle_skips_the_line() {
        let mut network = chain_network(&["1", "2"], &[("1", "2")]);
        let mut report = ImportReport::default();
        turns::build_turns(&mut network, &[], &mut report);
        let config = ImportConfig::default();
        let record = line_record("T1", "99", &[("1", 0.0), ("2", 5.0)]);
        import_lines(&mut network, &[record], &config, &mut report).unwrap();
        assert!(network.lines.is_empty());
        assert!(matches!(
            report.defects[0],
            Defect::UnknownLineVehicle { ref vehicle, .. } if vehicle == "99"
        ));
    }
}
