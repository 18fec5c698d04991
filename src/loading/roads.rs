//! Road-graph construction: modes, road types, nodes and links.

use fixedbitset::FixedBitSet;
use geo::Point;
use hashbrown::HashSet;

use super::config::ImportConfig;
use super::emme::records::{FunctionRecord, LinkRecord, ModeRecord, NodeRecord};
use crate::LinkId;
use crate::error::Error;
use crate::model::Network;
use crate::model::road::{Link, LinkClass, Mode, RoadType};
use crate::model::transit::Vehicle;
use crate::report::{Defect, ImportReport};

/// External id of the road type assigned to synthetic boarding links.
pub const DUMMY_ROAD_TYPE: &str = "dummyLinkRoadType";
/// Fallback road type for links whose VDF code has no declared function.
pub const FALLBACK_ROAD_TYPE: &str = "fd0";

/// Registers every declared mode together with one base vehicle per mode.
pub fn add_modes(network: &mut Network, records: &[ModeRecord]) {
    for record in records {
        let mode = network.add_mode(Mode {
            external_id: record.id.clone(),
            name: record.name.clone(),
        });
        network.add_vehicle(Vehicle {
            external_id: record.id.clone(),
            name: record.name.clone(),
            mode: Some(mode),
            seating_capacity: 0.0,
            total_capacity: 0.0,
            pcus: 1,
        });
    }
}

/// Registers road types: the two synthetic types first, then one per
/// declared volume-delay function.
pub fn add_road_types(network: &mut Network, records: &[FunctionRecord]) {
    network.add_road_type(RoadType {
        external_id: DUMMY_ROAD_TYPE.to_string(),
        name: DUMMY_ROAD_TYPE.to_string(),
        hidden: true,
    });
    network.add_road_type(RoadType {
        external_id: FALLBACK_ROAD_TYPE.to_string(),
        name: FALLBACK_ROAD_TYPE.to_string(),
        hidden: false,
    });
    for record in records {
        network.add_road_type(RoadType {
            external_id: record.name.clone(),
            name: record.name.clone(),
            hidden: false,
        });
    }
}

/// Creates road nodes. Duplicate external ids are fatal.
pub fn add_nodes(network: &mut Network, records: &[NodeRecord]) -> Result<(), Error> {
    for record in records {
        network.add_node(&record.id, Point::new(record.x, record.y))?;
    }
    Ok(())
}

/// Splits base-network link records into road links and centroid
/// connectors, creating the road links and returning the connector
/// records for the zone stage.
pub fn add_links(
    network: &mut Network,
    records: &[LinkRecord],
    centroid_ids: &HashSet<String>,
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<Vec<LinkRecord>, Error> {
    let mut connectors = Vec::new();
    for record in records {
        if centroid_ids.contains(&record.from) || centroid_ids.contains(&record.to) {
            connectors.push(record.clone());
        } else {
            add_link(network, record, config, report)?;
        }
    }
    Ok(connectors)
}

/// Creates one road link, resolving endpoints by external id.
pub fn add_link(
    network: &mut Network,
    record: &LinkRecord,
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<LinkId, Error> {
    let origin = network
        .find_node(&record.from)
        .ok_or_else(|| Error::UnknownNode(record.from.clone()))?;
    let destination = network
        .find_node(&record.to)
        .ok_or_else(|| Error::UnknownNode(record.to.clone()))?;
    let external_id = format!("link{}_{}", record.from, record.to);
    // Zero-lane records occur in source data and must still produce a
    // traversable link.
    let lanes = (record.lanes.floor() as i64).max(1) as usize;
    let road_type_id = format!("fd{}", record.vdf);
    let road_type = match network.find_road_type(&road_type_id) {
        Some(road_type) => road_type,
        None => {
            report.record(Defect::UnknownRoadType {
                link: external_id.clone(),
                road_type: road_type_id,
            });
            network
                .find_road_type(FALLBACK_ROAD_TYPE)
                .ok_or_else(|| Error::InvalidData("fallback road type not registered".to_string()))?
        }
    };
    let allowed_modes = allowed_mode_set(network, &record.modes);
    let geometry = vec![
        network.node(origin).position,
        network.node(destination).position,
    ];
    network.add_link(
        origin,
        destination,
        Link {
            external_id,
            class: LinkClass::Road,
            lanes,
            lane_width: config.lane_width,
            speed: record.speed,
            capacity_per_lane: record.capacity_per_lane,
            user_cost: record.user_cost,
            allowed_modes,
            allowed_vehicles: None,
            road_type,
            geometry,
        },
    )
}

/// Modes allowed on a link: every registered mode whose letter appears in
/// the record's mode string. The banned set is the difference from the
/// full registry.
fn allowed_mode_set(network: &Network, modes: &str) -> FixedBitSet {
    let mut set = FixedBitSet::with_capacity(network.modes.len());
    for (idx, mode) in network.modes.iter().enumerate() {
        if modes.contains(mode.external_id.as_str()) {
            set.insert(idx);
        }
    }
    set
}
