//! Staged import orchestration.
//!
//! Stages run strictly in order because every stage after the first
//! resolves references by external id against entities committed by its
//! predecessors.

use hashbrown::HashSet;
use log::{info, warn};

use super::config::ImportConfig;
use super::emme::parser;
use super::package::{self, NetworkPackage};
use super::{roads, shapes, transfers, transit, turns, zones};
use crate::error::Error;
use crate::model::Network;
use crate::report::ImportReport;

/// Result of one import run: the resolved network plus the accumulated
/// recoverable defects.
#[derive(Debug)]
pub struct ImportOutcome {
    pub network: Network,
    pub report: ImportReport,
}

/// Runs the full synthesis pipeline over a network package.
///
/// # Errors
///
/// Returns an error on a missing base network section, malformed records
/// in a required section, duplicate node ids, or unresolvable endpoint
/// references. Everything else is downgraded to a defect in the returned
/// report.
pub fn import_network(
    package: &NetworkPackage,
    config: &ImportConfig,
) -> Result<ImportOutcome, Error> {
    let mut network = Network::new();
    let mut report = ImportReport::default();

    info!("define modes");
    match package.section(package::MODES) {
        Some(text) => roads::add_modes(&mut network, &parser::parse_modes(text)),
        None => warn!("no modes section, links will not restrict modes"),
    }

    info!("define road types");
    let functions = package
        .section(package::FUNCTIONS)
        .map(parser::parse_functions)
        .unwrap_or_default();
    if functions.is_empty() {
        warn!("no volume-delay functions declared");
    }
    roads::add_road_types(&mut network, &functions);

    info!("read base network data file");
    let base = package
        .section(package::BASE_NETWORK)
        .ok_or(Error::MissingSection(package::BASE_NETWORK))?;
    let (node_records, link_records) = parser::parse_base_network(base)?;
    let (centroid_records, road_nodes): (Vec<_>, Vec<_>) =
        node_records.into_iter().partition(|r| r.centroid);

    info!("add {} nodes", road_nodes.len());
    roads::add_nodes(&mut network, &road_nodes)?;

    info!("add {} links", link_records.len());
    let centroid_ids: HashSet<String> = centroid_records.iter().map(|r| r.id.clone()).collect();
    let connector_records = roads::add_links(
        &mut network,
        &link_records,
        &centroid_ids,
        config,
        &mut report,
    )?;

    if let Some(text) = package.section(package::SHAPES) {
        shapes::apply_shapes(&mut network, &parser::parse_shapes(text), &mut report);
    }

    info!("build turns");
    let turn_records = package
        .section(package::TURNS)
        .map(parser::parse_turns)
        .unwrap_or_default();
    turns::build_turns(&mut network, &turn_records, &mut report);

    info!("add centroids");
    zones::create_centroid_config(&mut network, "baseCentroidConfig", &centroid_records);
    zones::build_connectors(&mut network, &connector_records)?;

    if let Some(text) = package.section(package::TRANSIT_VEHICLES) {
        transit::import_vehicles(&mut network, &parser::parse_vehicles(text));
    }
    if let Some(text) = package.section(package::TRANSIT_LINES) {
        let line_records = parser::parse_transit_lines(text, &mut report);
        transit::import_lines(&mut network, &line_records, config, &mut report)?;
    }

    let stop_index = transfers::build_stop_index(&network);
    transfers::build_walking_transfers(&mut network, &stop_index, config);
    zones::connect_transit_stops(&mut network, &stop_index);

    info!("finished import: {}", network.summary());
    Ok(ImportOutcome { network, report })
}
