//! Zone centroids, the centroid configuration and connector edges.

use geo::Point;
use log::info;
use rstar::RTree;

use super::emme::records::{LinkRecord, NodeRecord};
use super::transfers::StopLocation;
use crate::error::Error;
use crate::model::Network;
use crate::model::zones::{CentroidConfig, Connector, ConnectorDirection, ConnectorEnd};
use crate::{CentroidId, StopId};

/// Creates every centroid and assembles them into one named
/// configuration. Centroid creation is idempotent by external id, so a
/// zone declared in several source sections yields a single entity.
pub fn create_centroid_config(network: &mut Network, name: &str, records: &[NodeRecord]) {
    info!("create centroid configuration '{name}'");
    let mut members = Vec::new();
    for record in records {
        let id = network.get_or_create_centroid(
            &format!("centroid_{}", record.id),
            Point::new(record.x, record.y),
        );
        if !members.contains(&id) {
            members.push(id);
        }
    }
    network.centroid_config = Some(CentroidConfig {
        external_id: name.to_string(),
        centroids: members,
    });
}

/// Creates the connector edge for each base-network link record that was
/// diverted from the road graph.
///
/// # Errors
///
/// A connector record whose endpoints resolve to neither a known node nor
/// a known centroid is fatal.
pub fn build_connectors(network: &mut Network, records: &[LinkRecord]) -> Result<(), Error> {
    for record in records {
        connect_centroid(network, &record.from, &record.to)?;
    }
    Ok(())
}

/// Whichever endpoint resolves to a road node is the node end of the
/// connection, regardless of column order; the record's order still
/// decides the direction of flow.
fn connect_centroid(network: &mut Network, from: &str, to: &str) -> Result<(), Error> {
    let (centroid, connector) = if let Some(node) = network.find_node(from) {
        let centroid = network
            .find_centroid(&format!("centroid_{to}"))
            .ok_or_else(|| Error::UnknownCentroid(to.to_string()))?;
        (
            centroid,
            Connector {
                end: ConnectorEnd::Node(node),
                direction: ConnectorDirection::ToCentroid,
            },
        )
    } else {
        let node = network
            .find_node(to)
            .ok_or_else(|| Error::UnknownNode(to.to_string()))?;
        let centroid = network
            .find_centroid(&format!("centroid_{from}"))
            .ok_or_else(|| Error::UnknownCentroid(from.to_string()))?;
        (
            centroid,
            Connector {
                end: ConnectorEnd::Node(node),
                direction: ConnectorDirection::FromCentroid,
            },
        )
    };
    network.centroids[centroid].connectors.push(connector);
    Ok(())
}

/// Connects each centroid bidirectionally to the stops hosted on links
/// incident to its connected nodes. A centroid with no such stop gets the
/// nearest stop on the whole network instead.
pub fn connect_transit_stops(network: &mut Network, stop_index: &RTree<StopLocation>) {
    let members = match &network.centroid_config {
        Some(config) => config.centroids.clone(),
        None => return,
    };
    for centroid in members {
        let mut stops = nearby_stops(network, centroid);
        if stops.is_empty() {
            let position = network.centroids[centroid].position;
            if let Some(nearest) = stop_index.nearest_neighbor(&[position.x(), position.y()]) {
                stops.push(nearest.stop);
            }
        }
        let connectors = &mut network.centroids[centroid].connectors;
        for stop in stops {
            connectors.push(Connector {
                end: ConnectorEnd::Stop(stop),
                direction: ConnectorDirection::ToCentroid,
            });
            connectors.push(Connector {
                end: ConnectorEnd::Stop(stop),
                direction: ConnectorDirection::FromCentroid,
            });
        }
    }
}

/// Stops on any link to or from a node on one of the centroid's
/// connectors.
fn nearby_stops(network: &Network, centroid: CentroidId) -> Vec<StopId> {
    let mut stops = Vec::new();
    for connector in &network.centroids[centroid].connectors {
        let ConnectorEnd::Node(node) = connector.end else {
            continue;
        };
        for link in network
            .incoming_links(node)
            .into_iter()
            .chain(network.outgoing_links(node))
        {
            for &stop in network.stops_on_link(link) {
                if !stops.contains(&stop) {
                    stops.push(stop);
                }
            }
        }
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid_record(id: &str, x: f64, y: f64) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            x,
            y,
            centroid: true,
        }
    }

    #[test]
    fn repeated_centroid_declarations_collapse() {
        let mut network = Network::new();
        let records = [
            centroid_record("9", 0.0, 0.0),
            centroid_record("9", 0.0, 0.0),
            centroid_record("8", 5.0, 5.0),
        ];
        create_centroid_config(&mut network, "baseCentroidConfig", &records);
        assert_eq!(network.centroids.len(), 2);
        let config = network.centroid_config.as_ref().unwrap();
        assert_eq!(config.centroids.len(), 2);
    }

    #[test]
    fn connector_direction_follows_column_order() {
        let mut network = Network::new();
        let node = network.add_node("1", Point::new(0.0, 0.0)).unwrap();
        create_centroid_config(&mut network, "baseCentroidConfig", &[centroid_record(
            "9", 10.0, 10.0,
        )]);
        connect_centroid(&mut network, "1", "9").unwrap();
        connect_centroid(&mut network, "9", "1").unwrap();
        let centroid = network.find_centroid("centroid_9").unwrap();
        let connectors = &network.centroids[centroid].connectors;
        assert_eq!(connectors.len(), 2);
        assert_eq!(connectors[0], Connector {
            end: ConnectorEnd::Node(node),
            direction: ConnectorDirection::ToCentroid,
        });
        assert_eq!(connectors[1], Connector {
            end: ConnectorEnd::Node(node),
            direction: ConnectorDirection::FromCentroid,
        });
    }

    #[test]
    fn unresolvable_connector_is_fatal() {
        let mut network = Network::new();
        network.add_node("1", Point::new(0.0, 0.0)).unwrap();
        let err = connect_centroid(&mut network, "1", "9").unwrap_err();
        assert!(matches!(err, Error::UnknownCentroid(id) if id == "9"));
    }
}
