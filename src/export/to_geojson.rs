use geojson::{Feature, FeatureCollection, Geometry, GeometryValue as GeoJsonValue, JsonObject};
use serde_json::json;

use crate::error::Error;
use crate::model::Network;

impl Network {
    /// Renders nodes, links and stops to a GeoJSON `FeatureCollection`.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();

        for id in self.graph.node_indices() {
            let node = self.node(id);
            features.push(point_feature(
                node.position,
                properties(&[
                    ("kind", json!("node")),
                    ("external_id", json!(node.external_id)),
                ]),
            ));
        }

        for id in self.graph.edge_indices() {
            let link = self.link(id);
            let coordinates = link
                .geometry
                .iter()
                .map(|p| vec![p.x(), p.y()])
                .collect::<Vec<_>>();
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoJsonValue::new_line_string(coordinates))),
                id: None,
                properties: Some(properties(&[
                    ("kind", json!("link")),
                    ("external_id", json!(link.external_id)),
                    ("lanes", json!(link.lanes)),
                    ("speed", json!(link.speed)),
                    ("capacity", json!(link.capacity())),
                ])),
                foreign_members: None,
            });
        }

        for (id, stop) in self.stops.iter().enumerate() {
            features.push(point_feature(
                self.stop_position(id),
                properties(&[
                    ("kind", json!("stop")),
                    ("external_id", json!(stop.external_id)),
                    ("walk_transfers", json!(stop.transfers_len)),
                ]),
            ));
        }

        FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn point_feature(position: geo::Point<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoJsonValue::new_point([
            position.x(),
            position.y(),
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn properties(pairs: &[(&str, serde_json::Value)]) -> JsonObject {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}
