//! Curvature insertion from the shapes file.

use log::info;

use super::emme::records::ShapeRecord;
use crate::model::Network;
use crate::report::{Defect, ImportReport};

/// Inserts intermediate geometry points into already-committed links.
/// Link identity and endpoints are never touched; arc length is a pure
/// function of the resulting point sequence.
pub fn apply_shapes(network: &mut Network, records: &[ShapeRecord], report: &mut ImportReport) {
    info!("add curvature to {} links", records.len());
    for record in records {
        let Some(link) = network.find_link(&format!("link{}_{}", record.from, record.to)) else {
            report.record(Defect::UnknownShapeLink {
                from_node: record.from.clone(),
                to_node: record.to.clone(),
            });
            continue;
        };
        let geometry = &mut network.link_mut(link).geometry;
        // insert after the origin point, preserving file order
        let mut position = 1;
        for &point in &record.points {
            geometry.insert(position, point);
            position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::road::{Link, LinkClass};
    use fixedbitset::FixedBitSet;
    use geo::Point;

    #[test]
    fn curvature_preserves_endpoints_and_order() {
        let mut network = Network::new();
        let a = network.add_node("1", Point::new(0.0, 0.0)).unwrap();
        let b = network.add_node("2", Point::new(30.0, 0.0)).unwrap();
        let id = network
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
                geometry: vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0)],
            })
            .unwrap();
        let straight = network.link(id).length();

        let mut report = ImportReport::default();
        let record = ShapeRecord {
            from: "1".to_string(),
            to: "2".to_string(),
            points: vec![Point::new(10.0, 5.0), Point::new(20.0, 5.0)],
        };
        apply_shapes(&mut network, &[record], &mut report);

        let link = network.link(id);
        assert_eq!(link.geometry.len(), 4);
        assert_eq!(link.geometry[0], Point::new(0.0, 0.0));
        assert_eq!(link.geometry[1], Point::new(10.0, 5.0));
        assert_eq!(link.geometry[2], Point::new(20.0, 5.0));
        assert_eq!(link.geometry[3], Point::new(30.0, 0.0));
        assert!(link.length() > straight);
        assert!(report.is_clean());
    }

    #[test]
    fn shape_for_missing_link_is_recorded() {
        let mut network = Network::new();
        let mut report = ImportReport::default();
        let record = ShapeRecord {
            from: "7".to_string(),
            to: "8".to_string(),
            points: vec![Point::new(1.0, 1.0)],
        };
        apply_shapes(&mut network, &[record], &mut report);
        assert_eq!(report.defect_count(), 1);
    }
}
