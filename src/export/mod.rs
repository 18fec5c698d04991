//! Exporting the resolved network for inspection.

mod to_geojson;
