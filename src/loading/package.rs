//! The network package: named text sections feeding one import run.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;

use crate::error::Error;

/// Base road network: nodes, centroids and links.
pub const BASE_NETWORK: &str = "base.211";
/// Travel mode declarations.
pub const MODES: &str = "modes.201";
/// Transit vehicle type declarations.
pub const TRANSIT_VEHICLES: &str = "vehicles.202";
/// Transit line itineraries.
pub const TRANSIT_LINES: &str = "transit.221";
/// Explicit turn restrictions.
pub const TURNS: &str = "turns.231";
/// Link curvature points.
pub const SHAPES: &str = "shapes.251";
/// Volume-delay function declarations.
pub const FUNCTIONS: &str = "functions.411";

const SECTIONS: [&str; 7] = [
    BASE_NETWORK,
    MODES,
    TRANSIT_VEHICLES,
    TRANSIT_LINES,
    TURNS,
    SHAPES,
    FUNCTIONS,
];

/// Named text sections of an EMME export.
///
/// The on-disk form is a directory holding the section files; tests and
/// embedders can assemble a package in memory instead.
#[derive(Debug, Clone, Default)]
pub struct NetworkPackage {
    sections: HashMap<String, String>,
}

impl NetworkPackage {
    /// Loads every known section file present under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a present section file cannot be read.
    pub fn from_dir(dir: &Path) -> Result<Self, Error> {
        let mut sections = HashMap::new();
        for name in SECTIONS {
            let path = dir.join(name);
            if path.is_file() {
                sections.insert(name.to_string(), fs::read_to_string(&path)?);
            }
        }
        Ok(Self { sections })
    }

    /// Assembles a package from in-memory section texts.
    pub fn from_sections<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sections: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }
}
