//! Per-run accumulation of recoverable import defects.
//!
//! A large network with a handful of inconsistencies must still produce a
//! usable graph, so everything short of a malformed required section is
//! recorded here instead of aborting the run.

use std::fmt;

use serde::Serialize;

/// A recoverable inconsistency encountered while importing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Defect {
    /// An explicit turn record named a node or links absent at that node.
    UnresolvedTurn {
        at: String,
        from_node: String,
        to_node: String,
    },
    /// A consecutive node pair in a transit line path has no connecting link.
    UnresolvedPathStep {
        line: String,
        from_node: String,
        to_node: String,
    },
    /// A transit line failed continuity validation after the repair bound.
    DiscontinuousLine { line: String, name: String },
    /// A transit line referenced an unknown vehicle type and was skipped.
    UnknownLineVehicle { line: String, vehicle: String },
    /// A malformed transit path row was skipped.
    SkippedTransitRow { line: String, row: String },
    /// A link referenced a volume-delay function with no declared road type.
    UnknownRoadType { link: String, road_type: String },
    /// A shape record referenced a link that does not exist.
    UnknownShapeLink { from_node: String, to_node: String },
    /// A stop could not be placed because its host link was unresolved.
    UnplacedStop { line: String, node: String },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::UnresolvedTurn {
                at,
                from_node,
                to_node,
            } => write!(f, "could not create turn {at} {from_node} {to_node}"),
            Defect::UnresolvedPathStep {
                line,
                from_node,
                to_node,
            } => write!(
                f,
                "transit line {line}: no link from {from_node} to {to_node}"
            ),
            Defect::DiscontinuousLine { line, name } => {
                write!(f, "issue importing transit line {line} {name}")
            }
            Defect::UnknownLineVehicle { line, vehicle } => {
                write!(f, "transit line {line}: unknown vehicle type {vehicle}")
            }
            Defect::SkippedTransitRow { line, row } => {
                write!(f, "transit line {line}: skipped row '{row}'")
            }
            Defect::UnknownRoadType { link, road_type } => {
                write!(f, "{link}: unknown road type {road_type}")
            }
            Defect::UnknownShapeLink { from_node, to_node } => {
                write!(f, "shape record for missing link {from_node} {to_node}")
            }
            Defect::UnplacedStop { line, node } => {
                write!(f, "transit line {line}: no host link for stop at {node}")
            }
        }
    }
}

/// Everything recoverable that went wrong during one import run.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub defects: Vec<Defect>,
}

impl ImportReport {
    /// Records a defect and logs it.
    pub fn record(&mut self, defect: Defect) {
        log::warn!("{defect}");
        self.defects.push(defect);
    }

    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn defect_count(&self) -> usize {
        self.defects.len()
    }
}
