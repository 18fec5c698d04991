//! Tokenization and record extraction.
//!
//! Every line is classified by its leading marker character: `c` comments,
//! `t` section headers, `a` data rows (`a*` flags a centroid in the node
//! section), `r` shape block headers. Data rows are whitespace-tokenized
//! with quote awareness so names containing spaces survive.

use geo::Point;
use log::warn;

use super::records::{
    FunctionRecord, LineRecord, LinkRecord, ModeRecord, NodeRecord, PathStep, ShapeRecord,
    TurnRecord, VehicleRecord,
};
use crate::error::Error;
use crate::report::{Defect, ImportReport};

/// Splits a record line into fields, honoring single and double quotes.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_field = false;
    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    in_field = true;
                }
                c if c.is_whitespace() => {
                    if in_field {
                        fields.push(std::mem::take(&mut current));
                        in_field = false;
                    }
                }
                c => {
                    current.push(c);
                    in_field = true;
                }
            },
        }
    }
    if in_field {
        fields.push(current);
    }
    fields
}

fn parse_f64(section: &'static str, line: &str, field: &str) -> Result<f64, Error> {
    field.parse().map_err(|_| Error::MalformedRecord {
        section,
        line: line.to_string(),
    })
}

enum BaseSection {
    Nodes,
    Links,
}

/// Reads the combined nodes/links file. Node rows keep their `a*`
/// centroid flag; links come back in file order.
///
/// # Errors
///
/// Returns an error for any data row below its section's minimum arity or
/// with unparseable numeric fields; the base network is a required
/// section and malformed rows in it are fatal.
pub fn parse_base_network(text: &str) -> Result<(Vec<NodeRecord>, Vec<LinkRecord>), Error> {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut current = BaseSection::Nodes;
    for line in text.lines() {
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('t') {
            current = match rest.split_whitespace().next() {
                Some("links") => BaseSection::Links,
                _ => BaseSection::Nodes,
            };
            continue;
        }
        if !line.starts_with('a') {
            continue;
        }
        match current {
            BaseSection::Nodes => nodes.push(parse_node_row(line)?),
            BaseSection::Links => links.push(parse_link_row(line)?),
        }
    }
    Ok((nodes, links))
}

fn parse_node_row(line: &str) -> Result<NodeRecord, Error> {
    let fields = split_fields(line);
    if fields.len() < 4 {
        return Err(Error::MalformedRecord {
            section: "nodes",
            line: line.to_string(),
        });
    }
    Ok(NodeRecord {
        id: fields[1].clone(),
        x: parse_f64("nodes", line, &fields[2])?,
        y: parse_f64("nodes", line, &fields[3])?,
        centroid: fields[0] == "a*",
    })
}

fn parse_link_row(line: &str) -> Result<LinkRecord, Error> {
    let fields = split_fields(line);
    if fields.len() < 11 {
        return Err(Error::MalformedRecord {
            section: "links",
            line: line.to_string(),
        });
    }
    Ok(LinkRecord {
        from: fields[1].clone(),
        to: fields[2].clone(),
        modes: fields[4].clone(),
        lanes: parse_f64("links", line, &fields[6])?,
        vdf: fields[7].clone(),
        user_cost: parse_f64("links", line, &fields[8])?,
        speed: parse_f64("links", line, &fields[9])?,
        capacity_per_lane: parse_f64("links", line, &fields[10])?,
    })
}

/// Reads mode declarations. Rows below minimum arity are skipped.
pub fn parse_modes(text: &str) -> Vec<ModeRecord> {
    let mut modes = Vec::new();
    for line in text.lines() {
        if !line.starts_with('a') {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() >= 3 {
            modes.push(ModeRecord {
                id: fields[1].clone(),
                name: fields[2].clone(),
            });
        }
    }
    modes
}

/// Reads volume-delay function names.
pub fn parse_functions(text: &str) -> Vec<FunctionRecord> {
    let mut functions = Vec::new();
    for line in text.lines() {
        if !line.starts_with('a') {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() >= 2 {
            functions.push(FunctionRecord {
                name: fields[1].clone(),
            });
        }
    }
    functions
}

/// Reads the turns file, keeping only rows flagged `-1` - the source
/// convention marking an explicit allowed turn.
pub fn parse_turns(text: &str) -> Vec<TurnRecord> {
    let mut turns = Vec::new();
    for line in text.lines() {
        if !line.starts_with('a') {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() >= 5 && fields[4] == "-1" {
            turns.push(TurnRecord {
                at: fields[1].clone(),
                from_node: fields[2].clone(),
                to_node: fields[3].clone(),
            });
        }
    }
    turns
}

/// Reads shape blocks: an `r from to` header followed by `a` point rows
/// carrying coordinates in their fifth and sixth fields. Blocks without
/// any usable point are dropped.
pub fn parse_shapes(text: &str) -> Vec<ShapeRecord> {
    let mut shapes: Vec<ShapeRecord> = Vec::new();
    for line in text.lines() {
        if line.starts_with('r') {
            let fields = split_fields(line);
            if fields.len() >= 3 {
                shapes.push(ShapeRecord {
                    from: fields[1].clone(),
                    to: fields[2].clone(),
                    points: Vec::new(),
                });
            }
        } else if line.starts_with('a') {
            let fields = split_fields(line);
            if fields.len() >= 6
                && let (Ok(x), Ok(y)) = (fields[4].parse(), fields[5].parse())
                && let Some(shape) = shapes.last_mut()
            {
                shape.points.push(Point::new(x, y));
            }
        }
    }
    shapes.retain(|s| !s.points.is_empty());
    shapes
}

/// Reads transit vehicle declarations. Malformed rows are skipped with a
/// warning; the section is optional and tolerated loosely.
pub fn parse_vehicles(text: &str) -> Vec<VehicleRecord> {
    let mut vehicles = Vec::new();
    for line in text.lines() {
        if !line.starts_with('a') {
            continue;
        }
        let fields = split_fields(line);
        if fields.len() < 12 {
            continue;
        }
        let seating = fields[5].parse::<f64>();
        let capacity = fields[6].parse::<f64>();
        let pcus = fields[11].parse::<f64>();
        match (seating, capacity, pcus) {
            (Ok(seating_capacity), Ok(total_capacity), Ok(pcus)) => {
                vehicles.push(VehicleRecord {
                    id: fields[1].clone(),
                    name: fields[2].clone(),
                    mode: fields[3].clone(),
                    seating_capacity,
                    total_capacity,
                    pcus: pcus as u32,
                });
            }
            _ => warn!("skipping malformed vehicle record: '{line}'"),
        }
    }
    vehicles
}

/// Reads transit line headers and their `dwt=` continuation rows.
///
/// A comment, section header or new `a` row closes the block being read.
/// Continuation rows missing the dwell field, or carrying a `path=` token,
/// are skipped and recorded; header rows below minimum arity abandon the
/// block until the next header.
pub fn parse_transit_lines(text: &str, report: &mut ImportReport) -> Vec<LineRecord> {
    let mut records: Vec<LineRecord> = Vec::new();
    let mut current: Option<LineRecord> = None;
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('c') || line.starts_with('t') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            continue;
        }
        if line.starts_with('a') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            let fields = split_fields(line);
            if fields.len() < 7 {
                report.record(Defect::SkippedTransitRow {
                    line: String::new(),
                    row: line.trim().to_string(),
                });
                continue;
            }
            current = Some(LineRecord {
                id: fields[1].clone(),
                vehicle: fields[3].clone(),
                name: fields[6].clone(),
                path: Vec::new(),
            });
            continue;
        }
        let Some(record) = current.as_mut() else {
            continue;
        };
        let fields = split_fields(line);
        match parse_path_step(&fields) {
            Some(step) => record.path.push(step),
            None => {
                if !fields.is_empty() && fields[0] != "path=no" {
                    report.record(Defect::SkippedTransitRow {
                        line: record.id.clone(),
                        row: line.trim().to_string(),
                    });
                }
            }
        }
    }
    if let Some(done) = current.take() {
        records.push(done);
    }
    records
}

fn parse_path_step(fields: &[String]) -> Option<PathStep> {
    if fields.len() < 2 {
        return None;
    }
    let node = &fields[0];
    if node.contains('=') {
        return None;
    }
    let dwell = fields
        .iter()
        .skip(1)
        .find_map(|f| f.strip_prefix("dwt="))
        .and_then(|v| v.parse::<f64>().ok())?;
    Some(PathStep {
        node: node.clone(),
        dwell,
    })
}
