use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("missing required section '{0}' in network package")]
    MissingSection(&'static str),
    #[error("malformed {section} record: '{line}'")]
    MalformedRecord {
        section: &'static str,
        line: String,
    },
    #[error("duplicate external id '{0}'")]
    DuplicateExternalId(String),
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("unknown centroid '{0}'")]
    UnknownCentroid(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
