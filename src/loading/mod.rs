//! This module is responsible for reading an EMME network package and
//! building the resolved multimodal network from it.

mod builder;
mod config;
pub mod emme;
pub mod package;
mod roads;
mod shapes;
mod transfers;
mod transit;
mod turns;
mod zones;

pub use builder::{ImportOutcome, import_network};
pub use config::ImportConfig;
pub use package::NetworkPackage;
