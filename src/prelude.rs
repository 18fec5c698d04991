// Re-export of key components
pub use crate::error::Error;
pub use crate::loading::{ImportConfig, ImportOutcome, NetworkPackage, import_network};
pub use crate::model::{Network, NetworkSummary};
pub use crate::report::{Defect, ImportReport};

// Core handle types
pub use crate::{CentroidId, LineId, LinkId, ModeId, NodeId, StopId, VehicleId};
pub use crate::WalkingTime; // seconds

// Tuning constants
pub use crate::{
    DUMMY_LINK_LENGTH, LINE_FIX_ATTEMPTS, MAX_TRANSFER_STOPS, TRANSFER_RADIUS, WALKING_SPEED,
};
