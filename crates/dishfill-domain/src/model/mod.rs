//! Domain model types

pub mod capacity;
pub mod classification;
pub mod tables;

pub use capacity::{CapacityTable, CompartmentWeights};
pub use classification::ClassificationTable;
pub use tables::EstimationTables;
