//! Domain layer: compartment classification, capacity model, fill aggregation
//!
//! Everything here is synchronous and pure. The tables are built once at
//! startup and shared by reference across requests.

pub mod model;
pub mod service;

pub use model::{CapacityTable, ClassificationTable, CompartmentWeights, EstimationTables};
pub use service::{ClassifiedCounts, FillAggregator};
