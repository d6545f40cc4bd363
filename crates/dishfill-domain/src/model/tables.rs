//! Immutable configuration bundle shared by every estimation request

use super::{CapacityTable, ClassificationTable, CompartmentWeights};

/// Capacity, classification, and weights, validated once at startup
#[derive(Debug, Clone, Default)]
pub struct EstimationTables {
    pub capacity: CapacityTable,
    pub classification: ClassificationTable,
    pub weights: CompartmentWeights,
}

impl EstimationTables {
    pub fn new(
        capacity: CapacityTable,
        classification: ClassificationTable,
        weights: CompartmentWeights,
    ) -> Self {
        Self {
            capacity,
            classification,
            weights,
        }
    }
}
