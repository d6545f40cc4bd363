//! Per-compartment slot capacities and overall weighting

use dishfill_types::{Compartment, ConfigError, PerCompartment};

/// Default slot counts per compartment
pub const DEFAULT_CAPACITY: PerCompartment<u32> = PerCompartment {
    large: 14,
    medium: 16,
    small: 20,
};

/// Default contribution of each compartment to the overall percentage.
/// Large items dominate the signal.
pub const DEFAULT_WEIGHTS: PerCompartment<f64> = PerCompartment {
    large: 0.5,
    medium: 0.3,
    small: 0.2,
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Maximum slot count for each compartment. Every value is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityTable {
    slots: PerCompartment<u32>,
}

impl CapacityTable {
    pub fn new(slots: PerCompartment<u32>) -> Result<Self, ConfigError> {
        for (compartment, slots) in slots.iter() {
            if *slots == 0 {
                return Err(ConfigError::ZeroCapacity(compartment));
            }
        }
        Ok(Self { slots })
    }

    pub fn capacity_of(&self, compartment: Compartment) -> u32 {
        *self.slots.get(compartment)
    }

    /// Percentage of the compartment's slots used. Not capped at 100.
    ///
    /// Slots are non-zero by construction, so the division is always defined.
    pub fn fill_ratio(&self, compartment: Compartment, count: u32) -> f64 {
        (f64::from(count) / f64::from(self.capacity_of(compartment))) * 100.0
    }

    /// Free slots left per compartment, never below zero
    pub fn remaining(&self, counts: &PerCompartment<u32>) -> PerCompartment<u32> {
        self.slots
            .map(|compartment, cap| cap.saturating_sub(*counts.get(compartment)))
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            slots: DEFAULT_CAPACITY,
        }
    }
}

/// Fixed weight triple. Non-negative, finite, sums to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentWeights {
    weights: PerCompartment<f64>,
}

impl CompartmentWeights {
    pub fn new(weights: PerCompartment<f64>) -> Result<Self, ConfigError> {
        for (compartment, w) in weights.iter() {
            if !w.is_finite() || *w < 0.0 {
                return Err(ConfigError::InvalidWeights(format!(
                    "{} weight must be a non-negative number, got {}",
                    compartment, w
                )));
            }
        }

        let sum = weights.large + weights.medium + weights.small;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1, got {}",
                sum
            )));
        }

        Ok(Self { weights })
    }

    pub fn as_table(&self) -> PerCompartment<f64> {
        self.weights
    }
}

impl Default for CompartmentWeights {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
        }
    }
}
