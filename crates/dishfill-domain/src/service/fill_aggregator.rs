//! Fill aggregation service
//!
//! Turns a list of detections into per-compartment fill ratios and one
//! weighted overall percentage.
//!
//! # Formula
//! ratio(c)  = count(c) / capacity(c) * 100        (not capped)
//! overall   = sum over c of weight(c) * ratio(c)  (rounded to 2 decimals)
//!
//! Rounding is half away from zero: 0.125 becomes 0.13.

use crate::model::EstimationTables;
use dishfill_types::{Compartment, Detection, Error, EstimateSource, FillEstimate, PerCompartment, Result};
use tracing::debug;

/// Counts produced by classifying one request's detections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedCounts {
    pub counts: PerCompartment<u32>,
    /// Labels that matched no compartment
    pub unclassified: u32,
    /// Detections dropped by the confidence gate
    pub below_threshold: u32,
}

impl ClassifiedCounts {
    pub fn total_classified(&self) -> u32 {
        self.counts.large + self.counts.medium + self.counts.small
    }
}

/// Deterministic aggregator bound to the process-wide tables
#[derive(Debug, Clone, Copy)]
pub struct FillAggregator<'a> {
    tables: &'a EstimationTables,
    min_confidence: Option<f64>,
}

impl<'a> FillAggregator<'a> {
    pub fn new(tables: &'a EstimationTables) -> Self {
        Self {
            tables,
            min_confidence: None,
        }
    }

    /// Drop detections below this confidence before classifying
    pub fn with_min_confidence(mut self, min_confidence: Option<f64>) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Validate and classify detections.
    ///
    /// A malformed record fails the whole request; it is never skipped.
    pub fn classify(&self, detections: &[Detection]) -> Result<ClassifiedCounts> {
        let mut classified = ClassifiedCounts::default();

        for (index, detection) in detections.iter().enumerate() {
            detection
                .check()
                .map_err(|reason| Error::InvalidDetection { index, reason })?;

            if let Some(min) = self.min_confidence {
                if detection.confidence < min {
                    classified.below_threshold += 1;
                    continue;
                }
            }

            match self.tables.classification.classify(&detection.label) {
                Some(compartment) => *classified.counts.get_mut(compartment) += 1,
                None => {
                    debug!(label = %detection.label, "unclassified label excluded");
                    classified.unclassified += 1;
                }
            }
        }

        Ok(classified)
    }

    /// Build the deterministic estimate from already classified counts
    pub fn estimate(&self, classified: &ClassifiedCounts) -> FillEstimate {
        let capacity = &self.tables.capacity;
        let per_compartment = classified
            .counts
            .map(|compartment, count| capacity.fill_ratio(compartment, *count));
        let overall = round_percentage(weighted_overall(&per_compartment, &self.tables.weights.as_table()));

        FillEstimate {
            counts: classified.counts,
            remaining: capacity.remaining(&classified.counts),
            per_compartment,
            unclassified: classified.unclassified,
            overall,
            suggestion: None,
            source: EstimateSource::Deterministic,
        }
    }

    /// Classify then estimate in one step
    pub fn aggregate(&self, detections: &[Detection]) -> Result<FillEstimate> {
        let classified = self.classify(detections)?;
        Ok(self.estimate(&classified))
    }
}

/// Weighted sum of the three ratios. Empty compartments contribute 0.
pub fn weighted_overall(ratios: &PerCompartment<f64>, weights: &PerCompartment<f64>) -> f64 {
    Compartment::ALL
        .iter()
        .map(|&c| ratios.get(c) * weights.get(c))
        .sum()
}

/// Round to two decimals, half away from zero
pub fn round_percentage(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
