//! Detector label to compartment mapping

use dishfill_types::{Compartment, ConfigError, PerCompartment};
use std::collections::HashMap;

/// Default detector labels per compartment
pub const DEFAULT_LARGE_LABELS: &[&str] = &["l_plate", "l_bowl"];
pub const DEFAULT_MEDIUM_LABELS: &[&str] = &["m_plate", "m_bowl", "m_cup", "tea_cup"];
pub const DEFAULT_SMALL_LABELS: &[&str] = &["s_plate", "s_bowl", "s_cup", "glass"];

/// Maps detector class labels to compartments.
///
/// Matching is exact and case-sensitive: "L_plate" is not "l_plate".
/// A label belongs to at most one compartment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationTable {
    labels: HashMap<String, Compartment>,
}

impl ClassificationTable {
    /// Build from three label sets, rejecting a label listed under two compartments
    pub fn new<S: AsRef<str>>(sets: &PerCompartment<Vec<S>>) -> Result<Self, ConfigError> {
        let mut labels = HashMap::new();

        for (compartment, set) in sets.iter() {
            for label in set {
                let label = label.as_ref();
                match labels.get(label) {
                    Some(&first) if first != compartment => {
                        return Err(ConfigError::DuplicateLabel {
                            label: label.to_string(),
                            first,
                            second: compartment,
                        });
                    }
                    Some(_) => {}
                    None => {
                        labels.insert(label.to_string(), compartment);
                    }
                }
            }
        }

        Ok(Self { labels })
    }

    /// Total over any input; unknown labels are `None`
    pub fn classify(&self, label: &str) -> Option<Compartment> {
        self.labels.get(label).copied()
    }

    /// Labels of one compartment, sorted
    pub fn labels_of(&self, compartment: Compartment) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .labels
            .iter()
            .filter(|(_, c)| **c == compartment)
            .map(|(label, _)| label.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        let mut labels = HashMap::new();
        let sets = [
            (Compartment::Large, DEFAULT_LARGE_LABELS),
            (Compartment::Medium, DEFAULT_MEDIUM_LABELS),
            (Compartment::Small, DEFAULT_SMALL_LABELS),
        ];
        for (compartment, set) in sets {
            for label in set {
                labels.insert((*label).to_string(), compartment);
            }
        }
        Self { labels }
    }
}
