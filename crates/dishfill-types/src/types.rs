//! Detection, compartment, and estimate types

use serde::{Deserialize, Serialize};

/// Physical dishwasher zone with its own slot capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    /// Large plates and bowls
    Large,
    /// Medium plates, bowls, cups and tea cups
    Medium,
    /// Small plates, bowls, cups and glasses
    Small,
}

impl Compartment {
    pub const ALL: [Compartment; 3] = [Compartment::Large, Compartment::Medium, Compartment::Small];

    pub fn label(&self) -> &'static str {
        match self {
            Compartment::Large => "large",
            Compartment::Medium => "medium",
            Compartment::Small => "small",
        }
    }

    /// Human readable description of what goes in the compartment
    pub fn contents(&self) -> &'static str {
        match self {
            Compartment::Large => "Large plate and large bowl",
            Compartment::Medium => "Medium plate, medium cup, medium bowl and a tea cup",
            Compartment::Small => "Small plate, small bowl, small cup and a glass",
        }
    }
}

impl std::fmt::Display for Compartment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per compartment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCompartment<T> {
    pub large: T,
    pub medium: T,
    pub small: T,
}

impl<T> PerCompartment<T> {
    pub fn new(large: T, medium: T, small: T) -> Self {
        Self {
            large,
            medium,
            small,
        }
    }

    pub fn get(&self, compartment: Compartment) -> &T {
        match compartment {
            Compartment::Large => &self.large,
            Compartment::Medium => &self.medium,
            Compartment::Small => &self.small,
        }
    }

    pub fn get_mut(&mut self, compartment: Compartment) -> &mut T {
        match compartment {
            Compartment::Large => &mut self.large,
            Compartment::Medium => &mut self.medium,
            Compartment::Small => &mut self.small,
        }
    }

    /// Build a new table by applying `f` to every compartment
    pub fn map<U>(&self, mut f: impl FnMut(Compartment, &T) -> U) -> PerCompartment<U> {
        PerCompartment {
            large: f(Compartment::Large, &self.large),
            medium: f(Compartment::Medium, &self.medium),
            small: f(Compartment::Small, &self.small),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compartment, &T)> {
        Compartment::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// One object-detector output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class label (e.g. "l_plate", "glass")
    #[serde(rename = "class")]
    pub label: String,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Check the record is well formed. Returns the reason when it is not.
    pub fn check(&self) -> Result<(), String> {
        if !self.confidence.is_finite() {
            return Err(format!("confidence is not a finite number ({})", self.confidence));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        Ok(())
    }
}

/// How the overall percentage of a [`FillEstimate`] was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimateSource {
    /// Computed from counts and capacities
    Deterministic,
    /// Supplied by the language model and validated
    Advisory { attempts: u8 },
    /// Advisory path was rejected; deterministic value used instead
    Fallback { reason: String },
}

impl EstimateSource {
    pub fn label(&self) -> &'static str {
        match self {
            EstimateSource::Deterministic => "deterministic",
            EstimateSource::Advisory { .. } => "advisory",
            EstimateSource::Fallback { .. } => "fallback",
        }
    }
}

/// Result of one estimation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillEstimate {
    /// Classified items per compartment
    pub counts: PerCompartment<u32>,

    /// Capacity minus count, saturating at zero
    pub remaining: PerCompartment<u32>,

    /// count / capacity * 100, not capped
    pub per_compartment: PerCompartment<f64>,

    /// Detections whose label matched no compartment
    pub unclassified: u32,

    /// Weighted overall percentage, two decimals, not capped
    pub overall: f64,

    /// Loading suggestion, absent when the model gave none
    #[serde(default)]
    pub suggestion: Option<String>,

    pub source: EstimateSource,
}

impl FillEstimate {
    /// User-facing percentage, clamped into [0, 100]
    pub fn fill_percentage(&self) -> f64 {
        self.overall.clamp(0.0, 100.0)
    }

    /// True when the overall value or any compartment is past capacity
    pub fn is_overfilled(&self) -> bool {
        self.overall > 100.0 || self.per_compartment.iter().any(|(_, pct)| *pct > 100.0)
    }

    pub fn level(&self) -> FillLevel {
        FillLevel::from_percentage(self.overall)
    }

    pub fn with_suggestion(self, suggestion: Option<String>) -> Self {
        Self { suggestion, ..self }
    }

    pub fn to_response(&self) -> EstimateResponse {
        EstimateResponse {
            fill_percentage: self.fill_percentage(),
            suggestion: self.suggestion.clone(),
        }
    }
}

/// Wire shape handed to HTTP/UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub fill_percentage: f64,
    pub suggestion: Option<String>,
}

/// Coarse fill classification for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillLevel {
    /// Below 25%
    Sparse,
    /// 25-60%
    Partial,
    /// 60-90%
    NearlyFull,
    /// 90-100%
    Full,
    /// Over 100%
    Overfilled,
}

impl FillLevel {
    pub fn from_percentage(pct: f64) -> Self {
        match pct {
            p if p < 25.0 => FillLevel::Sparse,
            p if p < 60.0 => FillLevel::Partial,
            p if p < 90.0 => FillLevel::NearlyFull,
            p if p <= 100.0 => FillLevel::Full,
            _ => FillLevel::Overfilled,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FillLevel::Sparse => "room for plenty more",
            FillLevel::Partial => "partly loaded",
            FillLevel::NearlyFull => "nearly full",
            FillLevel::Full => "ready to run",
            FillLevel::Overfilled => "overfilled",
        }
    }
}
