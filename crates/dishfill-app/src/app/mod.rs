//! Application layer - use cases over the domain and advisory crates

pub mod estimation_service;

pub use estimation_service::{EstimationOptions, EstimationService, MAX_ADVISORY_ATTEMPTS};
