//! Application services for dishfill
//!
//! Configuration, detection input, and the estimation orchestrator shared by
//! the CLI and any embedding server.

pub mod app;
pub mod config;
pub mod input;

pub use app::{EstimationOptions, EstimationService};
pub use config::{AdvisorySettings, Config};
pub use input::{load_detections, parse_detections};
