//! CLI definition using clap

use clap::{Parser, Subcommand};
use dishfill_types::{EstimationMode, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dishfill")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Dishwasher fill estimation from object detections")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate how full the dishwasher is from a detections file
    Estimate {
        /// Path to detections JSON (detector response or bare array)
        file: PathBuf,

        /// Ask the language model for the overall percentage
        #[arg(long)]
        advisory: bool,

        /// Skip the loading suggestion
        #[arg(long)]
        no_suggestion: bool,

        /// Drop detections below this confidence (0.0-1.0)
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Fail instead of using the deterministic value when the model answer is unusable
        #[arg(long)]
        no_fallback: bool,
    },

    /// Show which compartment a detector label belongs to
    Classify {
        /// Detector class label (e.g., "l_plate", "tea_cup")
        label: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default estimation mode
        #[arg(long)]
        set_mode: Option<EstimationMode>,

        /// Set large compartment capacity
        #[arg(long)]
        set_capacity_large: Option<u32>,

        /// Set medium compartment capacity
        #[arg(long)]
        set_capacity_medium: Option<u32>,

        /// Set small compartment capacity
        #[arg(long)]
        set_capacity_small: Option<u32>,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set model call timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set minimum detection confidence (0.0-1.0)
        #[arg(long)]
        set_min_confidence: Option<f64>,

        /// Enable/disable loading suggestions
        #[arg(long)]
        set_suggestion: Option<bool>,

        /// Enable/disable deterministic fallback
        #[arg(long)]
        set_fallback: Option<bool>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
