//! Command handlers

use crate::cli::{Cli, Commands};
use crate::output::{output_classification, output_estimate};
use dishfill_advisory::OpenAiBackend;
use dishfill_app::app::{EstimationOptions, EstimationService};
use dishfill_app::config::Config;
use dishfill_app::input::load_detections;
use dishfill_types::{ConfigError, EstimationMode, OutputFormat, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;
    apply_overrides(&mut config, &cli);

    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Estimate { file, .. } => cmd_estimate(&config, file.clone(), output_format).await,

        Commands::Classify { label } => cmd_classify(&config, label, output_format),

        Commands::Config {
            show,
            set_mode,
            set_capacity_large,
            set_capacity_medium,
            set_capacity_small,
            set_model,
            set_timeout,
            set_min_confidence,
            set_suggestion,
            set_fallback,
            set_output,
            reset,
        } => cmd_config(ConfigChanges {
            show: *show,
            mode: *set_mode,
            capacity_large: *set_capacity_large,
            capacity_medium: *set_capacity_medium,
            capacity_small: *set_capacity_small,
            model: set_model.clone(),
            timeout_secs: *set_timeout,
            min_confidence: *set_min_confidence,
            suggestion: *set_suggestion,
            fallback: *set_fallback,
            output: *set_output,
            reset: *reset,
        }),
    }
}

/// Override config values from CLI args for this invocation only
pub fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref model) = cli.model {
        config.advisory.model = model.clone();
    }

    if let Commands::Estimate {
        advisory,
        no_suggestion,
        min_confidence,
        no_fallback,
        ..
    } = &cli.command
    {
        if *advisory {
            config.mode = EstimationMode::Advisory;
        }
        if *no_suggestion {
            config.suggestion_enabled = false;
        }
        if min_confidence.is_some() {
            config.min_confidence = *min_confidence;
        }
        if *no_fallback {
            config.fallback_enabled = false;
        }
    }
}

async fn cmd_estimate(config: &Config, file: PathBuf, output_format: OutputFormat) -> Result<()> {
    // Tables are built once and shared read-only by the request
    let tables = config.build_tables()?;
    let detections = load_detections(&file)?;
    debug!(file = %file.display(), detections = detections.len(), "detections loaded");

    let options = EstimationOptions::from_config(config);
    let backend = build_backend(config, &options)?;

    let mut service = EstimationService::new(&tables, options);
    if let Some(ref backend) = backend {
        service = service.with_backend(backend);
    }

    let spinner = if backend.is_some() && output_format == OutputFormat::Table {
        Some(start_spinner())
    } else {
        None
    };

    let result = service.estimate(&detections).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let estimate = result?;
    output_estimate(output_format, &estimate, &tables)
}

/// Construct the model backend when this invocation needs one.
///
/// A missing key is fatal on the advisory path. When only a suggestion
/// was wanted, it is skipped with a warning.
pub fn build_backend(config: &Config, options: &EstimationOptions) -> Result<Option<OpenAiBackend>> {
    let advisory = options.mode == EstimationMode::Advisory;
    if !advisory && !options.suggestion {
        return Ok(None);
    }

    let api_key = match config.advisory.api_key() {
        Ok(key) => key,
        Err(err) if advisory => return Err(err.into()),
        Err(err) => {
            warn!(error = %err, "loading suggestion skipped");
            return Ok(None);
        }
    };

    let backend = OpenAiBackend::new(api_key, config.advisory.timeout())
        .map_err(|e| ConfigError::InvalidSetting(e.to_string()))?
        .with_endpoint(config.advisory.endpoint.clone())
        .with_model(config.advisory.model.clone())
        .with_temperature(config.advisory.temperature);

    debug!(model = backend.model(), "advisory backend ready");
    Ok(Some(backend))
}

fn start_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message("Asking the model...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_classify(config: &Config, label: &str, output_format: OutputFormat) -> Result<()> {
    let tables = config.build_tables()?;
    let compartment = tables.classification.classify(label);
    output_classification(output_format, label, compartment, &tables)
}

/// Requested changes from `dishfill config`
struct ConfigChanges {
    show: bool,
    mode: Option<EstimationMode>,
    capacity_large: Option<u32>,
    capacity_medium: Option<u32>,
    capacity_small: Option<u32>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    min_confidence: Option<f64>,
    suggestion: Option<bool>,
    fallback: Option<bool>,
    output: Option<OutputFormat>,
    reset: bool,
}

fn cmd_config(changes: ConfigChanges) -> Result<()> {
    if changes.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(mode) = changes.mode {
        config.mode = mode;
        modified = true;
    }

    if let Some(large) = changes.capacity_large {
        config.capacity.large = large;
        modified = true;
    }

    if let Some(medium) = changes.capacity_medium {
        config.capacity.medium = medium;
        modified = true;
    }

    if let Some(small) = changes.capacity_small {
        config.capacity.small = small;
        modified = true;
    }

    if let Some(model) = changes.model {
        config.advisory.model = model;
        modified = true;
    }

    if let Some(timeout_secs) = changes.timeout_secs {
        config.advisory.timeout_secs = timeout_secs;
        modified = true;
    }

    if let Some(min_confidence) = changes.min_confidence {
        config.min_confidence = Some(min_confidence);
        modified = true;
    }

    if let Some(enabled) = changes.suggestion {
        config.suggestion_enabled = enabled;
        modified = true;
    }

    if let Some(enabled) = changes.fallback {
        config.fallback_enabled = enabled;
        modified = true;
    }

    if let Some(output_format) = changes.output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        // Refuse to persist a config that could not start
        config.build_tables()?;
        config.save()?;
        println!("Configuration updated");
    }

    if changes.show || !modified {
        println!("{}", config);
    }

    Ok(())
}
