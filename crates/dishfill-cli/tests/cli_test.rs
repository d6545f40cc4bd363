//! CLI wiring tests: argument overrides, backend construction, JSON output

use clap::Parser;
use dishfill_app::app::EstimationOptions;
use dishfill_app::config::{AdvisorySettings, Config};
use dishfill_cli::cli::Cli;
use dishfill_cli::commands::{apply_overrides, build_backend};
use dishfill_cli::output::estimate_json;
use dishfill_domain::{EstimationTables, FillAggregator};
use dishfill_types::{ConfigError, Detection, Error, EstimationMode};

fn config_with_key_env(name: &str) -> Config {
    Config {
        advisory: AdvisorySettings {
            api_key_env: name.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

// ==========================================
// Overrides
// ==========================================

#[test]
fn test_estimate_flags_override_config() {
    let cli = Cli::try_parse_from([
        "dishfill",
        "estimate",
        "load.json",
        "--advisory",
        "--no-suggestion",
        "--min-confidence",
        "0.4",
        "--no-fallback",
        "--model",
        "gpt-4o-mini",
    ])
    .unwrap();

    let mut config = Config::default();
    apply_overrides(&mut config, &cli);

    assert_eq!(config.mode, EstimationMode::Advisory);
    assert!(!config.suggestion_enabled);
    assert_eq!(config.min_confidence, Some(0.4));
    assert!(!config.fallback_enabled);
    assert_eq!(config.advisory.model, "gpt-4o-mini");
}

#[test]
fn test_absent_flags_keep_config_values() {
    let cli = Cli::try_parse_from(["dishfill", "estimate", "load.json"]).unwrap();

    let mut config = Config::default();
    config.mode = EstimationMode::Advisory;
    config.min_confidence = Some(0.2);
    let before = config.clone();

    apply_overrides(&mut config, &cli);
    assert_eq!(config, before);
}

#[test]
fn test_classify_ignores_estimate_overrides() {
    let cli = Cli::try_parse_from(["dishfill", "classify", "tea_cup", "--model", "gpt-4.1"]).unwrap();

    let mut config = Config::default();
    apply_overrides(&mut config, &cli);

    assert_eq!(config.mode, EstimationMode::Deterministic);
    assert_eq!(config.advisory.model, "gpt-4.1");
}

// ==========================================
// Backend construction
// ==========================================

#[test]
fn test_missing_key_is_fatal_in_advisory_mode() {
    let config = config_with_key_env("DISHFILL_CLI_TEST_KEY_UNSET_ADVISORY");
    let options = EstimationOptions::from_config(&config).with_mode(EstimationMode::Advisory);

    match build_backend(&config, &options) {
        Err(Error::Config(ConfigError::MissingApiKey(name))) => {
            assert_eq!(name, "DISHFILL_CLI_TEST_KEY_UNSET_ADVISORY")
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("advisory mode without a key must fail"),
    }
}

#[test]
fn test_missing_key_skips_suggestion_only() {
    let config = config_with_key_env("DISHFILL_CLI_TEST_KEY_UNSET_SUGGESTION");
    let options = EstimationOptions::from_config(&config).with_suggestion(true);
    assert_eq!(options.mode, EstimationMode::Deterministic);

    assert!(matches!(build_backend(&config, &options), Ok(None)));
}

#[test]
fn test_no_backend_when_nothing_needs_one() {
    let config = config_with_key_env("DISHFILL_CLI_TEST_KEY_UNSET_NONE");
    let options = EstimationOptions::from_config(&config).with_suggestion(false);

    assert!(matches!(build_backend(&config, &options), Ok(None)));
}

#[test]
fn test_backend_built_when_key_present() {
    std::env::set_var("DISHFILL_CLI_TEST_KEY_PRESENT", "sk-test");
    let mut config = config_with_key_env("DISHFILL_CLI_TEST_KEY_PRESENT");
    config.advisory.model = "gpt-4o-mini".to_string();
    let options = EstimationOptions::from_config(&config).with_mode(EstimationMode::Advisory);

    let backend = build_backend(&config, &options).unwrap();
    assert_eq!(backend.map(|b| b.model().to_string()).as_deref(), Some("gpt-4o-mini"));
}

// ==========================================
// JSON output
// ==========================================

#[test]
fn test_json_output_carries_clamped_fill_percentage() {
    let tables = EstimationTables::default();
    let mut items: Vec<Detection> = (0..28).map(|_| Detection::new("l_plate", 0.9)).collect();
    items.extend((0..32).map(|_| Detection::new("m_plate", 0.9)));

    let estimate = FillAggregator::new(&tables)
        .aggregate(&items)
        .unwrap()
        .with_suggestion(Some("Run it now.".to_string()));
    assert!(estimate.overall > 100.0);

    let json: serde_json::Value = serde_json::from_str(&estimate_json(&estimate).unwrap()).unwrap();
    assert_eq!(json["fillPercentage"], 100.0);
    assert_eq!(json["suggestion"], "Run it now.");
    assert_eq!(json["detail"]["overall"], 160.0);
}

#[test]
fn test_json_output_keeps_null_suggestion() {
    let tables = EstimationTables::default();
    let items: Vec<Detection> = (0..7).map(|_| Detection::new("l_bowl", 0.9)).collect();
    let estimate = FillAggregator::new(&tables).aggregate(&items).unwrap();

    let json: serde_json::Value = serde_json::from_str(&estimate_json(&estimate).unwrap()).unwrap();
    assert_eq!(json["fillPercentage"], 25.0);
    assert!(json.get("suggestion").is_some());
    assert!(json["suggestion"].is_null());
}
