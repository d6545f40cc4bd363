//! Estimation Service - Core Use Case for Dishwasher Fill Estimation
//!
//! This service orchestrates one request:
//! 1. Validate and classify detections against the shared tables
//! 2. Compute the deterministic estimate (always available)
//! 3. On the advisory path, ask the model for the overall percentage,
//!    validate it, retry once with a stricter prompt, then fall back
//! 4. Optionally ask the model for a loading suggestion (best effort)
//!
//! States: Start -> Classified -> Aggregated (deterministic), or
//! Start -> Classified -> AwaitingAdvisory -> Validated | Rejected.
//! A rejected advisory answer is never returned to the caller.

use crate::config::Config;
use dishfill_advisory::ai::prompts::{
    build_fill_prompt_with_budget, build_suggestion_prompt_with_budget,
};
use dishfill_advisory::{complete_with_timeout, validate_numeric, validate_text, AdvisoryBackend};
use dishfill_domain::{ClassifiedCounts, EstimationTables, FillAggregator};
use dishfill_types::{
    AdvisoryError, Detection, Error, EstimateSource, EstimationMode, FillEstimate, Result,
};
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Attempts on the advisory path: the first prompt plus one strict retry
pub const MAX_ADVISORY_ATTEMPTS: u8 = 2;

/// Options for estimation
#[derive(Debug, Clone)]
pub struct EstimationOptions {
    /// Which path to start on
    pub mode: EstimationMode,

    /// Request a loading suggestion
    pub suggestion: bool,

    /// Use the deterministic value when the advisory path is exhausted
    pub fallback: bool,

    /// Drop detections below this confidence
    pub min_confidence: Option<f64>,

    /// Deadline for each model call
    pub timeout: Duration,

    pub fill_max_tokens: u32,

    pub suggestion_max_tokens: u32,
}

impl Default for EstimationOptions {
    fn default() -> Self {
        Self {
            mode: EstimationMode::Deterministic,
            suggestion: false,
            fallback: true,
            min_confidence: None,
            timeout: Duration::from_secs(12),
            fill_max_tokens: dishfill_advisory::ai::prompts::FILL_MAX_TOKENS,
            suggestion_max_tokens: dishfill_advisory::ai::prompts::SUGGESTION_MAX_TOKENS,
        }
    }
}

impl EstimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.mode,
            suggestion: config.suggestion_enabled,
            fallback: config.fallback_enabled,
            min_confidence: config.min_confidence,
            timeout: config.advisory.timeout(),
            fill_max_tokens: config.advisory.fill_max_tokens,
            suggestion_max_tokens: config.advisory.suggestion_max_tokens,
        }
    }

    pub fn with_mode(mut self, mode: EstimationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_suggestion(mut self, enabled: bool) -> Self {
        self.suggestion = enabled;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: Option<f64>) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Request-scoped orchestrator. Borrows the process-wide tables; holds no
/// mutable state, so one instance may serve concurrent requests.
pub struct EstimationService<'a> {
    tables: &'a EstimationTables,
    backend: Option<&'a dyn AdvisoryBackend>,
    options: EstimationOptions,
}

impl<'a> EstimationService<'a> {
    pub fn new(tables: &'a EstimationTables, options: EstimationOptions) -> Self {
        Self {
            tables,
            backend: None,
            options,
        }
    }

    pub fn with_backend(mut self, backend: &'a dyn AdvisoryBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Main entry point: estimate the fill level for one set of detections
    pub async fn estimate(&self, detections: &[Detection]) -> Result<FillEstimate> {
        let request_id = Uuid::new_v4();
        let span = info_span!("estimate", %request_id, mode = %self.options.mode);
        self.run(detections).instrument(span).await
    }

    async fn run(&self, detections: &[Detection]) -> Result<FillEstimate> {
        // Step 1: Classify
        let aggregator =
            FillAggregator::new(self.tables).with_min_confidence(self.options.min_confidence);
        let classified = aggregator.classify(detections)?;
        debug!(
            stage = "classified",
            detections = detections.len(),
            classified = classified.total_classified(),
            unclassified = classified.unclassified,
            below_threshold = classified.below_threshold,
        );

        // Step 2: Deterministic estimate
        let deterministic = aggregator.estimate(&classified);
        debug!(stage = "aggregated", overall = deterministic.overall);

        // Step 3: Advisory percentage
        let estimate = match self.options.mode {
            EstimationMode::Deterministic => deterministic,
            EstimationMode::Advisory => self.advisory_estimate(&classified, deterministic).await?,
        };

        // Step 4: Suggestion
        let suggestion = if self.options.suggestion {
            self.request_suggestion(&classified).await
        } else {
            None
        };

        info!(
            overall = estimate.overall,
            source = estimate.source.label(),
            suggestion = suggestion.is_some(),
            "estimate ready"
        );

        Ok(estimate.with_suggestion(suggestion))
    }

    async fn advisory_estimate(
        &self,
        classified: &ClassifiedCounts,
        deterministic: FillEstimate,
    ) -> Result<FillEstimate> {
        let Some(backend) = self.backend else {
            return self.fall_back(deterministic, "no advisory backend configured".to_string());
        };

        let mut last_error: Option<AdvisoryError> = None;

        for attempt in 1..=MAX_ADVISORY_ATTEMPTS {
            let prompt = build_fill_prompt_with_budget(
                &classified.counts,
                self.tables,
                attempt > 1,
                self.options.fill_max_tokens,
            );
            debug!(stage = "awaiting_advisory", attempt);

            let answer = complete_with_timeout(backend, &prompt, self.options.timeout)
                .await
                .and_then(|raw| validate_numeric(&raw));

            match answer {
                Ok(percentage) => {
                    debug!(stage = "validated", attempt, percentage);
                    return Ok(FillEstimate {
                        overall: f64::from(percentage),
                        source: EstimateSource::Advisory { attempts: attempt },
                        ..deterministic
                    });
                }
                Err(err) if err.is_transport() => {
                    warn!(stage = "rejected", attempt, error = %err, "advisory transport failure");
                    return self.fall_back(deterministic, err.to_string());
                }
                Err(err) => {
                    warn!(stage = "rejected", attempt, error = %err, "advisory answer rejected");
                    last_error = Some(err);
                }
            }
        }

        let reason = match last_error {
            Some(err) => format!(
                "answer rejected after {} attempts: {}",
                MAX_ADVISORY_ATTEMPTS, err
            ),
            None => "no usable answer".to_string(),
        };
        self.fall_back(deterministic, reason)
    }

    fn fall_back(&self, deterministic: FillEstimate, reason: String) -> Result<FillEstimate> {
        if !self.options.fallback {
            return Err(Error::Upstream(reason));
        }

        warn!(reason = %reason, "falling back to deterministic estimate");
        Ok(FillEstimate {
            source: EstimateSource::Fallback { reason },
            ..deterministic
        })
    }

    /// Best effort: any failure is logged and reported as no suggestion
    async fn request_suggestion(&self, classified: &ClassifiedCounts) -> Option<String> {
        let backend = self.backend?;
        let prompt = build_suggestion_prompt_with_budget(
            &classified.counts,
            self.tables,
            self.options.suggestion_max_tokens,
        );

        match complete_with_timeout(backend, &prompt, self.options.timeout)
            .await
            .and_then(|raw| validate_text(&raw))
        {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(error = %err, "no loading suggestion");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishfill_advisory::{AdvisoryPrompt, BackendFuture, PromptPurpose};
    use dishfill_types::ErrorKind;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records what was asked
    struct ScriptedBackend {
        replies: Mutex<VecDeque<std::result::Result<String, AdvisoryError>>>,
        asked: Mutex<Vec<PromptPurpose>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<std::result::Result<String, AdvisoryError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<PromptPurpose> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl AdvisoryBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn complete<'a>(&'a self, prompt: &'a AdvisoryPrompt) -> BackendFuture<'a> {
            self.asked.lock().unwrap().push(prompt.purpose);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AdvisoryError::Transport("script exhausted".into())));
            Box::pin(async move { reply })
        }
    }

    struct HangingBackend;

    impl AdvisoryBackend for HangingBackend {
        fn name(&self) -> &str {
            "hanging"
        }

        fn complete<'a>(&'a self, _prompt: &'a AdvisoryPrompt) -> BackendFuture<'a> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("50".to_string())
            })
        }
    }

    fn ok(s: &str) -> std::result::Result<String, AdvisoryError> {
        Ok(s.to_string())
    }

    fn load() -> Vec<Detection> {
        let mut items = Vec::new();
        items.extend((0..4).map(|_| Detection::new("l_plate", 0.9)));
        items.extend((0..8).map(|_| Detection::new("m_cup", 0.8)));
        items.extend((0..5).map(|_| Detection::new("glass", 0.7)));
        items.push(Detection::new("fork", 0.6));
        items
    }

    fn advisory() -> EstimationOptions {
        EstimationOptions::new().with_mode(EstimationMode::Advisory)
    }

    #[tokio::test]
    async fn test_deterministic_path_without_backend() {
        let tables = EstimationTables::default();
        let service = EstimationService::new(&tables, EstimationOptions::new());
        let estimate = service.estimate(&load()).await.unwrap();
        assert_eq!(estimate.source, EstimateSource::Deterministic);
        assert!((estimate.overall - 34.29).abs() < 1e-9);
        assert_eq!(estimate.unclassified, 1);
        assert_eq!(estimate.suggestion, None);
    }

    #[tokio::test]
    async fn test_advisory_answer_validated() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok(" 57 ")]);
        let service = EstimationService::new(&tables, advisory()).with_backend(&backend);

        let estimate = service.estimate(&load()).await.unwrap();
        assert_eq!(estimate.overall, 57.0);
        assert_eq!(estimate.source, EstimateSource::Advisory { attempts: 1 });
        // Per-compartment figures stay deterministic
        assert_eq!(estimate.counts.large, 4);
        assert_eq!(backend.asked(), vec![PromptPurpose::FillPercentage]);
    }

    #[tokio::test]
    async fn test_rejected_answer_retried_with_strict_prompt() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("About forty percent."), ok("41%")]);
        let service = EstimationService::new(&tables, advisory()).with_backend(&backend);

        let estimate = service.estimate(&load()).await.unwrap();
        assert_eq!(estimate.overall, 41.0);
        assert_eq!(estimate.source, EstimateSource::Advisory { attempts: 2 });
        assert_eq!(
            backend.asked(),
            vec![PromptPurpose::FillPercentage, PromptPurpose::StrictFillPercentage]
        );
    }

    #[tokio::test]
    async fn test_two_rejections_fall_back() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("137"), ok("-3")]);
        let service = EstimationService::new(&tables, advisory()).with_backend(&backend);

        let estimate = service.estimate(&load()).await.unwrap();
        assert!((estimate.overall - 34.29).abs() < 1e-9);
        assert!(matches!(estimate.source, EstimateSource::Fallback { .. }));
        assert_eq!(backend.asked().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_matches_deterministic_path() {
        let tables = EstimationTables::default();
        let detections = load();

        let deterministic = EstimationService::new(&tables, EstimationOptions::new())
            .estimate(&detections)
            .await
            .unwrap();

        let backend =
            ScriptedBackend::new(vec![Err(AdvisoryError::Transport("connection refused".into()))]);
        let fallback = EstimationService::new(&tables, advisory())
            .with_backend(&backend)
            .estimate(&detections)
            .await
            .unwrap();

        assert_eq!(fallback.overall, deterministic.overall);
        assert_eq!(fallback.per_compartment, deterministic.per_compartment);
        assert!(matches!(fallback.source, EstimateSource::Fallback { .. }));
        // Transport failures do not use the retry
        assert_eq!(backend.asked(), vec![PromptPurpose::FillPercentage]);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let tables = EstimationTables::default();
        let options = advisory().with_timeout(Duration::from_millis(20));
        let service = EstimationService::new(&tables, options).with_backend(&HangingBackend);

        let estimate = service.estimate(&load()).await.unwrap();
        match estimate.source {
            EstimateSource::Fallback { reason } => assert!(reason.contains("No response")),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_without_fallback_is_upstream_error() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("abc"), ok("xyz")]);
        let service = EstimationService::new(&tables, advisory().with_fallback(false))
            .with_backend(&backend);

        let err = service.estimate(&load()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
    }

    #[tokio::test]
    async fn test_advisory_without_backend_falls_back() {
        let tables = EstimationTables::default();
        let service = EstimationService::new(&tables, advisory());
        let estimate = service.estimate(&load()).await.unwrap();
        assert!(matches!(estimate.source, EstimateSource::Fallback { .. }));
    }

    #[tokio::test]
    async fn test_suggestion_attached() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("  Add two large bowls and a few glasses.\n")]);
        let service = EstimationService::new(&tables, EstimationOptions::new().with_suggestion(true))
            .with_backend(&backend);

        let estimate = service.estimate(&load()).await.unwrap();
        assert_eq!(
            estimate.suggestion.as_deref(),
            Some("Add two large bowls and a few glasses.")
        );
        assert_eq!(estimate.source, EstimateSource::Deterministic);
        assert_eq!(backend.asked(), vec![PromptPurpose::Suggestion]);
    }

    #[tokio::test]
    async fn test_suggestion_failure_does_not_fail_estimate() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("62"), ok("   ")]);
        let options = advisory().with_suggestion(true);
        let service = EstimationService::new(&tables, options).with_backend(&backend);

        let estimate = service.estimate(&load()).await.unwrap();
        assert_eq!(estimate.overall, 62.0);
        assert_eq!(estimate.suggestion, None);
        assert!(estimate.to_response().suggestion.is_none());
    }

    #[tokio::test]
    async fn test_invalid_detection_fails_before_any_model_call() {
        let tables = EstimationTables::default();
        let backend = ScriptedBackend::new(vec![ok("50")]);
        let service = EstimationService::new(&tables, advisory().with_suggestion(true))
            .with_backend(&backend);

        let detections = vec![Detection::new("glass", 0.5), Detection::new("l_plate", 2.0)];
        let err = service.estimate(&detections).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(backend.asked().is_empty());
    }

    #[tokio::test]
    async fn test_deterministic_value_round_trips_through_validator() {
        let tables = EstimationTables::default();
        let service = EstimationService::new(&tables, EstimationOptions::new());

        for (large, medium, small) in [(0, 0, 0), (1, 0, 0), (4, 8, 5), (14, 0, 0), (13, 15, 19), (14, 16, 20)] {
            let mut items = Vec::new();
            items.extend((0..large).map(|_| Detection::new("l_bowl", 0.9)));
            items.extend((0..medium).map(|_| Detection::new("m_plate", 0.9)));
            items.extend((0..small).map(|_| Detection::new("s_cup", 0.9)));

            let estimate = service.estimate(&items).await.unwrap();
            let rendered = format!("{:.2}", estimate.fill_percentage());
            let parsed = validate_numeric(&rendered).unwrap();
            assert_eq!(
                f64::from(parsed),
                estimate.fill_percentage().round(),
                "round trip failed for {rendered}"
            );
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let tables = EstimationTables::default();
        let service = EstimationService::new(&tables, EstimationOptions::new());

        let empty: Vec<Detection> = Vec::new();
        let full: Vec<Detection> = (0..14).map(|_| Detection::new("l_plate", 0.9)).collect();

        let (a, b) = tokio::join!(service.estimate(&empty), service.estimate(&full));
        assert_eq!(a.unwrap().overall, 0.0);
        assert_eq!(b.unwrap().overall, 50.0);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.mode = EstimationMode::Advisory;
        config.min_confidence = Some(0.4);
        config.advisory.timeout_secs = 10;

        let options = EstimationOptions::from_config(&config);
        assert_eq!(options.mode, EstimationMode::Advisory);
        assert_eq!(options.min_confidence, Some(0.4));
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(options.suggestion);
        assert!(options.fallback);
    }
}
