//! Language model seam: prompts, backend trait, and the HTTP backend

pub mod backend_impl;
pub mod prompts;

pub use backend_impl::OpenAiBackend;
pub use prompts::{build_fill_prompt, build_suggestion_prompt, PromptPurpose};

use dishfill_types::AdvisoryError;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::debug;

/// One outbound request to the language model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryPrompt {
    pub purpose: PromptPurpose,
    pub text: String,
    pub max_tokens: u32,
}

/// Boxed future so the trait stays object-safe
pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AdvisoryError>> + Send + 'a>>;

/// Text completion provider.
///
/// Implementations return the raw model text. They do not interpret it;
/// that is the validator's job. Network or HTTP failures are
/// `AdvisoryError::Transport`.
pub trait AdvisoryBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn complete<'a>(&'a self, prompt: &'a AdvisoryPrompt) -> BackendFuture<'a>;
}

/// Run one completion with a hard deadline. Elapsed deadline is a transport failure.
pub async fn complete_with_timeout(
    backend: &dyn AdvisoryBackend,
    prompt: &AdvisoryPrompt,
    timeout: Duration,
) -> Result<String, AdvisoryError> {
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, backend.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(AdvisoryError::Timeout(timeout)),
    };

    debug!(
        backend = backend.name(),
        purpose = prompt.purpose.label(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "advisory completion finished"
    );

    result
}
