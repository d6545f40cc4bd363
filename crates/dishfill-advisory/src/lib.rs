//! Advisory layer - language model prompts, backend, and response validation
//!
//! The model is treated as an untrusted text generator. Prompts live in
//! [`ai::prompts`], the transport in [`ai::backend_impl`], and every answer
//! passes through [`validator`] before anything else sees it.

pub mod ai;
pub mod validator;

pub use ai::{
    build_fill_prompt, build_suggestion_prompt, complete_with_timeout, AdvisoryBackend,
    AdvisoryPrompt, BackendFuture, OpenAiBackend, PromptPurpose,
};
pub use validator::{validate_numeric, validate_text};
