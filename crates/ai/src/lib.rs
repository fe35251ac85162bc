//! AI follow-up suggestions for leads.
//!
//! The pipeline is deliberately small: build a deterministic prompt from a
//! lead snapshot, make one call to the external generative-text service
//! through the [`LlmClient`] seam, and parse the freeform reply into a
//! bounded list of short suggestion lines.
//!
//! The one hard guarantee lives in [`suggest::FollowUpSuggester`]: a failed
//! or malformed service call never reaches the caller as an error. It is
//! logged and converted into a single fallback line so the requesting view
//! always has something to render. Suggestions are transient; nothing here
//! is cached, retried, or persisted.

pub mod client;
pub mod suggest;

pub use client::{GenerativeLanguageClient, LlmClient, LlmError};
pub use suggest::{build_prompt, parse_suggestions, FollowUpSuggester, FALLBACK_SUGGESTION};
