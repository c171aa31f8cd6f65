//! AI-assisted chart filling.
//!
//! # Responsibility
//! - Talk to a text-generation backend through one narrow trait.
//! - Turn model output into cell writes that respect the chart invariants.
//!
//! # Invariants
//! - Nothing in this module holds state between calls; request tracking
//!   lives in the chart session.

pub mod client;
pub mod fill;
pub mod prompt;

pub use client::{
    AiError, AiResult, GeminiClient, GenerationClient, GenerationRequest, ProxyClient,
};
pub use fill::{apply_fill, extract_json, FillOutcome, FillTarget};
pub use prompt::{advice_prompt, fill_prompt, FillMode};
