//! IdeaInk AI
//!
//! Context-aware expansion and summarization of mind-map nodes through a
//! generative text endpoint.

pub mod client;
pub mod parse;
pub mod prompt;
pub mod service;

pub use client::{
    GenerateError, GeneratorConfig, HttpGenerator, OfflineGenerator, TextGenerator,
};
pub use prompt::{GenerationKind, GenerationRequest, PromptContext};
pub use service::{Generated, PreparedRequest, apply, expand, generate, prepare, summarize};
