//! Generative-AI backends for the JobLink assistant.
//!
//! [`GeminiBackend`] talks to the Gemini REST API directly: streamed chat via
//! server-sent events, Imagen for generation, and a Gemini image model for
//! edits.

pub mod gemini_backend;
mod gemini_types;
mod sse;

pub use gemini_backend::GeminiBackend;
