//! Application layer for the JobLink assistant.
//!
//! Hosts the [`AssistantController`], which drives one user's assistant
//! through chat, image generation and image editing, and the runtime wiring
//! that connects it to configuration and the Gemini backend.

pub mod controller;
pub mod runtime;
pub mod state;

pub use controller::{AssistantController, INVALID_IMAGE_MESSAGE, StageOutcome, SubmitOutcome};
pub use runtime::AssistantRuntime;
pub use state::AssistantState;
