//! Domain layer of the JobLink assistant.
//!
//! Holds the types every other crate shares: users, the transcript, image
//! values, the error taxonomy, configuration models, the contract of the
//! generative backend, and the session manager that scopes one backend
//! session per user.

pub mod assistant;
pub mod backend;
pub mod config;
pub mod error;
pub mod secret;
pub mod session;
pub mod user;

// Re-export common error types
pub use error::{AssistantError, JobLinkError};
