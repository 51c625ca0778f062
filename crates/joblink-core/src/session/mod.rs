//! Session domain module.
//!
//! # Module Structure
//!
//! - `instruction`: System instruction that scopes each user's session
//! - `manager`: Session creation and teardown (`SessionManager`)

mod instruction;
mod manager;

pub use instruction::{greeting, system_instruction};
pub use manager::{ChatSession, SessionManager};
