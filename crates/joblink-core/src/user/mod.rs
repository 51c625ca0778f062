//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: User identity and role

mod model;

pub use model::{User, UserType};
