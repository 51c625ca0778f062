//! Filesystem and environment plumbing for the JobLink assistant.
//!
//! Resolves where configuration lives, loads `config.toml` and `secret.json`,
//! and turns files on disk into staged source images.

pub mod config_service;
pub mod paths;
pub mod secret_service;
pub mod source_image;

pub use crate::config_service::ConfigService;
pub use crate::paths::{JobLinkPaths, PathError};
pub use crate::secret_service::SecretServiceImpl;
pub use crate::source_image::{infer_media_type, load_source_image};
