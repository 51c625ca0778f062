//! Assistant panel domain module.
//!
//! # Module Structure
//!
//! - `mode`: The three mutually exclusive interaction modes
//! - `message`: Transcript entries and the append-only transcript
//! - `image`: Staged source images and produced image references
//! - `event`: Events published to the presentation layer

mod event;
mod image;
mod message;
mod mode;

pub use event::AssistantEvent;
pub use image::{EditedImage, ImageReference, SourceImage};
pub use message::{Message, MessageSender, Transcript};
pub use mode::InteractionMode;
