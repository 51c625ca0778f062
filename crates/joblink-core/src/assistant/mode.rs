use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend operation a submission is routed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Streaming conversation with the session.
    #[default]
    Chat,
    /// Text-to-image generation.
    ImageGenerate,
    /// Instruction-driven edit of a staged source image.
    ImageEdit,
}

impl InteractionMode {
    /// Placeholder shown in the prompt input for this mode.
    pub fn placeholder(&self) -> &'static str {
        match self {
            InteractionMode::Chat => "Ask me anything...",
            InteractionMode::ImageGenerate => "Describe an image... e.g., a cat in a spacesuit",
            InteractionMode::ImageEdit => {
                "Describe your edit... e.g., make the cat wear a party hat"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InteractionMode::Chat => "Chat",
            InteractionMode::ImageGenerate => "Generate Image",
            InteractionMode::ImageEdit => "Edit Image",
        }
    }

    pub fn requires_source_image(&self) -> bool {
        matches!(self, InteractionMode::ImageEdit)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InteractionMode::Chat => "chat",
            InteractionMode::ImageGenerate => "image-generate",
            InteractionMode::ImageEdit => "image-edit",
        })
    }
}
