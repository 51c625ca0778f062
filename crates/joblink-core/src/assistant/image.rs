//! Image values handled by the assistant.
//!
//! The controller never touches raw transport encodings. A produced image is an
//! opaque [`ImageReference`] that renders as a `data:` URI; a staged image is the
//! file the user picked, bytes plus declared media type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::AssistantError;

/// A user-selected image waiting to be edited.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// File name as picked (used for display only)
    pub name: String,
    /// Declared media type, e.g. `image/png`
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Whether the declared media type indicates an image.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A displayable image produced by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// Wraps an already base64-encoded payload.
    pub fn from_base64(media_type: &str, payload: &str) -> Self {
        Self(format!("data:{media_type};base64,{payload}"))
    }

    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(media_type, &BASE64_STANDARD.encode(bytes))
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn media_type(&self) -> &str {
        split_data_uri(&self.0)
            .map(|(media_type, _)| media_type)
            .unwrap_or("application/octet-stream")
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, AssistantError> {
        let (_, payload) = split_data_uri(&self.0).ok_or_else(|| {
            AssistantError::invalid_input("Image reference must be a base64 data URI")
        })?;
        BASE64_STANDARD
            .decode(payload)
            .map_err(|e| AssistantError::invalid_input(format!("Invalid image payload: {e}")))
    }

    /// Conventional file extension for the media type.
    pub fn extension(&self) -> &'static str {
        match self.media_type() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/jpeg" | "image/jpg" => "jpg",
            _ => "bin",
        }
    }
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageReference")
            .field("media_type", &self.media_type())
            .field("uri_len", &self.0.len())
            .finish()
    }
}

fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    Some((media_type, payload))
}

/// Result of an edit call: the new image and whatever the model said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub image: ImageReference,
    pub explanation: Option<String>,
}
