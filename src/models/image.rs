use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AdForgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl MediaType {
    /// Detects the format from magic bytes. Unknown payloads are treated as JPEG.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            MediaType::Jpeg
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            MediaType::Png
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            MediaType::Webp
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            MediaType::Gif
        } else {
            MediaType::Jpeg
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/webp" => Some(MediaType::Webp),
            "image/gif" => Some(MediaType::Gif),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
            MediaType::Gif => "image/gif",
        }
    }

    /// Format name as Bedrock expects it in image content blocks.
    pub fn format(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpeg",
            MediaType::Png => "png",
            MediaType::Webp => "webp",
            MediaType::Gif => "gif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// The user's selected image. A new selection replaces the asset; it is never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    media_type: MediaType,
}

impl ImageAsset {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: MediaType) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            bytes: Arc::from(bytes),
            media_type,
        }
    }

    /// Builds an asset from raw bytes, sniffing the media type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let media_type = MediaType::sniff(&bytes);
        Self::new(bytes, media_type)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AdForgeError::ImageError(format!("invalid base64 payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AdForgeError::ImageError("empty image payload".into()));
        }
        Ok(Self::from_bytes(bytes))
    }

    /// Parses `data:image/png;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| AdForgeError::ImageError("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AdForgeError::ImageError("data URL has no payload".into()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| AdForgeError::ImageError("data URL is not base64 encoded".into()))?;
        let media_type = MediaType::from_mime(mime)
            .ok_or_else(|| AdForgeError::ImageError(format!("unsupported image type: {}", mime)))?;

        let asset = Self::from_base64(payload)?;
        Ok(Self {
            bytes: asset.bytes,
            media_type,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            AdForgeError::ImageError(format!("failed to read {}: {}", path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(AdForgeError::ImageError(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self::from_bytes(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn encoded(&self) -> EncodedImage {
        EncodedImage(self.to_base64())
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Base64 text as it travels over the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(pub String);

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.0.trim())
            .map_err(|e| AdForgeError::ImageError(e.to_string()))
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedImage({} chars)", self.0.len())
    }
}
