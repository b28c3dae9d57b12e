//! Per-row image fetching.
//!
//! One GET per call, full resolution, no size limit. The body is accepted as an
//! image only if its leading bytes identify a known format.

use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid image URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response is not a decodable image ({0})")]
    Decode(&'static str),
    /// The fetch task panicked before producing a result.
    #[error("Image task panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    /// Identify the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

/// A fetched image, kept at full resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl Bitmap {
    pub fn decode(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Decode("empty body"));
        }
        let format = ImageFormat::sniff(&bytes).ok_or(ImageError::Decode("unknown format"))?;
        Ok(Self { format, bytes })
    }
}

/// What a row view's image area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSlot {
    /// Request issued, no result yet.
    #[default]
    Loading,
    Loaded(Arc<Bitmap>),
    /// The fixed placeholder shown when an image could not be fetched.
    Fallback,
}

/// Resolves image paths against the base URL and fetches them.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    http: reqwest::Client,
    base_url: String,
}

impl ImageLoader {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// `base_url + image_path`, concatenated as strings and then parsed.
    pub fn resolve(&self, image_path: &str) -> Result<Url, ImageError> {
        let joined = format!("{}{}", self.base_url, image_path);
        Url::parse(&joined).map_err(|source| ImageError::InvalidUrl {
            url: joined,
            source,
        })
    }

    /// Issues exactly one GET and decodes the body.
    pub async fn fetch_image(&self, url: &Url) -> Result<Bitmap, ImageError> {
        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ImageError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let bitmap = Bitmap::decode(bytes.to_vec())?;
        tracing::debug!(
            url = %url,
            format = bitmap.format.name(),
            bytes = bitmap.bytes.len(),
            "Image fetched"
        );
        Ok(bitmap)
    }
}
