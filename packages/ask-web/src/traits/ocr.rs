//! OCR capability.

use async_trait::async_trait;

use crate::error::OcrResult;

/// Reads text out of an encoded image (PNG, JPEG, GIF, WebP...).
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in `image`. An image without text yields an empty string.
    async fn recognize(&self, image: &[u8]) -> OcrResult<String>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}
