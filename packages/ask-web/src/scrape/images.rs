//! OCR over a page's images.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{OcrError, OcrResult};
use crate::security::UrlValidator;
use crate::traits::ocr::OcrEngine;

use super::html;

/// Largest image body downloaded for OCR.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Downloads a page's first few images and reads their text.
#[derive(Clone)]
pub struct ImageTextExtractor {
    client: reqwest::Client,
    ocr: Arc<dyn OcrEngine>,
    max_images: usize,
    timeout: Duration,
    max_bytes: usize,
    validator: Option<UrlValidator>,
}

impl ImageTextExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            client: reqwest::Client::new(),
            ocr,
            max_images: 5,
            timeout: Duration::from_secs(10),
            max_bytes: MAX_IMAGE_BYTES,
            validator: None,
        }
    }

    pub fn with_max_images(mut self, max: usize) -> Self {
        self.max_images = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip images whose body is larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Refuse image URLs the validator rejects, including redirect targets.
    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        let redirects = validator.clone();
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= 5 {
                attempt.error("too many redirects")
            } else if let Err(e) = redirects.check(attempt.url()) {
                attempt.error(e)
            } else {
                attempt.follow()
            }
        });
        match reqwest::Client::builder().redirect(policy).build() {
            Ok(client) => self.client = client,
            Err(e) => debug!(error = %e, "Keeping default image client"),
        }
        self.validator = Some(validator);
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Labeled text of every image that yielded some, in page order.
    ///
    /// Never fails: an image that cannot be fetched or read is skipped.
    pub async fn extract(&self, html: &str, page_url: &Url) -> Vec<String> {
        let sources = html::image_sources(html, page_url, self.max_images);
        let mut lines = Vec::new();

        for (position, src) in sources {
            match self.read_image(&src).await {
                Ok(text) if !text.trim().is_empty() => {
                    lines.push(format!("Image {}: {}", position, text.trim()));
                }
                Ok(_) => debug!(src = %src, "No text in image"),
                Err(e) => debug!(src = %src, error = %e, "Skipping image"),
            }
        }
        lines
    }

    async fn read_image(&self, src: &str) -> OcrResult<String> {
        let url = Url::parse(src).map_err(|e| OcrError::Download(Box::new(e)))?;
        if let Some(validator) = &self.validator {
            validator
                .check_resolved(&url)
                .await
                .map_err(|e| OcrError::Download(Box::new(e)))?;
        }

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OcrError::Download(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Download(format!("HTTP {}", status).into()));
        }

        let too_large = || OcrError::Download(format!("image larger than {} bytes", self.max_bytes).into());
        if response.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| OcrError::Download(Box::new(e)))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        self.ocr.recognize(&bytes).await
    }
}
