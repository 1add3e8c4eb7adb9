//! OCR engines.
//!
//! [`OcrBackend::Tesseract`] shells out to a local CPU engine;
//! [`OcrBackend::Vision`] sends images to a hosted vision model.

pub mod tesseract;
pub mod vision;

use std::sync::Arc;

use crate::error::{ExtractionError, Result};
use crate::security::ApiKey;
use crate::traits::ocr::OcrEngine;
use crate::types::config::OcrBackend;

pub use tesseract::TesseractOcr;
pub use vision::VisionOcr;

/// Construct the engine for `backend`.
///
/// The vision backend needs an OpenAI-compatible key; the local one needs
/// nothing but the `tesseract` executable on `PATH`.
pub fn build_engine(backend: OcrBackend, api_key: Option<&ApiKey>) -> Result<Arc<dyn OcrEngine>> {
    match backend {
        OcrBackend::Tesseract => Ok(Arc::new(TesseractOcr::new())),
        OcrBackend::Vision => {
            let key = api_key
                .filter(|k| !k.is_empty())
                .ok_or_else(|| ExtractionError::Config("vision OCR requires OPENAI_API_KEY".into()))?;
            Ok(Arc::new(VisionOcr::new(key.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_requires_key() {
        assert!(matches!(
            build_engine(OcrBackend::Vision, None),
            Err(ExtractionError::Config(_))
        ));
        let key = ApiKey::new("sk-test");
        assert_eq!(build_engine(OcrBackend::Vision, Some(&key)).unwrap().name(), "vision");
        assert_eq!(build_engine(OcrBackend::Tesseract, None).unwrap().name(), "tesseract");
    }
}
