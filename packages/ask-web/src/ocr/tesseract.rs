//! Local OCR through the `tesseract` command-line engine.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{OcrError, OcrResult};
use crate::traits::ocr::OcrEngine;

const LANGUAGE: &str = "eng";

/// Runs `tesseract stdin stdout` per image, killing it after `timeout`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    timeout: Duration,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable path.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> OcrResult<String> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", LANGUAGE])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::Unavailable(format!("{}: {}", self.binary, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Unavailable("tesseract stdin not captured".to_string()))?;
        let bytes = image.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&bytes).await;
            drop(stdin);
            result
        });

        // Dropping the timed-out future drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Recognition(format!("tesseract timed out after {:?}", self.timeout)))?
            .map_err(|e| OcrError::Unavailable(e.to_string()))?;

        if let Ok(Err(e)) = writer.await {
            debug!(error = %e, "tesseract closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let ocr = TesseractOcr::new().with_binary("definitely-not-a-real-ocr-binary");
        let err = ocr.recognize(b"not an image").await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_engine_is_killed() {
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!("ask-web-hung-ocr-{}", std::process::id()));
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ocr = TesseractOcr::new()
            .with_binary(script.to_string_lossy())
            .with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = ocr.recognize(b"image").await.unwrap_err();
        let _ = std::fs::remove_file(&script);

        assert!(matches!(err, OcrError::Recognition(msg) if msg.contains("timed out")));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
