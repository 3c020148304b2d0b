use crate::MimeDetector;
use std::path::Path;
use tracing::debug;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Magic-byte sniffing. Plain text has no signature and falls through to the next detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferMimeDetector;

impl MimeDetector for InferMimeDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        match infer::get_from_path(path) {
            Ok(kind) => kind.map(|k| k.mime_type().to_string()),
            Err(e) => {
                debug!("magic sniff failed for {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Guesses from the file extension alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionMimeDetector;

impl MimeDetector for ExtensionMimeDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())?;
        // mime_guess maps .ts to MPEG transport streams; source files are far more common here.
        if ext == "ts" {
            return Some("text/x-typescript".to_string());
        }
        mime_guess::from_ext(&ext).first_raw().map(str::to_string)
    }
}

/// Asks each detector in turn and falls back to `application/octet-stream`.
pub struct ChainedDetector {
    detectors: Vec<Box<dyn MimeDetector>>,
}

impl ChainedDetector {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn with_detector(mut self, detector: impl MimeDetector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn detect_or_default(&self, path: &Path) -> String {
        self.detect(path).unwrap_or_else(|| OCTET_STREAM.to_string())
    }
}

impl Default for ChainedDetector {
    fn default() -> Self {
        Self::new()
            .with_detector(InferMimeDetector)
            .with_detector(ExtensionMimeDetector)
    }
}

impl MimeDetector for ChainedDetector {
    fn detect(&self, path: &Path) -> Option<String> {
        self.detectors.iter().find_map(|d| d.detect(path))
    }
}
