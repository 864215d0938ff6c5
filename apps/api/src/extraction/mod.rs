//! Text extraction: turns a staged PDF or image into plain text.
//!
//! PDF parsing and OCR are CPU-bound and run on the blocking pool.

pub mod staging;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Declared type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Classifies a file by extension. Returns `None` for anything that is not
    /// `.pdf`, `.png`, `.jpg` or `.jpeg` (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => "image",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized document text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("failed to read document: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to decode document: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path, kind: DocumentKind)
        -> Result<ExtractedText, ExtractionError>;
}

/// Default extractor: `pdf-extract` for PDFs, Tesseract OCR for images.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(
        &self,
        path: &Path,
        kind: DocumentKind,
    ) -> Result<ExtractedText, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;

        let text = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => extract_pdf(&bytes),
            DocumentKind::Image => extract_image(&bytes),
        })
        .await
        .map_err(|e| ExtractionError::Decode(format!("extraction task failed: {e}")))??;

        if text.trim().is_empty() {
            return Err(ExtractionError::Decode(
                "no text could be extracted".to_string(),
            ));
        }

        Ok(ExtractedText::new(text))
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::Decode(format!("invalid PDF: {e}")))
}

#[cfg(feature = "ocr")]
fn extract_image(bytes: &[u8]) -> Result<String, ExtractionError> {
    use rusty_tesseract::{Args, Image};

    let img = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::Decode(format!("invalid image: {e}")))?;

    // Tesseract reads grayscale most reliably
    let gray = image::DynamicImage::ImageLuma8(img.to_luma8());
    let tesseract_image = Image::from_dynamic_image(&gray)
        .map_err(|e| ExtractionError::Decode(format!("OCR input rejected: {e}")))?;

    rusty_tesseract::image_to_string(&tesseract_image, &Args::default())
        .map_err(|e| ExtractionError::Decode(format!("OCR failed: {e}")))
}

#[cfg(not(feature = "ocr"))]
fn extract_image(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(ExtractionError::Decode(
        "OCR support is not enabled".to_string(),
    ))
}
