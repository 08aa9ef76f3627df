//! Schema extraction from assistant responses.
//!
//! Locates a fenced ```json block in free text and parses its contents.
//! Extraction is pure and idempotent: the same input always yields the
//! same document or the same failure.

use thiserror::Error;

/// Errors that can occur during schema extraction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no fenced json block found in response")]
    NoFencedBlock,

    #[error("fenced json block is not terminated")]
    UnterminatedBlock,

    #[error("fenced block is not valid JSON: {0}")]
    Parse(String),
}

/// Extracts a structured schema document from raw assistant text.
///
/// When a response contains more than one fenced block, the first
/// occurrence wins; later blocks are ignored rather than rejected, which
/// keeps the behavior deterministic.
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

impl SchemaExtractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts and parses the first fenced ```json block in `text`.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::NoFencedBlock`] when no ```json fence opens.
    /// - [`ExtractionError::UnterminatedBlock`] when the fence never closes.
    /// - [`ExtractionError::Parse`] when the block contents are not valid JSON.
    pub fn extract(&self, text: &str) -> Result<serde_json::Value, ExtractionError> {
        let start = text.find(FENCE_OPEN).ok_or(ExtractionError::NoFencedBlock)?;
        let body = &text[start + FENCE_OPEN.len()..];
        let end = body.find(FENCE_CLOSE).ok_or(ExtractionError::UnterminatedBlock)?;

        serde_json::from_str(body[..end].trim())
            .map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}
