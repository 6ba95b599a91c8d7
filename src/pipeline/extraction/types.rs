use serde::Serialize;
use thiserror::Error;

use super::ExtractionError;

/// Fields read off an identity document by the vision model.
///
/// Serialized with the model's wire keys so the audit view matches the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub name: String,
    #[serde(rename = "id_num")]
    pub id_number: String,
    pub doc_type: String,
    #[serde(rename = "lang")]
    pub language: String,
    #[serde(rename = "tamper")]
    pub tamper_risk: String,
    pub reason: String,
}

/// Why a model reply could not be turned into a [`DocumentRecord`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnparseableReason {
    #[error("reply contains no parseable JSON: {0}")]
    InvalidJson(String),

    #[error("reply JSON is not an object")]
    NotAnObject,

    #[error("required field `{0}` is missing or not a scalar")]
    MissingField(&'static str),
}

/// Result of decoding one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// All six fields were present. `raw` is the decoded object as the model sent it.
    Parsed {
        record: DocumentRecord,
        raw: serde_json::Map<String, serde_json::Value>,
    },
    Unparseable(UnparseableReason),
}

#[cfg(test)]
impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

/// Raster encodings accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// An upload that has been sniffed and decoded successfully.
#[derive(Debug, Clone)]
pub struct DocumentImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl DocumentImage {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Multimodal model client abstraction (allows mocking).
pub trait VisionClient: Send + Sync {
    /// Send one prompt with one image and return the reply text.
    fn generate_with_image(
        &self,
        prompt: &str,
        image: &DocumentImage,
    ) -> Result<String, ExtractionError>;

    fn model_name(&self) -> &str;
}
