pub mod types;
pub mod prompt;
pub mod parser;
pub mod intake;
pub mod gemini;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use intake::*;
pub use gemini::*;
pub use orchestrator::*;

use thiserror::Error;

/// Failures that stop extraction before a reply can be parsed.
///
/// Parse failures are not errors here; they are reported through
/// [`ParseOutcome::Unparseable`].
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Cannot reach the model API at {0}")]
    Connection(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model API returned error (status {status}): {body}")]
    ProviderError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model API response: {0}")]
    ResponseParsing(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}

impl ExtractionError {
    /// True when the upload itself is at fault rather than the model call.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::ImageProcessing(_))
    }
}
