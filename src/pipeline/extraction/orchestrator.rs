//! Extraction adapter: one document image in, one decoded record (or a
//! reportable parse failure) out.

use std::sync::Arc;

use super::parser::parse_document_reply;
use super::prompt::EXTRACTION_PROMPT;
use super::types::{DocumentImage, ParseOutcome, VisionClient};
use super::ExtractionError;

/// Sends the fixed extraction prompt with an image and decodes the reply.
///
/// Accepts any `VisionClient` implementation (GeminiClient or mock).
pub struct ExtractionAdapter {
    client: Arc<dyn VisionClient>,
}

impl ExtractionAdapter {
    pub fn new(client: Arc<dyn VisionClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Run extraction for one image.
    ///
    /// Transport failures are returned as `Err`. A reply that cannot be
    /// decoded is a normal `Ok(ParseOutcome::Unparseable)`.
    pub fn extract(&self, image: &DocumentImage) -> Result<ParseOutcome, ExtractionError> {
        let _span = tracing::info_span!(
            "document_extract",
            model = %self.client.model_name(),
            image_size = image.size_bytes(),
            format = image.format.mime_type(),
        )
        .entered();
        let start = std::time::Instant::now();

        let reply = self.client.generate_with_image(EXTRACTION_PROMPT, image)?;
        let outcome = parse_document_reply(&reply);

        match &outcome {
            ParseOutcome::Parsed { .. } => tracing::info!(
                elapsed_ms = %start.elapsed().as_millis(),
                reply_len = reply.len(),
                "Document fields extracted"
            ),
            ParseOutcome::Unparseable(reason) => tracing::warn!(
                elapsed_ms = %start.elapsed().as_millis(),
                reply_len = reply.len(),
                %reason,
                "Model reply could not be structured"
            ),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::gemini::{MockReply, MockVisionClient};
    use crate::pipeline::extraction::types::{ImageFormat, UnparseableReason};

    fn image() -> DocumentImage {
        DocumentImage {
            bytes: vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0],
            format: ImageFormat::Png,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn extracts_record_from_chatty_reply() {
        let mock = MockVisionClient::new(
            r#"Sure, here is the data: {"name":"A","id_num":"ABCDE1234F","doc_type":"PAN","lang":"English","tamper":"Low","reason":"ok"} Thanks!"#,
        );
        let adapter = ExtractionAdapter::new(Arc::new(mock));
        let outcome = adapter.extract(&image()).unwrap();
        match outcome {
            ParseOutcome::Parsed { record, .. } => assert_eq!(record.id_number, "ABCDE1234F"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unparseable_reply_is_not_an_error() {
        let adapter = ExtractionAdapter::new(Arc::new(MockVisionClient::new("No document found.")));
        let outcome = adapter.extract(&image()).unwrap();
        assert!(matches!(
            outcome,
            ParseOutcome::Unparseable(UnparseableReason::InvalidJson(_))
        ));
    }

    #[test]
    fn transport_failure_is_returned() {
        let adapter = ExtractionAdapter::new(Arc::new(MockVisionClient::with_reply(
            MockReply::Timeout(60),
        )));
        let err = adapter.extract(&image()).unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(60)));
        assert!(!err.is_input_error());
    }

    #[test]
    fn makes_exactly_one_call() {
        let mock = Arc::new(MockVisionClient::new("{}"));
        let adapter = ExtractionAdapter::new(mock.clone());
        let _ = adapter.extract(&image());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn reports_model_name() {
        let adapter = ExtractionAdapter::new(Arc::new(MockVisionClient::new("")));
        assert_eq!(adapter.model_name(), "gemini-mock");
    }
}
