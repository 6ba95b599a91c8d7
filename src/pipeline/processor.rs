//! Verification pipeline: the single request-handling boundary.
//!
//! Composes the extraction adapter and the governance validator and turns
//! every result, including transport and parse failures, into an
//! [`UploadOutcome`]. Nothing escapes as a fault.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::extraction::{
    DocumentImage, ExtractionAdapter, ImageFormat, ParseOutcome, VisionClient,
};
use super::governance::{GovernanceValidator, UnknownTypePolicy, VerificationVerdict};

/// Shown when the model reply could not be turned into a record.
pub const UNSTRUCTURED_MESSAGE: &str =
    "AI couldn't structure the data. Please try a clearer photo.";

/// Upload metadata echoed back for the audit view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl From<&DocumentImage> for ImageSummary {
    fn from(image: &DocumentImage) -> Self {
        Self {
            format: image.format,
            width: image.width,
            height: image.height,
            size_bytes: image.size_bytes(),
        }
    }
}

/// A completed verification, accepted or not.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub request_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub model: String,
    pub image: ImageSummary,
    pub verdict: VerificationVerdict,
    /// The decoded object exactly as the model returned it.
    pub raw_record: serde_json::Map<String, serde_json::Value>,
}

/// Everything one upload can end in.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Verified(VerificationReport),
    Rejected(VerificationReport),
    /// The reply held no usable record.
    Unstructured {
        request_id: Uuid,
        message: String,
        detail: String,
    },
    /// The model call itself failed.
    SystemError { request_id: Uuid, message: String },
}

impl UploadOutcome {
    pub fn request_id(&self) -> Uuid {
        match self {
            Self::Verified(report) | Self::Rejected(report) => report.request_id,
            Self::Unstructured { request_id, .. } | Self::SystemError { request_id, .. } => {
                *request_id
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verified",
            Self::Rejected(_) => "rejected",
            Self::Unstructured { .. } => "unstructured",
            Self::SystemError { .. } => "system_error",
        }
    }
}

/// Image → extraction → governance, stateless per call.
pub struct VerificationPipeline {
    adapter: ExtractionAdapter,
    validator: GovernanceValidator,
}

impl VerificationPipeline {
    pub fn new(client: Arc<dyn VisionClient>, policy: UnknownTypePolicy) -> Self {
        Self {
            adapter: ExtractionAdapter::new(client),
            validator: GovernanceValidator::new(policy),
        }
    }

    pub fn model_name(&self) -> &str {
        self.adapter.model_name()
    }

    pub fn validator(&self) -> &GovernanceValidator {
        &self.validator
    }

    /// Process one decoded upload. Blocks for the duration of the model call.
    pub fn process(&self, request_id: Uuid, image: &DocumentImage) -> UploadOutcome {
        let _span = tracing::info_span!("verify_document", %request_id).entered();

        let outcome = match self.adapter.extract(image) {
            Err(e) => {
                tracing::error!(error = %e, "Model call failed");
                UploadOutcome::SystemError {
                    request_id,
                    message: format!("System Error: {e}"),
                }
            }
            Ok(ParseOutcome::Unparseable(reason)) => UploadOutcome::Unstructured {
                request_id,
                message: UNSTRUCTURED_MESSAGE.to_string(),
                detail: reason.to_string(),
            },
            Ok(ParseOutcome::Parsed { record, raw }) => {
                let verdict = self.validator.validate(&record);
                let report = VerificationReport {
                    request_id,
                    checked_at: Utc::now(),
                    model: self.model_name().to_string(),
                    image: ImageSummary::from(image),
                    verdict,
                    raw_record: raw,
                };
                if report.verdict.accepted {
                    UploadOutcome::Verified(report)
                } else {
                    UploadOutcome::Rejected(report)
                }
            }
        };

        tracing::info!(outcome = outcome.label(), "Upload processed");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::{MockReply, MockVisionClient};
    use crate::pipeline::governance::Rejection;

    fn image() -> DocumentImage {
        DocumentImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 9, 9],
            format: ImageFormat::Jpeg,
            width: 640,
            height: 400,
        }
    }

    fn reply(id_num: &str, doc_type: &str, tamper: &str) -> String {
        format!(
            r#"Here you go: {{"name":"Meera Iyer","id_num":"{id_num}","doc_type":"{doc_type}","lang":"Tamil","tamper":"{tamper}","reason":"Hologram region looks intact"}}"#
        )
    }

    fn pipeline_with(reply: MockReply, policy: UnknownTypePolicy) -> VerificationPipeline {
        VerificationPipeline::new(Arc::new(MockVisionClient::with_reply(reply)), policy)
    }

    fn run(text: String) -> UploadOutcome {
        pipeline_with(MockReply::Text(text), UnknownTypePolicy::Accept)
            .process(Uuid::new_v4(), &image())
    }

    #[test]
    fn valid_aadhaar_low_risk_is_verified() {
        match run(reply("234567890123", "Aadhaar", "Low")) {
            UploadOutcome::Verified(report) => {
                assert!(report.verdict.format_valid);
                assert!(report.verdict.accepted);
                assert_eq!(report.model, "gemini-mock");
                assert_eq!(report.image.width, 640);
                assert_eq!(report.raw_record["name"], "Meera Iyer");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn leading_one_aadhaar_is_rejected() {
        match run(reply("134567890123", "Aadhaar", "Low")) {
            UploadOutcome::Rejected(report) => {
                assert!(!report.verdict.format_valid);
                assert!(!report.verdict.accepted);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn high_risk_pan_is_rejected_with_model_reason() {
        match run(reply("ABCDE1234F", "PAN", "High")) {
            UploadOutcome::Rejected(report) => {
                assert!(report.verdict.format_valid);
                assert_eq!(
                    report.verdict.rejections,
                    vec![Rejection::TamperRisk {
                        level: crate::pipeline::governance::TamperRisk::High,
                        model_reason: "Hologram region looks intact".into(),
                    }]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_type_follows_policy() {
        let accept = pipeline_with(
            MockReply::Text(reply("P1234567", "Passport", "Low")),
            UnknownTypePolicy::Accept,
        )
        .process(Uuid::new_v4(), &image());
        assert_eq!(accept.label(), "verified");

        let reject = pipeline_with(
            MockReply::Text(reply("P1234567", "Passport", "Low")),
            UnknownTypePolicy::Reject,
        )
        .process(Uuid::new_v4(), &image());
        assert_eq!(reject.label(), "rejected");
    }

    #[test]
    fn unparseable_reply_surfaces_structuring_message() {
        match run("The image is too blurry to read.".into()) {
            UploadOutcome::Unstructured { message, .. } => {
                assert_eq!(message, UNSTRUCTURED_MESSAGE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_field_surfaces_structuring_message() {
        let text = r#"{"name":"A","id_num":"234567890123","doc_type":"Aadhaar","lang":"en","reason":"r"}"#;
        match run(text.into()) {
            UploadOutcome::Unstructured { message, detail, .. } => {
                assert_eq!(message, UNSTRUCTURED_MESSAGE);
                assert!(detail.contains("tamper"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn transport_failure_surfaces_verbatim() {
        let outcome = pipeline_with(
            MockReply::ProviderError {
                status: 403,
                body: "API key not valid".into(),
            },
            UnknownTypePolicy::Accept,
        )
        .process(Uuid::new_v4(), &image());
        match outcome {
            UploadOutcome::SystemError { message, .. } => assert_eq!(
                message,
                "System Error: Model API returned error (status 403): API key not valid"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn request_id_is_preserved() {
        let id = Uuid::new_v4();
        let outcome = pipeline_with(MockReply::Timeout(5), UnknownTypePolicy::Accept)
            .process(id, &image());
        assert_eq!(outcome.request_id(), id);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(run(reply("ABCDE1234F", "PAN", "Low"))).unwrap();
        assert_eq!(json["status"], "verified");
        assert_eq!(json["verdict"]["accepted"], true);
        assert_eq!(json["verdict"]["document_kind"], "pan");
        assert_eq!(json["image"]["format"], "jpeg");
        assert_eq!(json["raw_record"]["id_num"], "ABCDE1234F");

        let json = serde_json::to_value(run("nothing".into())).unwrap();
        assert_eq!(json["status"], "unstructured");
        assert_eq!(json["message"], UNSTRUCTURED_MESSAGE);
    }
}
