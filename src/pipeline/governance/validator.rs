use super::rules::{check_id_format, classify_doc_type};
use super::types::{
    DocumentKind, Rejection, TamperRisk, UnknownTypePolicy, VerificationVerdict,
};
use crate::pipeline::extraction::DocumentRecord;

/// Reconciles the model's extraction with the deterministic format rules.
///
/// Pure: no I/O, no shared state. Safe to call from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernanceValidator {
    policy: UnknownTypePolicy,
}

impl GovernanceValidator {
    pub fn new(policy: UnknownTypePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnknownTypePolicy {
        self.policy
    }

    /// Format check for an identifier against its claimed type.
    pub fn check_format(&self, id_number: &str, doc_type: &str) -> (DocumentKind, bool) {
        let kind = classify_doc_type(doc_type);
        let valid = match check_id_format(id_number, kind) {
            Some(valid) => valid,
            None => {
                tracing::warn!(
                    policy = ?self.policy,
                    "No format rule for document type, applying unknown-type policy"
                );
                matches!(self.policy, UnknownTypePolicy::Accept)
            }
        };
        (kind, valid)
    }

    /// Produce the verdict for one record.
    ///
    /// `accepted` holds only when the format is valid and the model rated the
    /// tamper risk exactly `Low`. Both rejection causes are reported when both apply.
    pub fn validate(&self, record: &DocumentRecord) -> VerificationVerdict {
        let (document_kind, format_valid) = self.check_format(&record.id_number, &record.doc_type);
        let tamper_risk = TamperRisk::from_model(&record.tamper_risk);
        let accepted = format_valid && tamper_risk.is_low();

        let mut rejections = Vec::new();
        if !tamper_risk.is_low() {
            rejections.push(Rejection::TamperRisk {
                level: tamper_risk,
                model_reason: record.reason.clone(),
            });
        }
        if !format_valid {
            rejections.push(Rejection::FormatInvalid {
                doc_type: record.doc_type.clone(),
                note: format!(
                    "ID format for {} is structurally invalid",
                    record.doc_type
                ),
            });
        }

        let verdict = VerificationVerdict {
            format_valid,
            accepted,
            document_kind,
            tamper_risk,
            rejections,
            name: record.name.clone(),
            id_number: record.id_number.clone(),
            doc_type: record.doc_type.clone(),
            language: record.language.clone(),
            reason: record.reason.clone(),
        };

        tracing::info!(
            document_kind = document_kind.as_str(),
            format_valid,
            tamper_risk = %tamper_risk,
            accepted,
            format_note = verdict.format_note(),
            "Governance verdict"
        );

        verdict
    }
}
