use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Document category resolved from the model's free-text `doc_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Aadhaar,
    Pan,
    Unrecognized,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aadhaar => "aadhaar",
            Self::Pan => "pan",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Tamper assessment reported by the model.
///
/// The model's output is untrusted: anything outside the three documented
/// levels maps to `Unrecognized`, which never counts as `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperRisk {
    Low,
    Medium,
    High,
    Unrecognized,
}

impl TamperRisk {
    /// Parse the model's label. Matching is exact and case-sensitive.
    pub fn from_model(raw: &str) -> Self {
        match raw {
            "Low" => Self::Low,
            "Medium" => Self::Medium,
            "High" => Self::High,
            _ => Self::Unrecognized,
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Self::Low)
    }
}

impl fmt::Display for TamperRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unrecognized => "Unrecognized",
        };
        f.write_str(label)
    }
}

/// What to do with identifiers whose document type is neither Aadhaar nor PAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTypePolicy {
    /// No rule applies, so the format check passes.
    #[default]
    Accept,
    /// No rule applies, so the identifier cannot be vouched for.
    Reject,
}

impl FromStr for UnknownTypePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(format!("expected `accept` or `reject`, got `{other}`")),
        }
    }
}

/// One independent cause for rejecting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// The model did not rate the tamper risk `Low`.
    TamperRisk {
        level: TamperRisk,
        model_reason: String,
    },
    /// The identifier does not fit the fixed format of its claimed type.
    FormatInvalid { doc_type: String, note: String },
}

/// Final governance decision for one extracted record.
///
/// Display fields are mirrored from the record so the verdict can be
/// rendered on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    pub format_valid: bool,
    pub accepted: bool,
    pub document_kind: DocumentKind,
    pub tamper_risk: TamperRisk,
    pub rejections: Vec<Rejection>,
    pub name: String,
    pub id_number: String,
    pub doc_type: String,
    pub language: String,
    pub reason: String,
}

impl VerificationVerdict {
    /// Note explaining a structural failure, if the format check failed.
    pub fn format_note(&self) -> Option<&str> {
        self.rejections.iter().find_map(|r| match r {
            Rejection::FormatInvalid { note, .. } => Some(note.as_str()),
            _ => None,
        })
    }
}
