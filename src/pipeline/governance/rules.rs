//! Deterministic identifier format rules for Aadhaar and PAN.
//! Applied to whatever the model read, independently of the model's own judgment.

use std::sync::LazyLock;

use regex::Regex;

use super::types::DocumentKind;

/// 12 digits, first digit 2-9.
static AADHAAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[2-9][0-9]{11}$").unwrap());

/// 5 letters, 4 digits, 1 letter.
static PAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());

/// Strip whitespace and hyphens so printed groupings ("2345 6789 0123") compare strictly.
pub fn normalize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Classify a free-text document type by case-insensitive substring.
///
/// "aadhaar" is checked first, so a label mentioning both resolves to Aadhaar.
pub fn classify_doc_type(doc_type: &str) -> DocumentKind {
    let lowered = doc_type.to_lowercase();
    if lowered.contains("aadhaar") {
        DocumentKind::Aadhaar
    } else if lowered.contains("pan") {
        DocumentKind::Pan
    } else {
        DocumentKind::Unrecognized
    }
}

pub fn is_valid_aadhaar(normalized: &str) -> bool {
    AADHAAR_PATTERN.is_match(normalized)
}

pub fn is_valid_pan(normalized: &str) -> bool {
    PAN_PATTERN.is_match(&normalized.to_uppercase())
}

/// Apply the rule for `kind` to a raw identifier.
///
/// Returns `None` when no rule exists for the kind.
pub fn check_id_format(raw_id: &str, kind: DocumentKind) -> Option<bool> {
    let normalized = normalize_id(raw_id);
    match kind {
        DocumentKind::Aadhaar => Some(is_valid_aadhaar(&normalized)),
        DocumentKind::Pan => Some(is_valid_pan(&normalized)),
        DocumentKind::Unrecognized => None,
    }
}
