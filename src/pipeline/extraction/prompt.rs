/// Instruction sent alongside every document image.
///
/// The key names here are the contract with [`super::parser`].
pub const EXTRACTION_PROMPT: &str = r#"Identify this Indian identity document as either Aadhaar or PAN and extract its data.
Return ONLY a single JSON object, with no other text before or after it:
{
  "name": "Full Name",
  "id_num": "ID Number",
  "doc_type": "Aadhaar/PAN",
  "lang": "Detected Language",
  "tamper": "Low/Medium/High",
  "reason": "Note on authenticity"
}
"tamper" must be exactly one of Low, Medium or High."#;
