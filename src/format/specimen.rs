//! Specimen number canonicalization.
//!
//! The canonical display form keeps the identifier's ASCII alphanumerics,
//! upper-cased, in dash-separated blocks of four: `ab12cd34ef` becomes
//! `AB12-CD34-EF`. Canonical output maps to itself.

use super::{FormatError, value_kind};
use serde_json::Value;

/// Characters per display block
pub const BLOCK_LEN: usize = 4;
pub const BLOCK_SEPARATOR: char = '-';

/// Canonical form of a textual identifier, `None` when it holds no
/// alphanumerics at all
pub fn canonical_specimen_number(raw: &str) -> Option<String> {
    let chars: Vec<char> = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if chars.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(chars.len() + chars.len() / BLOCK_LEN);
    for (i, block) in chars.chunks(BLOCK_LEN).enumerate() {
        if i > 0 {
            out.push(BLOCK_SEPARATOR);
        }
        out.extend(block);
    }
    Some(out)
}

pub(crate) fn try_specimen_number(value: &Value) -> Result<String, FormatError> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(FormatError::UnsupportedInput {
                kind: value_kind(other),
            });
        }
    };
    canonical_specimen_number(&raw).ok_or(FormatError::NoCanonicalForm { text: raw })
}
