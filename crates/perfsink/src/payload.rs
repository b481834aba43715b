//! Submitted performance run payloads.
//!
//! A payload is whatever bytes the caller sent. The only check made on them is
//! whether they are well-formed JSON whose top-level value is not
//! empty-equivalent; the bytes that get stored are always the original ones.
//!
//! Validation goes through [`RawValue`], which scans the document without
//! building a tree or converting numbers. Deep nesting and out-of-range
//! numbers such as `1e400` are therefore accepted like any other JSON.

use serde_json::value::RawValue;

/// Deepest array/object nesting accepted. Anything deeper is dropped.
pub const MAX_DEPTH: usize = 512;

/// Why a payload was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The body is not syntactically valid JSON.
    Malformed,
    /// The body nests arrays or objects deeper than [`MAX_DEPTH`].
    TooDeep,
    /// The body is valid JSON but decodes to a null-like value.
    EmptyEquivalent,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed"),
            Self::TooDeep => write!(f, "too_deep"),
            Self::EmptyEquivalent => write!(f, "empty_equivalent"),
        }
    }
}

/// An accepted payload, borrowing the raw body it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload<'a> {
    raw: &'a [u8],
}

impl<'a> Payload<'a> {
    /// Check a raw body and wrap it if it is accepted.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] reason when the body is not valid JSON, nests
    /// too deep, or decodes to an empty-equivalent value.
    pub fn parse(raw: &'a [u8]) -> Result<Self, Rejection> {
        let value: &RawValue = serde_json::from_slice(raw).map_err(|_| Rejection::Malformed)?;
        let text = value.get();

        if nesting_depth(text) > MAX_DEPTH {
            return Err(Rejection::TooDeep);
        }
        if is_empty_equivalent(text) {
            return Err(Rejection::EmptyEquivalent);
        }
        Ok(Self { raw })
    }

    /// The original bytes, exactly as received.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    /// Length of the payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the payload has no bytes. Never true once `parse` accepted it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Whether a well-formed JSON document compares equal to null under loose
/// comparison.
///
/// Only the top-level token is inspected: `null`, `false`, numeric zero, `""`
/// and `[]` are null-like. `{}` is an object and `"0"` is a non-empty string,
/// so neither is. Numbers that underflow to zero (`1e-400`) count as zero.
#[must_use]
pub fn is_empty_equivalent(json: &str) -> bool {
    let json = json.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    match json.as_bytes().first() {
        Some(b'n' | b'f') => true,
        Some(b'"') => json == "\"\"",
        Some(b'[') => json[1..json.len() - 1]
            .trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
            .is_empty(),
        Some(b'-' | b'0'..=b'9') => json.parse::<f64>().is_ok_and(|n| n == 0.0),
        _ => false,
    }
}

/// Deepest array/object nesting of a well-formed JSON document.
fn nesting_depth(json: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}
