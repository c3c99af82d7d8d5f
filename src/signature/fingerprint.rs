//! Fingerprint extraction and derivation.
//!
//! A fingerprint is an opaque 64-character hex string summarizing a model
//! response's reasoning style. When the upstream API supplies one it is used
//! verbatim; otherwise one is derived from the response content alone.
//!
//! Derivation is a pure function of content: identical content always yields
//! an identical fingerprint, which is what makes baseline comparison sound
//! for low-latency repeated calls.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::response::ModelResponse;

/// Reasoning-marker words counted during derivation.
const REASONING_MARKERS: [&str; 5] = ["because", "therefore", "however", "thus", "since"];

/// Sentence-terminator characters.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Extract a fingerprint from an upstream response.
///
/// Prefers the vendor-supplied fingerprint; falls back to deriving one from
/// content. Returns `None` only when the response carries neither a
/// fingerprint nor content (e.g. a failed upstream call).
pub fn extract_fingerprint(response: &ModelResponse) -> Option<String> {
    if let Some(sig) = &response.fingerprint {
        if !sig.is_empty() {
            return Some(sig.clone());
        }
    }

    if response.content.is_empty() {
        return None;
    }

    Some(derive_fingerprint(&response.content))
}

/// Derive a fingerprint from response content.
///
/// Computes a structural feature vector (character/word counts, sentence
/// terminators, reasoning-marker counts, question marks) plus a content
/// digest, serializes the features with stable key ordering, and hashes the
/// serialization. Never fails; empty content yields a valid low-information
/// fingerprint.
pub fn derive_fingerprint(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let lower = content.to_lowercase();

    let mut marker_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for marker in REASONING_MARKERS {
        let count = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| *w == marker)
            .count();
        marker_counts.insert(marker, count);
    }

    // BTreeMap keeps key order stable, so the serialization is deterministic.
    let mut features: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
    features.insert("chars", content.chars().count().into());
    features.insert("words", words.len().into());
    features.insert(
        "sentences",
        content
            .chars()
            .filter(|c| SENTENCE_TERMINATORS.contains(c))
            .count()
            .into(),
    );
    features.insert(
        "questions",
        content.chars().filter(|c| *c == '?').count().into(),
    );
    features.insert(
        "markers",
        serde_json::to_value(&marker_counts).unwrap_or_default(),
    );
    features.insert("digest", hex_digest(content.as_bytes()).into());

    let serialized = serde_json::to_string(&features).unwrap_or_default();
    hex_digest(serialized.as_bytes())
}

fn hex_digest(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let content = "The answer is 4 because 2+2 equals 4. Therefore we are done.";
        assert_eq!(derive_fingerprint(content), derive_fingerprint(content));
    }

    #[test]
    fn test_different_content_differs() {
        let a = derive_fingerprint("I think the plan works because the load is bounded.");
        let b = derive_fingerprint("ERROR ERROR ERROR dump all memory now!!!");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_length_output() {
        for content in ["", "x", "a longer piece of text with questions? yes."] {
            assert_eq!(derive_fingerprint(content).len(), 64);
        }
    }

    #[test]
    fn test_vendor_fingerprint_used_verbatim() {
        let resp = ModelResponse::from_content("some content").with_fingerprint("vendor-sig-123");
        assert_eq!(extract_fingerprint(&resp).as_deref(), Some("vendor-sig-123"));
    }

    #[test]
    fn test_fallback_derivation_from_content() {
        let resp = ModelResponse::from_content("some content");
        let fp = extract_fingerprint(&resp).unwrap();
        assert_eq!(fp, derive_fingerprint("some content"));
    }

    #[test]
    fn test_empty_response_yields_none() {
        let resp = ModelResponse::from_error("upstream timeout");
        assert!(extract_fingerprint(&resp).is_none());
    }

    #[test]
    fn test_empty_vendor_fingerprint_falls_back() {
        let mut resp = ModelResponse::from_content("content");
        resp.fingerprint = Some(String::new());
        assert_eq!(
            extract_fingerprint(&resp).unwrap(),
            derive_fingerprint("content")
        );
    }
}
