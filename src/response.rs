//! Upstream model response shape.
//!
//! The trust engine is transport-agnostic: whatever layer calls the upstream
//! LLM API hands the reply over in this form. Only the fields the decision
//! core inspects are modeled; everything else stays with the caller.

use serde::{Deserialize, Serialize};

/// A response from the upstream model API.
///
/// All fields besides `content` are optional. A missing fingerprint is
/// derived from content; a present `error` marks an upstream failure that
/// the detector degrades open on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Response text. Empty when the upstream call failed.
    #[serde(default)]
    pub content: String,

    /// Vendor-supplied reasoning fingerprint, used verbatim when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Reasoning token count reported by the upstream API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,

    /// Upstream error message, if the model call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    /// Create a response from plain content
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Create a failed-upstream response
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Attach a vendor-supplied fingerprint
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Attach a reasoning token count
    pub fn with_reasoning_tokens(mut self, tokens: u64) -> Self {
        self.reasoning_tokens = Some(tokens);
        self
    }

    /// True when the upstream call failed and produced no content
    pub fn is_failed(&self) -> bool {
        self.error.is_some() && self.content.is_empty()
    }
}
