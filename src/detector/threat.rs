//! Typed threat and verdict model.
//!
//! Threats are tagged variants rather than loose key/value maps so the
//! severity policy in the engine stays exhaustive and statically checked.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of signal produced a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    /// Response fingerprint deviates from the agent's baseline.
    SignatureMismatch,
    /// Message matched a known attack pattern.
    InjectionPattern,
    /// Message contains suspicious keywords.
    SuspiciousKeywords,
    /// Response content behaves anomalously (length, prompt leak).
    BehavioralAnomaly,
    /// Response structure is anomalous (policy refusal, token counts).
    ResponseAnomaly,
    /// Upstream model call failed; content unavailable.
    UpstreamError,
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatKind::SignatureMismatch => write!(f, "signature_mismatch"),
            ThreatKind::InjectionPattern => write!(f, "injection_pattern"),
            ThreatKind::SuspiciousKeywords => write!(f, "suspicious_keywords"),
            ThreatKind::BehavioralAnomaly => write!(f, "behavioral_anomaly"),
            ThreatKind::ResponseAnomaly => write!(f, "response_anomaly"),
            ThreatKind::UpstreamError => write!(f, "upstream_error"),
        }
    }
}

/// Threat severity, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, noteworthy on its own.
    Low,
    /// Suspicious, warrants a warning.
    Medium,
    /// Strong attack indicator.
    High,
    /// Reserved for externally-asserted critical findings.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Action the caller should take for an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Let the interaction through.
    Allow,
    /// Let it through, but surface a warning.
    Warn,
    /// Reject the interaction.
    Block,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => write!(f, "allow"),
            Action::Warn => write!(f, "warn"),
            Action::Block => write!(f, "block"),
        }
    }
}

/// A single detected threat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    /// Signal source.
    pub kind: ThreatKind,
    /// Assessed severity.
    pub severity: Severity,
    /// Human-readable detail.
    pub detail: String,
    /// Detection timestamp.
    pub detected_at: DateTime<Utc>,
}

impl Threat {
    /// Create a threat stamped with the current time
    pub fn new(kind: ThreatKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            detail: detail.into(),
            detected_at: Utc::now(),
        }
    }
}

/// Complete outcome of one interaction analysis.
///
/// Computed once, never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Unique analysis identifier.
    pub analysis_id: String,
    /// Agent the interaction belongs to.
    pub agent_id: String,
    /// True when no threats were detected.
    pub is_safe: bool,
    /// Detected threats, in check order.
    pub threats: Vec<Threat>,
    /// Confidence in the assessment (0-1).
    pub confidence: f64,
    /// Recommended action.
    pub action: Action,
    /// Analysis timestamp.
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    /// Highest severity present, if any threats were detected
    pub fn max_severity(&self) -> Option<Severity> {
        self.threats.iter().map(|t| t.severity).max()
    }

    /// Number of threats at or above a severity
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.threats.iter().filter(|t| t.severity >= severity).count()
    }
}
