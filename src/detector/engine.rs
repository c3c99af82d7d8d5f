//! The attack detection engine.
//!
//! Orchestrates baseline verification, pattern matching and anomaly checks
//! into a single [`Verdict`] per interaction, maintains running counters and
//! a bounded ledger of recent flagged verdicts for dashboard queries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::patterns::{
    contains_prompt_leak, error_mentions_policy, match_attack_patterns, match_suspicious_keywords,
};
use super::threat::{Action, Severity, Threat, ThreatKind, Verdict};
use crate::config::DetectorConfig;
use crate::response::ModelResponse;
use crate::signature::{extract_fingerprint, BehaviorVerifier, ThreatLevel};

/// Running detector counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Interactions analyzed.
    pub analyzed: u64,
    /// Interactions with at least one threat.
    pub flagged: u64,
    /// Interactions blocked.
    pub blocked: u64,
    /// flagged / analyzed.
    pub detection_rate: f64,
    /// blocked / analyzed.
    pub block_rate: f64,
}

/// Multi-signal attack detector.
///
/// Shared process-wide by the surrounding service: all methods take `&self`
/// and the counters/ledger use interior mutability, so one instance can be
/// handed by `Arc` to every request task.
pub struct AttackDetector {
    verifier: Arc<BehaviorVerifier>,
    config: DetectorConfig,
    analyzed: AtomicU64,
    flagged: AtomicU64,
    blocked: AtomicU64,
    recent: Mutex<VecDeque<Verdict>>,
}

impl Default for AttackDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackDetector {
    /// Create a detector with its own verifier and default policy
    pub fn new() -> Self {
        Self::with_verifier(Arc::new(BehaviorVerifier::new()))
    }

    /// Create a detector sharing an externally-owned verifier
    pub fn with_verifier(verifier: Arc<BehaviorVerifier>) -> Self {
        Self {
            verifier,
            config: DetectorConfig::default(),
            analyzed: AtomicU64::new(0),
            flagged: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::new()),
        }
    }

    /// Override the detector configuration
    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// The behavior verifier backing signature checks
    pub fn verifier(&self) -> &Arc<BehaviorVerifier> {
        &self.verifier
    }

    /// Analyze one interaction and produce a verdict.
    ///
    /// All checks always run so the verdict carries the complete threat
    /// picture. Never fails: malformed or empty input degrades to fewer
    /// threats, and an upstream failure yields a distinguished
    /// [`ThreatKind::UpstreamError`] verdict with `action = Allow` — the
    /// layer degrades open on infrastructure faults unrelated to content.
    pub fn analyze(&self, agent_id: &str, message: &str, response: &ModelResponse) -> Verdict {
        self.analyzed.fetch_add(1, Ordering::Relaxed);
        let mut threats = Vec::new();

        // Check 1: fingerprint verification against the agent baseline
        if let Some(fingerprint) = extract_fingerprint(response) {
            let verification = self.verifier.verify(agent_id, &fingerprint);
            if let Some(severity) = mismatch_severity(verification.threat_level) {
                threats.push(Threat::new(
                    ThreatKind::SignatureMismatch,
                    severity,
                    format!(
                        "{} (match score {:.2})",
                        verification.reason, verification.match_score
                    ),
                ));
            }
        }

        // Check 2: known attack patterns in the message
        for pattern in match_attack_patterns(message) {
            threats.push(Threat::new(
                ThreatKind::InjectionPattern,
                Severity::High,
                format!("{}: {}", pattern.name, pattern.description),
            ));
        }

        // Check 3: suspicious keywords, severity scaled by match count
        let keywords = match_suspicious_keywords(message);
        if !keywords.is_empty() {
            let severity = match keywords.len() {
                1 => Severity::Low,
                2 => Severity::Medium,
                _ => Severity::High,
            };
            threats.push(Threat::new(
                ThreatKind::SuspiciousKeywords,
                severity,
                format!(
                    "found {} suspicious keywords: {}",
                    keywords.len(),
                    keywords.join(", ")
                ),
            ));
        }

        // Check 4: behavioral anomalies in the response content
        if !response.content.is_empty() {
            if response.content.len() > self.config.max_response_chars {
                threats.push(Threat::new(
                    ThreatKind::BehavioralAnomaly,
                    Severity::Medium,
                    format!("unusually long response: {} chars", response.content.len()),
                ));
            }

            if contains_prompt_leak(&response.content) {
                threats.push(Threat::new(
                    ThreatKind::BehavioralAnomaly,
                    Severity::High,
                    "response contains prompt-leak phrasing",
                ));
            }
        }

        // Check 5: response structure anomalies
        if let Some(error) = &response.error {
            if error_mentions_policy(error) {
                threats.push(Threat::new(
                    ThreatKind::ResponseAnomaly,
                    Severity::Medium,
                    "upstream refused content on policy grounds",
                ));
            }
        }

        if let Some(tokens) = response.reasoning_tokens {
            if tokens > self.config.max_reasoning_tokens {
                threats.push(Threat::new(
                    ThreatKind::ResponseAnomaly,
                    Severity::Low,
                    format!("unusually high reasoning token count: {tokens}"),
                ));
            }
        }

        if response.is_failed() {
            threats.push(Threat::new(
                ThreatKind::UpstreamError,
                Severity::Low,
                format!(
                    "upstream call failed: {}",
                    response.error.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        // An infrastructure fault on its own must not punish the user;
        // anything else detected alongside it keeps the normal policy.
        let sole_upstream =
            threats.len() == 1 && threats[0].kind == ThreatKind::UpstreamError;
        let (action, confidence) = if sole_upstream {
            (Action::Allow, 0.5)
        } else {
            (determine_action(&threats), calculate_confidence(&threats))
        };

        let verdict = Verdict {
            analysis_id: Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            is_safe: threats.is_empty(),
            threats,
            confidence,
            action,
            analyzed_at: chrono::Utc::now(),
        };

        if !verdict.is_safe {
            self.flagged.fetch_add(1, Ordering::Relaxed);
            if verdict.action == Action::Block {
                self.blocked.fetch_add(1, Ordering::Relaxed);
                warn!(
                    agent_id,
                    threats = verdict.threats.len(),
                    "interaction blocked"
                );
            }
            self.remember(verdict.clone());
        } else {
            debug!(agent_id, "interaction clean");
        }

        verdict
    }

    /// Recent flagged verdicts, most recent first, optionally per agent
    pub fn recent_threats(&self, limit: usize, agent_id: Option<&str>) -> Vec<Verdict> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent
            .iter()
            .rev()
            .filter(|v| agent_id.map_or(true, |id| v.agent_id == id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Running counters
    pub fn stats(&self) -> DetectorStats {
        let analyzed = self.analyzed.load(Ordering::Relaxed);
        let flagged = self.flagged.load(Ordering::Relaxed);
        let blocked = self.blocked.load(Ordering::Relaxed);

        DetectorStats {
            analyzed,
            flagged,
            blocked,
            detection_rate: flagged as f64 / analyzed.max(1) as f64,
            block_rate: blocked as f64 / analyzed.max(1) as f64,
        }
    }

    fn remember(&self, verdict: Verdict) {
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        if recent.len() == self.config.recent_threats_cap {
            recent.pop_front();
        }
        recent.push_back(verdict);
    }
}

/// Map a verifier threat level onto a threat severity, `None` meaning clean.
fn mismatch_severity(level: ThreatLevel) -> Option<Severity> {
    match level {
        ThreatLevel::None => None,
        ThreatLevel::Low => Some(Severity::Low),
        ThreatLevel::Medium => Some(Severity::Medium),
        ThreatLevel::High => Some(Severity::High),
    }
}

/// Ordered action policy: first matching rule wins.
fn determine_action(threats: &[Threat]) -> Action {
    if threats.is_empty() {
        return Action::Allow;
    }

    let high = threats
        .iter()
        .filter(|t| t.severity >= Severity::High)
        .count();
    let medium = threats
        .iter()
        .filter(|t| t.severity == Severity::Medium)
        .count();

    if high >= 1 || medium >= 2 {
        Action::Block
    } else {
        Action::Warn
    }
}

/// More threats mean more confidence in the assessment.
fn calculate_confidence(threats: &[Threat]) -> f64 {
    if threats.is_empty() {
        return 0.95;
    }

    let threat_bonus = (threats.len() as f64 * 0.1).min(0.35);
    let high_bonus = threats
        .iter()
        .filter(|t| t.severity >= Severity::High)
        .count() as f64
        * 0.05;

    (0.6 + threat_bonus + high_bonus).min(0.99)
}
