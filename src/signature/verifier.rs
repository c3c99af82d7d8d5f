//! Behavioral baseline verification.
//!
//! Scores a new fingerprint against an agent's recent history using a
//! weighted blend of three metrics: position-aligned character overlap,
//! character frequency distribution distance, and length similarity. The
//! blend favors structural and lexical consistency over exact match,
//! tolerating natural variance while still catching abrupt stylistic shifts.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::baseline::{AgentBaseline, BaselineStats, BaselineStore};
use crate::config::VerifierConfig;
use crate::error::{Result, ShieldError};

/// Recent window compared for character overlap.
const OVERLAP_WINDOW: usize = 20;

/// Recent window compared for frequency distance.
const FREQUENCY_WINDOW: usize = 10;

/// Threat level assessed from a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    /// Score within normal variance.
    None,
    /// Mild deviation.
    Low,
    /// Notable deviation.
    Medium,
    /// Severe deviation, likely hijack.
    High,
}

impl ThreatLevel {
    fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ThreatLevel::None
        } else if score >= 0.70 {
            ThreatLevel::Low
        } else if score >= 0.50 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::High
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::None => write!(f, "none"),
            ThreatLevel::Low => write!(f, "low"),
            ThreatLevel::Medium => write!(f, "medium"),
            ThreatLevel::High => write!(f, "high"),
        }
    }
}

/// Baseline maturity at verification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineStatus {
    /// Fewer samples than required; verification is skipped.
    Building,
    /// Enough samples to score against.
    Established,
}

/// Outcome of verifying one fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the fingerprint is accepted.
    pub is_valid: bool,
    /// Confidence in this verdict (0-1).
    pub confidence: f64,
    /// Assessed deviation severity.
    pub threat_level: ThreatLevel,
    /// Combined similarity score (0-1).
    pub match_score: f64,
    /// Human-readable explanation.
    pub reason: String,
    /// Baseline sample count after this verification.
    pub baseline_size: usize,
    /// Baseline maturity.
    pub baseline_status: BaselineStatus,
}

/// Baseline description for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineInfo {
    /// Agent identifier.
    pub agent_id: String,
    /// Fingerprints currently in the window.
    pub baseline_size: usize,
    /// Whether the baseline is established.
    pub established: bool,
    /// Aggregate window statistics.
    pub patterns: BaselineStats,
    /// Similarity threshold in force.
    pub deviation_threshold: f64,
}

/// Verifier counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierStats {
    /// Agents with a baseline.
    pub agents_tracked: usize,
    /// Total verifications performed.
    pub verifications: u64,
    /// Verifications that flagged a deviation.
    pub deviations: u64,
    /// deviations / verifications.
    pub deviation_rate: f64,
}

/// Verifies fingerprints against per-agent behavioral baselines.
///
/// Interior mutability throughout: one verifier is shared by reference across
/// concurrent callers. Each verification holds its agent's lock for the whole
/// read-score-append sequence, so concurrent verifications for the same agent
/// serialize while distinct agents proceed in parallel.
#[derive(Debug)]
pub struct BehaviorVerifier {
    store: BaselineStore,
    threshold: f64,
    min_samples: usize,
    verifications: AtomicU64,
    deviations: AtomicU64,
}

impl Default for BehaviorVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorVerifier {
    /// Create a verifier with default policy
    pub fn new() -> Self {
        Self::with_config(&VerifierConfig::default())
    }

    /// Create a verifier from configuration
    pub fn with_config(config: &VerifierConfig) -> Self {
        Self {
            store: BaselineStore::new(config.baseline_cap),
            threshold: config.deviation_threshold.clamp(0.0, 1.0),
            min_samples: config.min_samples.max(1),
            verifications: AtomicU64::new(0),
            deviations: AtomicU64::new(0),
        }
    }

    /// Similarity threshold in force
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Seed or replace an agent's baseline from historical fingerprints.
    ///
    /// Keeps the most recent `baseline_cap` entries and recomputes window
    /// statistics. Safe to call repeatedly. An empty slice is a precondition
    /// failure: proceeding would silently leave the baseline under-populated.
    pub fn build_baseline(&self, agent_id: &str, fingerprints: &[String]) -> Result<BaselineInfo> {
        if fingerprints.is_empty() {
            return Err(ShieldError::PreconditionFailed(format!(
                "cannot build baseline for {agent_id}: no fingerprints supplied"
            )));
        }

        let handle = self.store.agent(agent_id);
        let mut baseline = handle.lock().unwrap_or_else(|e| e.into_inner());
        baseline.seed(fingerprints);

        debug!(
            agent_id,
            baseline_size = baseline.len(),
            "baseline seeded"
        );

        Ok(BaselineInfo {
            agent_id: agent_id.to_string(),
            baseline_size: baseline.len(),
            established: baseline.is_established(self.min_samples),
            patterns: baseline.stats(),
            deviation_threshold: self.threshold,
        })
    }

    /// Verify a fingerprint against an agent's baseline.
    ///
    /// While the baseline is still building (fewer than `min_samples`
    /// entries) every fingerprint is accepted and appended unconditionally.
    /// This cold-start window is an intentional trust boundary: a brand-new
    /// agent id is trusted for its first few interactions regardless of
    /// content.
    pub fn verify(&self, agent_id: &str, fingerprint: &str) -> Verification {
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let handle = self.store.agent(agent_id);
        let mut baseline = handle.lock().unwrap_or_else(|e| e.into_inner());

        if !baseline.is_established(self.min_samples) {
            baseline.push(fingerprint.to_string());
            return Verification {
                is_valid: true,
                confidence: 0.5,
                threat_level: ThreatLevel::None,
                match_score: 1.0,
                reason: "new agent, baseline still building".to_string(),
                baseline_size: baseline.len(),
                baseline_status: BaselineStatus::Building,
            };
        }

        let match_score = combined_similarity(fingerprint, &baseline);
        let is_valid = match_score >= self.threshold;
        let threat_level = ThreatLevel::from_score(match_score);

        let baseline_size = baseline.len();
        let confidence =
            (0.5 + baseline_size as f64 / 200.0 + match_score * 0.3).min(0.99);

        let reason = if is_valid {
            format!("fingerprint matches baseline (score {match_score:.2})")
        } else {
            self.deviations.fetch_add(1, Ordering::Relaxed);
            warn!(agent_id, match_score, "fingerprint deviation detected");
            format!(
                "fingerprint deviates from baseline (score {match_score:.2}, threshold {:.2})",
                self.threshold
            )
        };

        // Only clean matches reinforce the baseline; a deviating sample must
        // never pollute the reference window.
        if is_valid && threat_level == ThreatLevel::None {
            baseline.push(fingerprint.to_string());
        }

        Verification {
            is_valid,
            confidence,
            threat_level,
            match_score,
            reason,
            baseline_size: baseline.len(),
            baseline_status: BaselineStatus::Established,
        }
    }

    /// Baseline description for an agent, if tracked
    pub fn baseline_info(&self, agent_id: &str) -> Option<BaselineInfo> {
        let handle = self.store.get(agent_id)?;
        let baseline = handle.lock().unwrap_or_else(|e| e.into_inner());

        Some(BaselineInfo {
            agent_id: agent_id.to_string(),
            baseline_size: baseline.len(),
            established: baseline.is_established(self.min_samples),
            patterns: baseline.stats(),
            deviation_threshold: self.threshold,
        })
    }

    /// Drop an agent's baseline entirely
    pub fn remove_agent(&self, agent_id: &str) -> bool {
        self.store.remove(agent_id)
    }

    /// Verifier counters
    pub fn stats(&self) -> VerifierStats {
        let verifications = self.verifications.load(Ordering::Relaxed);
        let deviations = self.deviations.load(Ordering::Relaxed);

        VerifierStats {
            agents_tracked: self.store.agent_count(),
            verifications,
            deviations,
            deviation_rate: deviations as f64 / verifications.max(1) as f64,
        }
    }
}

/// Weighted similarity of a fingerprint against a baseline window.
fn combined_similarity(fingerprint: &str, baseline: &AgentBaseline) -> f64 {
    if baseline.is_empty() {
        return 1.0;
    }

    let overlap: Vec<f64> = baseline
        .recent(OVERLAP_WINDOW)
        .map(|base| char_overlap(fingerprint, base))
        .collect();
    let avg_overlap = overlap.iter().sum::<f64>() / overlap.len() as f64;

    let new_freq = char_frequency(fingerprint);
    let freq: Vec<f64> = baseline
        .recent(FREQUENCY_WINDOW)
        .map(|base| frequency_similarity(&new_freq, &char_frequency(base)))
        .collect();
    let avg_freq = freq.iter().sum::<f64>() / freq.len() as f64;

    let length = length_similarity(fingerprint.len(), baseline.stats().avg_length);

    (avg_overlap * 0.4 + avg_freq * 0.4 + length * 0.2).clamp(0.0, 1.0)
}

/// Fraction of position-aligned matching characters.
fn char_overlap(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let matching = a
        .chars()
        .zip(b.chars())
        .filter(|(ca, cb)| ca == cb)
        .count();
    matching as f64 / longest as f64
}

/// Normalized character frequency distribution.
fn char_frequency(s: &str) -> HashMap<char, f64> {
    let total = s.chars().count();
    if total == 0 {
        return HashMap::new();
    }

    let mut counts: HashMap<char, f64> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0.0) += 1.0;
    }
    for value in counts.values_mut() {
        *value /= total as f64;
    }
    counts
}

/// Total-variation similarity of two frequency distributions.
fn frequency_similarity(a: &HashMap<char, f64>, b: &HashMap<char, f64>) -> f64 {
    let chars: std::collections::HashSet<&char> = a.keys().chain(b.keys()).collect();
    if chars.is_empty() {
        return 1.0;
    }

    let diff: f64 = chars
        .into_iter()
        .map(|c| (a.get(c).copied().unwrap_or(0.0) - b.get(c).copied().unwrap_or(0.0)).abs())
        .sum();
    1.0 - diff / 2.0
}

fn length_similarity(len: usize, avg_len: f64) -> f64 {
    let len = len as f64;
    let longest = len.max(avg_len);
    if longest == 0.0 {
        return 1.0;
    }
    1.0 - (len - avg_len).abs() / longest
}
