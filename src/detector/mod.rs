//! Multi-signal attack detection for agent interactions.
//!
//! Fuses four independent signal sources into one allow/warn/block verdict:
//!
//! | Check                | Input            | Threat kind          |
//! |----------------------|------------------|----------------------|
//! | Baseline verification| response         | `SignatureMismatch`  |
//! | Attack patterns      | message          | `InjectionPattern`   |
//! | Suspicious keywords  | message          | `SuspiciousKeywords` |
//! | Behavioral anomalies | response content | `BehavioralAnomaly`  |
//! | Structure anomalies  | response fields  | `ResponseAnomaly`    |
//!
//! Every check always runs; none short-circuits the others, so a verdict
//! carries the complete threat picture rather than the first hit. The
//! detector is a best-effort heuristic classifier, not a formal security
//! boundary.

pub mod engine;
pub mod patterns;
pub mod threat;

pub use engine::{AttackDetector, DetectorStats};
pub use patterns::AttackPattern;
pub use threat::{Action, Severity, Threat, ThreatKind, Verdict};
