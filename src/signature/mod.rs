//! Behavioral fingerprinting and baseline verification.
//!
//! Every agent develops a recognizable reasoning style. This module derives
//! a fixed-form fingerprint from each model response, maintains a bounded
//! per-agent history of those fingerprints, and scores new responses against
//! that history to flag abrupt stylistic shifts indicative of hijacking.
//!
//! # Components
//!
//! - [`fingerprint`]: pure fingerprint extraction/derivation
//! - [`baseline`]: per-agent bounded fingerprint windows and statistics
//! - [`verifier`]: similarity scoring and the accept/flag decision
//!
//! The fingerprint is a derived identifier, not a cryptographic proof; two
//! agents with genuinely identical output styles would be indistinguishable.

pub mod baseline;
pub mod fingerprint;
pub mod verifier;

pub use baseline::{AgentBaseline, BaselineStats, BaselineStore};
pub use fingerprint::{derive_fingerprint, extract_fingerprint};
pub use verifier::{
    BaselineInfo, BaselineStatus, BehaviorVerifier, ThreatLevel, Verification, VerifierStats,
};
