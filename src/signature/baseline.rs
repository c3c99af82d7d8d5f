//! Per-agent baseline storage.
//!
//! Each agent owns a bounded window of recent fingerprints (oldest evicted
//! first) plus aggregate statistics. The store hands out per-agent handles so
//! a verification's read-score-append sequence can run atomically per agent
//! while different agents proceed in parallel.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

/// Default fingerprints retained per agent.
pub const DEFAULT_BASELINE_CAP: usize = 100;

/// Bounded fingerprint history for one agent.
#[derive(Debug)]
pub struct AgentBaseline {
    window: VecDeque<String>,
    cap: usize,
}

impl AgentBaseline {
    /// Create an empty baseline with the given window cap
    pub fn new(cap: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(cap.min(DEFAULT_BASELINE_CAP)),
            cap: cap.max(1),
        }
    }

    /// Append a fingerprint, evicting the oldest when full
    pub fn push(&mut self, fingerprint: String) {
        if self.window.len() == self.cap {
            self.window.pop_front();
        }
        self.window.push_back(fingerprint);
    }

    /// Replace the window with the most recent `cap` of the given fingerprints.
    ///
    /// Idempotent: seeding twice with the same input leaves the same window.
    pub fn seed(&mut self, fingerprints: &[String]) {
        self.window.clear();
        let skip = fingerprints.len().saturating_sub(self.cap);
        for fp in &fingerprints[skip..] {
            self.window.push_back(fp.clone());
        }
    }

    /// Number of fingerprints in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True when no fingerprints are stored
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// True once the window holds at least `min_samples` fingerprints
    pub fn is_established(&self, min_samples: usize) -> bool {
        self.window.len() >= min_samples
    }

    /// The most recent `n` fingerprints, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.window.len().saturating_sub(n);
        self.window.iter().skip(skip).map(String::as_str)
    }

    /// All fingerprints in the window, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.window.iter().map(String::as_str)
    }

    /// Aggregate statistics over the current window
    pub fn stats(&self) -> BaselineStats {
        let lengths: Vec<usize> = self.window.iter().map(String::len).collect();
        if lengths.is_empty() {
            return BaselineStats::default();
        }

        BaselineStats {
            avg_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
            min_length: lengths.iter().copied().min().unwrap_or(0),
            max_length: lengths.iter().copied().max().unwrap_or(0),
            sample_count: lengths.len(),
        }
    }
}

/// Aggregate statistics over a baseline window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Mean fingerprint length in the window.
    pub avg_length: f64,
    /// Shortest fingerprint length.
    pub min_length: usize,
    /// Longest fingerprint length.
    pub max_length: usize,
    /// Number of fingerprints in the window.
    pub sample_count: usize,
}

/// Owns all per-agent baselines.
///
/// Agents are created on first access and removed only by explicit request.
/// The handle returned by [`BaselineStore::agent`] is a per-agent lock:
/// holding it across a read-score-append sequence prevents lost updates
/// under concurrent verifications for the same agent.
#[derive(Debug)]
pub struct BaselineStore {
    agents: RwLock<HashMap<String, Arc<Mutex<AgentBaseline>>>>,
    cap: usize,
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_CAP)
    }
}

impl BaselineStore {
    /// Create a store with the given per-agent window cap
    pub fn new(cap: usize) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            cap,
        }
    }

    /// Get or create the baseline handle for an agent
    pub fn agent(&self, agent_id: &str) -> Arc<Mutex<AgentBaseline>> {
        if let Some(existing) = self
            .agents
            .read()
            .ok()
            .and_then(|map| map.get(agent_id).cloned())
        {
            return existing;
        }

        let mut map = self.agents.write().unwrap_or_else(|e| e.into_inner());
        map.entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AgentBaseline::new(self.cap))))
            .clone()
    }

    /// Get the baseline handle for an agent, if one exists
    pub fn get(&self, agent_id: &str) -> Option<Arc<Mutex<AgentBaseline>>> {
        self.agents
            .read()
            .ok()
            .and_then(|map| map.get(agent_id).cloned())
    }

    /// Remove an agent's baseline entirely
    pub fn remove(&self, agent_id: &str) -> bool {
        self.agents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(agent_id)
            .is_some()
    }

    /// Number of agents tracked
    pub fn agent_count(&self) -> usize {
        self.agents.read().map(|map| map.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("fp-{i:03}")).collect()
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut baseline = AgentBaseline::new(3);
        for fp in fps(5) {
            baseline.push(fp);
        }

        assert_eq!(baseline.len(), 3);
        let window: Vec<&str> = baseline.iter().collect();
        assert_eq!(window, vec!["fp-002", "fp-003", "fp-004"]);
    }

    #[test]
    fn test_seed_keeps_most_recent() {
        let mut baseline = AgentBaseline::new(3);
        baseline.seed(&fps(10));

        assert_eq!(baseline.len(), 3);
        let window: Vec<&str> = baseline.iter().collect();
        assert_eq!(window, vec!["fp-007", "fp-008", "fp-009"]);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut baseline = AgentBaseline::new(5);
        let input = fps(4);
        baseline.seed(&input);
        baseline.seed(&input);

        assert_eq!(baseline.len(), 4);
        assert_eq!(baseline.stats().sample_count, 4);
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut baseline = AgentBaseline::new(10);
        for fp in fps(6) {
            baseline.push(fp);
        }

        let tail: Vec<&str> = baseline.recent(2).collect();
        assert_eq!(tail, vec!["fp-004", "fp-005"]);
    }

    #[test]
    fn test_stats() {
        let mut baseline = AgentBaseline::new(10);
        baseline.push("ab".to_string());
        baseline.push("abcd".to_string());

        let stats = baseline.stats();
        assert_eq!(stats.sample_count, 2);
        assert_eq!(stats.min_length, 2);
        assert_eq!(stats.max_length, 4);
        assert!((stats.avg_length - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_store_creates_on_first_access() {
        let store = BaselineStore::default();
        assert_eq!(store.agent_count(), 0);
        assert!(store.get("agent-1").is_none());

        let handle = store.agent("agent-1");
        handle.lock().unwrap().push("fp".to_string());

        assert_eq!(store.agent_count(), 1);
        assert_eq!(store.get("agent-1").unwrap().lock().unwrap().len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let store = BaselineStore::default();
        store.agent("agent-1");

        assert!(store.remove("agent-1"));
        assert!(!store.remove("agent-1"));
        assert_eq!(store.agent_count(), 0);
    }
}
