//! In-memory usage accounting.
//!
//! Append-only record of classified queries with cost/savings bookkeeping.
//! A bounded ring, not a database: once the ledger exceeds its cap it is
//! trimmed back to the most recent half, amortized rather than per-insert.
//! Durable persistence belongs to the surrounding CRUD layer.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::CostTier;
use crate::config::RoutingConfig;
use crate::error::ShieldError;

/// Summary window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Last 24 hours.
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Everything retained.
    All,
}

impl Timeframe {
    /// Window length, `None` for [`Timeframe::All`]
    fn window(self) -> Option<Duration> {
        match self {
            Timeframe::Today => Some(Duration::days(1)),
            Timeframe::Week => Some(Duration::weeks(1)),
            Timeframe::Month => Some(Duration::days(30)),
            Timeframe::All => None,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Today => write!(f, "today"),
            Timeframe::Week => write!(f, "week"),
            Timeframe::Month => write!(f, "month"),
            Timeframe::All => write!(f, "all"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Timeframe::Today),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "all" => Ok(Timeframe::All),
            other => Err(ShieldError::InvalidTimeframe(other.to_string())),
        }
    }
}

/// One recorded query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Tier the query ran at.
    pub tier: CostTier,
    /// Tokens consumed.
    pub tokens: u64,
    /// Cost at the routed tier.
    pub optimized_cost: f64,
    /// Cost had the query run at the high tier.
    pub naive_cost: f64,
    /// naive minus optimized.
    pub savings: f64,
    /// Recording time.
    pub timestamp: DateTime<Utc>,
}

/// Per-tier aggregate inside a summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierUsage {
    /// Queries recorded at this tier.
    pub count: u64,
    /// Optimized cost total at this tier.
    pub cost: f64,
}

/// Change versus the prior equal-length window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendDelta {
    /// Query count change.
    pub queries_delta: i64,
    /// Savings change in USD.
    pub savings_delta: f64,
}

/// Aggregated usage for one timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Window the summary covers.
    pub timeframe: Timeframe,
    /// Queries inside the window.
    pub queries: u64,
    /// Total optimized cost.
    pub optimized_cost: f64,
    /// Total naive (all-high) cost.
    pub naive_cost: f64,
    /// Total savings.
    pub savings: f64,
    /// Savings as a percentage of the naive cost.
    pub savings_percent: f64,
    /// Per-tier breakdown.
    pub tier_breakdown: BTreeMap<CostTier, TierUsage>,
    /// Change vs the prior window, `None` for [`Timeframe::All`].
    pub trend: Option<TrendDelta>,
}

/// Lifetime totals, unaffected by trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Queries ever recorded.
    pub queries: u64,
    /// Total optimized cost.
    pub optimized_cost: f64,
    /// Total naive cost.
    pub naive_cost: f64,
    /// Total savings.
    pub savings: f64,
    /// Savings as a percentage of the naive cost.
    pub savings_percent: f64,
}

#[derive(Debug, Default)]
struct LedgerInner {
    entries: Vec<UsageEntry>,
    total_optimized: f64,
    total_naive: f64,
    recorded: u64,
}

/// Bounded in-memory usage ledger.
///
/// Interior mutability so one ledger can be shared by reference across
/// concurrent request tasks; every operation takes the single inner lock.
#[derive(Debug)]
pub struct UsageLedger {
    inner: Mutex<LedgerInner>,
    cap: usize,
    retain: usize,
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageLedger {
    /// Create a ledger with default retention
    pub fn new() -> Self {
        Self::with_config(&RoutingConfig::default())
    }

    /// Create a ledger from configuration
    pub fn with_config(config: &RoutingConfig) -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
            cap: config.usage_cap.max(1),
            retain: config.usage_retain.min(config.usage_cap).max(1),
        }
    }

    /// Record one classified query
    pub fn record(&self, tier: CostTier, tokens: u64) -> UsageEntry {
        let optimized_cost = tokens as f64 / 1000.0 * tier.price_per_1k();
        let naive_cost = tokens as f64 / 1000.0 * CostTier::High.price_per_1k();

        let entry = UsageEntry {
            tier,
            tokens,
            optimized_cost,
            naive_cost,
            savings: naive_cost - optimized_cost,
            timestamp: Utc::now(),
        };

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.total_optimized += optimized_cost;
        inner.total_naive += naive_cost;
        inner.recorded += 1;
        inner.entries.push(entry.clone());

        if inner.entries.len() > self.cap {
            let drop = inner.entries.len() - self.retain;
            inner.entries.drain(..drop);
            debug!(retained = self.retain, "usage ledger trimmed");
        }

        entry
    }

    /// Entries currently retained
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.entries.len())
            .unwrap_or(0)
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate retained usage over a timeframe
    pub fn summarize(&self, timeframe: Timeframe) -> UsageSummary {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();

        let cutoff = timeframe.window().map(|w| now - w);
        let in_window = |entry: &&UsageEntry| cutoff.map_or(true, |c| entry.timestamp > c);

        let mut queries = 0u64;
        let mut optimized_cost = 0.0;
        let mut naive_cost = 0.0;
        let mut tier_breakdown: BTreeMap<CostTier, TierUsage> = BTreeMap::new();

        for entry in inner.entries.iter().filter(in_window) {
            queries += 1;
            optimized_cost += entry.optimized_cost;
            naive_cost += entry.naive_cost;

            let bucket = tier_breakdown.entry(entry.tier).or_default();
            bucket.count += 1;
            bucket.cost += entry.optimized_cost;
        }

        let savings = naive_cost - optimized_cost;

        // Prior equal-length window, for trend reporting
        let trend = timeframe.window().map(|w| {
            let (start, end) = (now - w - w, now - w);
            let mut prior_queries = 0i64;
            let mut prior_savings = 0.0;
            for entry in &inner.entries {
                if entry.timestamp > start && entry.timestamp <= end {
                    prior_queries += 1;
                    prior_savings += entry.savings;
                }
            }

            TrendDelta {
                queries_delta: queries as i64 - prior_queries,
                savings_delta: savings - prior_savings,
            }
        });

        UsageSummary {
            timeframe,
            queries,
            optimized_cost,
            naive_cost,
            savings,
            savings_percent: if naive_cost > 0.0 {
                savings / naive_cost * 100.0
            } else {
                0.0
            },
            tier_breakdown,
            trend,
        }
    }

    /// Lifetime totals, independent of trimming
    pub fn totals(&self) -> LedgerTotals {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let savings = inner.total_naive - inner.total_optimized;

        LedgerTotals {
            queries: inner.recorded,
            optimized_cost: inner.total_optimized,
            naive_cost: inner.total_naive,
            savings,
            savings_percent: if inner.total_naive > 0.0 {
                savings / inner.total_naive * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cost_math() {
        let ledger = UsageLedger::new();

        for tier in CostTier::ALL {
            let entry = ledger.record(tier, 1_000);
            let expected_optimized =
                entry.naive_cost * tier.price_per_1k() / CostTier::High.price_per_1k();
            assert!((entry.optimized_cost - expected_optimized).abs() < 1e-12);
            assert!((entry.savings - (entry.naive_cost - entry.optimized_cost)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_high_tier_saves_nothing() {
        let ledger = UsageLedger::new();
        let entry = ledger.record(CostTier::High, 5_000);
        assert!(entry.savings.abs() < 1e-15);
    }

    #[test]
    fn test_trim_keeps_most_recent() {
        let config = RoutingConfig {
            usage_cap: 10,
            usage_retain: 5,
        };
        let ledger = UsageLedger::with_config(&config);

        for i in 0..11 {
            ledger.record(CostTier::Low, i);
        }

        assert_eq!(ledger.len(), 5);
        // Lifetime totals survive the trim
        assert_eq!(ledger.totals().queries, 11);
    }

    #[test]
    fn test_summary_aggregates() {
        let ledger = UsageLedger::new();
        ledger.record(CostTier::Minimal, 1_000);
        ledger.record(CostTier::Minimal, 1_000);
        ledger.record(CostTier::High, 2_000);

        let summary = ledger.summarize(Timeframe::Today);
        assert_eq!(summary.queries, 3);
        assert_eq!(summary.tier_breakdown[&CostTier::Minimal].count, 2);
        assert_eq!(summary.tier_breakdown[&CostTier::High].count, 1);
        assert!(summary.savings > 0.0);
        assert!(summary.savings_percent > 0.0 && summary.savings_percent < 100.0);

        // Fresh entries all land in the current window
        let trend = summary.trend.unwrap();
        assert_eq!(trend.queries_delta, 3);
    }

    #[test]
    fn test_summary_all_has_no_trend() {
        let ledger = UsageLedger::new();
        ledger.record(CostTier::Low, 100);

        let summary = ledger.summarize(Timeframe::All);
        assert_eq!(summary.queries, 1);
        assert!(summary.trend.is_none());
    }

    #[test]
    fn test_empty_summary() {
        let ledger = UsageLedger::new();
        let summary = ledger.summarize(Timeframe::Week);

        assert_eq!(summary.queries, 0);
        assert!(summary.tier_breakdown.is_empty());
        assert!((summary.savings_percent).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("today".parse::<Timeframe>().unwrap(), Timeframe::Today);
        assert_eq!("WEEK".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert!("quarter".parse::<Timeframe>().is_err());
    }
}
