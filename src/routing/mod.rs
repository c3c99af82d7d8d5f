//! Cost routing: query classification and usage accounting.
//!
//! Every outbound query is classified into one of four inference effort
//! tiers, each with a fixed price per token. Routing cheap queries to cheap
//! tiers cuts spend without touching quality on the queries that need it;
//! the ledger keeps the receipts.
//!
//! | Tier      | Price / 1M tokens | Multiplier vs high |
//! |-----------|-------------------|--------------------|
//! | `minimal` | $0.075            | 0.03               |
//! | `low`     | $0.15             | 0.06               |
//! | `medium`  | $1.25             | 0.50               |
//! | `high`    | $2.50             | 1.00               |

pub mod classifier;
pub mod ledger;

pub use classifier::{
    CostTier, QueryClassifier, QueryCost, QueryPriority, RoutingContext, RoutingExplanation,
};
pub use ledger::{Timeframe, TrendDelta, UsageEntry, UsageLedger, UsageSummary};
