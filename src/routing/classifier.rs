//! Query complexity classification.
//!
//! An ordered rule cascade maps a query's lexical features to a cost tier:
//! explicit overrides first, then safety and complexity keywords, then
//! trivial-utterance patterns, then length and question-count heuristics.
//! First matching rule wins. The classifier is pure given its inputs; the
//! rule tables are static data compiled once.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ShieldError;

/// Inference effort tier, ordered cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    /// Simple facts, greetings.
    Minimal,
    /// Basic Q&A.
    Low,
    /// Multi-step reasoning.
    Medium,
    /// Complex reasoning, safety-critical.
    High,
}

impl CostTier {
    /// All tiers, cheapest first.
    pub const ALL: [CostTier; 4] = [
        CostTier::Minimal,
        CostTier::Low,
        CostTier::Medium,
        CostTier::High,
    ];

    /// Price in USD per million tokens
    pub const fn price_per_million(self) -> f64 {
        match self {
            CostTier::Minimal => 0.075,
            CostTier::Low => 0.15,
            CostTier::Medium => 1.25,
            CostTier::High => 2.50,
        }
    }

    /// Price in USD per thousand tokens
    pub fn price_per_1k(self) -> f64 {
        self.price_per_million() / 1000.0
    }

    /// Cost multiplier relative to [`CostTier::High`]
    pub const fn cost_multiplier(self) -> f64 {
        match self {
            CostTier::Minimal => 0.03,
            CostTier::Low => 0.06,
            CostTier::Medium => 0.50,
            CostTier::High => 1.00,
        }
    }

    /// Percentage saved versus running at the high tier
    pub fn savings_percent_vs_high(self) -> f64 {
        (1.0 - self.price_per_million() / CostTier::High.price_per_million()) * 100.0
    }

    /// Tier name
    pub fn as_str(self) -> &'static str {
        match self {
            CostTier::Minimal => "minimal",
            CostTier::Low => "low",
            CostTier::Medium => "medium",
            CostTier::High => "high",
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostTier {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(CostTier::Minimal),
            "low" => Ok(CostTier::Low),
            "medium" => Ok(CostTier::Medium),
            "high" => Ok(CostTier::High),
            other => Err(ShieldError::InvalidTier(other.to_string())),
        }
    }
}

/// Caller priority hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPriority {
    /// No special handling.
    Normal,
    /// Safety-relevant; always route to the high tier.
    Safety,
}

/// Optional per-query routing overrides.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoutingContext {
    /// Force a specific tier regardless of classification.
    pub force_tier: Option<CostTier>,
    /// Priority hint.
    pub priority: Option<QueryPriority>,
}

/// Explanation of one routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingExplanation {
    /// Chosen tier.
    pub tier: CostTier,
    /// Ordered, human-readable trigger descriptions.
    pub reasons: Vec<String>,
    /// Price in USD per thousand tokens at the chosen tier.
    pub price_per_1k: f64,
    /// Cost multiplier relative to the high tier.
    pub cost_multiplier: f64,
    /// Percentage saved versus the high tier.
    pub savings_percent_vs_high: f64,
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// Number of question marks.
    pub question_count: usize,
    /// Character count.
    pub char_count: usize,
}

/// Cost breakdown for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCost {
    /// Chosen tier.
    pub tier: CostTier,
    /// Tokens consumed.
    pub tokens: u64,
    /// Cost at the chosen tier.
    pub optimized_cost: f64,
    /// Cost had the query run at the high tier.
    pub naive_cost: f64,
    /// naive minus optimized.
    pub savings: f64,
    /// Savings as a percentage of the naive cost.
    pub savings_percent: f64,
}

/// Safety/security keywords that always route high
static SAFETY_KEYWORDS: &[&str] = &[
    "security",
    "attack",
    "malicious",
    "verify",
    "threat",
    "protect",
    "vulnerability",
    "exploit",
    "hack",
    "breach",
    "compliance",
    "audit",
];

/// Complex-task keywords that always route high
static COMPLEX_KEYWORDS: &[&str] = &[
    "design",
    "architect",
    "comprehensive",
    "analyze deeply",
    "write detailed",
    "develop strategy",
    "full implementation",
    "complex algorithm",
    "optimize system",
    "debug complex",
];

/// Reasoning keywords that suggest multi-step work
static REASONING_KEYWORDS: &[&str] = &[
    "compare",
    "explain",
    "analyze",
    "evaluate",
    "contrast",
    "pros and cons",
    "trade-offs",
    "alternatives",
    "best approach",
];

/// Trivial utterances routed to the minimal tier
static TRIVIAL_PATTERNS: &[&str] = &[
    r"(?i)^(hi|hello|hey|thanks|thank you|bye|goodbye)[\s!.?]*$",
    r"(?i)^(yes|no|ok|okay|sure|got it)[\s!.?]*$",
    r"(?i)^what (is|are) the (current |today's )?(time|date|weather)",
    r"(?i)^(convert|calculate) \d+",
];

fn keyword_regexes(keywords: &[&'static str]) -> Vec<Regex> {
    keywords
        .iter()
        .filter_map(|kw| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw))).ok())
        .collect()
}

lazy_static! {
    static ref SAFETY_REGEX: Vec<Regex> = keyword_regexes(SAFETY_KEYWORDS);
    static ref COMPLEX_REGEX: Vec<Regex> = keyword_regexes(COMPLEX_KEYWORDS);
    static ref REASONING_REGEX: Vec<Regex> = keyword_regexes(REASONING_KEYWORDS);
    static ref TRIVIAL_REGEX: Vec<Regex> = TRIVIAL_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
}

fn matches_any(regexes: &[Regex], query: &str) -> bool {
    regexes.iter().any(|r| r.is_match(query))
}

fn count_matches(regexes: &[Regex], query: &str) -> usize {
    regexes.iter().filter(|r| r.is_match(query)).count()
}

/// Rule-cascade query classifier.
#[derive(Debug, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    /// Create a classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify a query into a cost tier. First matching rule wins.
    pub fn classify(&self, query: &str, context: Option<&RoutingContext>) -> CostTier {
        if let Some(ctx) = context {
            if let Some(tier) = ctx.force_tier {
                return tier;
            }
            if ctx.priority == Some(QueryPriority::Safety) {
                return CostTier::High;
            }
        }

        if matches_any(&SAFETY_REGEX, query) {
            return CostTier::High;
        }

        if matches_any(&COMPLEX_REGEX, query) {
            return CostTier::High;
        }

        if matches_any(&TRIVIAL_REGEX, query) {
            return CostTier::Minimal;
        }

        let word_count = query.split_whitespace().count();
        if word_count < 5 {
            return CostTier::Minimal;
        }

        let question_count = query.matches('?').count();
        if question_count > 1 {
            return CostTier::Medium;
        }

        // One reasoning cue needs supporting length; several cues indicate
        // multi-step work regardless of length.
        let reasoning_hits = count_matches(&REASONING_REGEX, query);
        if (reasoning_hits > 0 && word_count > 15) || reasoning_hits >= 2 {
            return CostTier::Medium;
        }

        if word_count > 30 {
            return CostTier::Medium;
        }

        if word_count < 20 {
            return CostTier::Low;
        }

        CostTier::Low
    }

    /// Classify a query and report every trigger that contributed.
    ///
    /// The ordered reason list is part of the contract: callers surface it
    /// for transparency, it is not incidental logging.
    pub fn explain(&self, query: &str, context: Option<&RoutingContext>) -> RoutingExplanation {
        let tier = self.classify(query, context);
        let word_count = query.split_whitespace().count();
        let question_count = query.matches('?').count();

        let mut reasons = Vec::new();

        if let Some(ctx) = context {
            if let Some(forced) = ctx.force_tier {
                reasons.push(format!("tier forced to {forced} by caller"));
            } else if ctx.priority == Some(QueryPriority::Safety) {
                reasons.push("safety priority requested by caller".to_string());
            }
        }

        if matches_any(&SAFETY_REGEX, query) {
            reasons.push("safety-critical keywords detected".to_string());
        }
        if matches_any(&COMPLEX_REGEX, query) {
            reasons.push("complex task keywords detected".to_string());
        }
        if count_matches(&REASONING_REGEX, query) > 0 {
            reasons.push("reasoning/analysis keywords detected".to_string());
        }
        if question_count > 1 {
            reasons.push(format!("multiple questions detected ({question_count})"));
        }
        if matches_any(&TRIVIAL_REGEX, query) {
            reasons.push("matches trivial utterance pattern (greeting, acknowledgement)".to_string());
        }
        if word_count < 5 {
            reasons.push(format!("very short query ({word_count} words)"));
        } else if word_count < 15 {
            reasons.push(format!("short query ({word_count} words)"));
        } else if word_count > 30 {
            reasons.push(format!("long query ({word_count} words)"));
        }

        if reasons.is_empty() {
            reasons.push("standard query classification".to_string());
        }

        RoutingExplanation {
            tier,
            reasons,
            price_per_1k: tier.price_per_1k(),
            cost_multiplier: tier.cost_multiplier(),
            savings_percent_vs_high: tier.savings_percent_vs_high(),
            word_count,
            question_count,
            char_count: query.chars().count(),
        }
    }

    /// Cost breakdown for a query at its classified tier
    pub fn estimate_cost(
        &self,
        query: &str,
        tokens: u64,
        context: Option<&RoutingContext>,
    ) -> QueryCost {
        let tier = self.classify(query, context);
        let optimized_cost = tokens as f64 / 1000.0 * tier.price_per_1k();
        let naive_cost = tokens as f64 / 1000.0 * CostTier::High.price_per_1k();
        let savings = naive_cost - optimized_cost;

        QueryCost {
            tier,
            tokens,
            optimized_cost,
            naive_cost,
            savings,
            savings_percent: if naive_cost > 0.0 {
                savings / naive_cost * 100.0
            } else {
                0.0
            },
        }
    }
}
