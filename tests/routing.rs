//! End-to-end cost routing and usage accounting tests.

use shield::routing::classifier::QueryPriority;
use shield::{CostTier, QueryClassifier, RoutingContext, Timeframe, UsageLedger};

/// Classification fixtures covering every cascade rule
#[test]
fn test_classification_fixtures() {
    let classifier = QueryClassifier::new();

    let cases = [
        ("Hi!", CostTier::Minimal),
        ("Thanks!", CostTier::Minimal),
        ("sure", CostTier::Minimal),
        ("resize the image", CostTier::Minimal),
        (
            "Design a comprehensive security architecture with full audit trails.",
            CostTier::High,
        ),
        ("Could this be an attack vector?", CostTier::High),
        (
            "Compare the pros and cons of microservices versus monolith architecture, \
             including trade-offs for each.",
            CostTier::Medium,
        ),
        (
            "What broke? When did it break? Who was on call at the time?",
            CostTier::Medium,
        ),
        (
            "List every configuration file the service reads at startup",
            CostTier::Low,
        ),
    ];

    for (query, expected) in cases {
        assert_eq!(
            classifier.classify(query, None),
            expected,
            "query: {query}"
        );
    }
}

/// Context overrides beat every content rule
#[test]
fn test_context_overrides() {
    let classifier = QueryClassifier::new();

    let forced = RoutingContext {
        force_tier: Some(CostTier::Low),
        priority: None,
    };
    assert_eq!(
        classifier.classify("Design a comprehensive audit system", Some(&forced)),
        CostTier::Low
    );

    let safety = RoutingContext {
        force_tier: None,
        priority: Some(QueryPriority::Safety),
    };
    assert_eq!(classifier.classify("Hi!", Some(&safety)), CostTier::High);
}

/// Every explanation carries reasons and query stats
#[test]
fn test_explanations_are_complete() {
    let classifier = QueryClassifier::new();

    let queries = [
        "Hi!",
        "Is this endpoint vulnerable to an attack?",
        "Compare the two caching strategies in detail please",
        "summarize the incident report from last Tuesday morning for me",
    ];

    for query in queries {
        let explanation = classifier.explain(query, None);
        assert!(!explanation.reasons.is_empty(), "no reasons for: {query}");
        assert_eq!(explanation.char_count, query.chars().count());
        assert_eq!(
            explanation.word_count,
            query.split_whitespace().count()
        );
        assert!(explanation.price_per_1k > 0.0);
    }
}

/// Cost identities hold exactly for every tier
#[test]
fn test_cost_identities_per_tier() {
    let ledger = UsageLedger::new();

    for tier in CostTier::ALL {
        let entry = ledger.record(tier, 1_000);

        let expected = entry.naive_cost * tier.price_per_1k() / CostTier::High.price_per_1k();
        assert!(
            (entry.optimized_cost - expected).abs() < 1e-12,
            "tier {tier}: optimized {} != {expected}",
            entry.optimized_cost
        );
        assert!((entry.savings - (entry.naive_cost - entry.optimized_cost)).abs() < 1e-15);
    }
}

/// Overflowing the ledger trims to exactly the most recent half
#[test]
fn test_ledger_trims_to_recent_half() {
    let ledger = UsageLedger::new();

    for i in 0..10_001u64 {
        ledger.record(CostTier::Low, i);
    }

    assert_eq!(ledger.len(), 5_000);

    // Lifetime totals are unaffected by the trim
    let totals = ledger.totals();
    assert_eq!(totals.queries, 10_001);

    // Oldest evicted first: only the most recent half remains, so the
    // retained window sums to the token counts 5001..=10000
    let summary = ledger.summarize(Timeframe::All);
    assert_eq!(summary.queries, 5_000);
}

/// Summaries aggregate, break down by tier and report trends
#[test]
fn test_summaries() {
    let ledger = UsageLedger::new();

    ledger.record(CostTier::Minimal, 1_000);
    ledger.record(CostTier::Low, 2_000);
    ledger.record(CostTier::Low, 2_000);
    ledger.record(CostTier::High, 4_000);

    let today = ledger.summarize(Timeframe::Today);
    assert_eq!(today.queries, 4);
    assert_eq!(today.tier_breakdown[&CostTier::Low].count, 2);
    assert_eq!(today.tier_breakdown[&CostTier::High].count, 1);
    assert!(today.savings > 0.0);

    // All fresh entries fall in the current window; the prior window is empty
    let trend = today.trend.expect("bounded timeframe has a trend");
    assert_eq!(trend.queries_delta, 4);
    assert!(trend.savings_delta > 0.0);

    let all = ledger.summarize(Timeframe::All);
    assert_eq!(all.queries, 4);
    assert!(all.trend.is_none());

    // High-tier-only usage saves nothing
    let high_only = UsageLedger::new();
    high_only.record(CostTier::High, 1_000);
    let summary = high_only.summarize(Timeframe::Today);
    assert!(summary.savings.abs() < 1e-15);
    assert!(summary.savings_percent.abs() < 1e-9);
}

/// Timeframes parse case-insensitively
#[test]
fn test_timeframe_parsing() {
    for (name, expected) in [
        ("today", Timeframe::Today),
        ("Week", Timeframe::Week),
        ("MONTH", Timeframe::Month),
        ("all", Timeframe::All),
    ] {
        assert_eq!(name.parse::<Timeframe>().unwrap(), expected);
    }

    assert!("yesterday".parse::<Timeframe>().is_err());
}

/// Classifier and ledger compose into the routing flow
#[test]
fn test_classify_then_record_flow() {
    let classifier = QueryClassifier::new();
    let ledger = UsageLedger::new();

    let queries = [
        ("Hi!", 50u64),
        ("Explain the difference between optimistic and pessimistic locking in databases today", 900),
        ("Audit the login flow for vulnerabilities", 2_000),
    ];

    for (query, tokens) in queries {
        let tier = classifier.classify(query, None);
        ledger.record(tier, tokens);
    }

    let summary = ledger.summarize(Timeframe::All);
    assert_eq!(summary.queries, 3);
    assert!(summary.tier_breakdown.contains_key(&CostTier::Minimal));
    assert!(summary.tier_breakdown.contains_key(&CostTier::High));
    // Routing the cheap queries down saved money vs all-high
    assert!(summary.savings > 0.0);
}
