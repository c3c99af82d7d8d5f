//! Shield CLI binary.
//!
//! Trust decisions for LLM agent interactions.
//!
//! # Commands
//!
//! - `scan` - Analyze an interaction for attacks
//! - `classify` - Route a query to a cost tier
//! - `explain` - Explain a routing decision
//! - `fingerprint` - Derive a behavioral fingerprint from content

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shield::{
    derive_fingerprint, AttackDetector, ModelResponse, QueryClassifier, RoutingContext, VERSION,
};

#[derive(Parser)]
#[command(name = "shield")]
#[command(version = VERSION)]
#[command(about = "Shield Core - trust decisions for LLM agent interactions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an interaction for attacks
    Scan {
        /// Message sent to the agent (or - for stdin)
        message: Option<String>,

        /// Agent identifier
        #[arg(short, long, default_value = "cli-agent")]
        agent: String,

        /// Model response content
        #[arg(short, long)]
        response: Option<String>,

        /// JSON file with the full model response
        #[arg(long)]
        response_file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Route a query to a cost tier
    Classify {
        /// Query text (or - for stdin)
        query: Option<String>,

        /// Force a specific tier (minimal, low, medium, high)
        #[arg(short, long)]
        tier: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Explain a routing decision
    Explain {
        /// Query text (or - for stdin)
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Derive a behavioral fingerprint from content
    Fingerprint {
        /// Content (or - for stdin)
        content: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            message,
            agent,
            response,
            response_file,
            json,
        } => cmd_scan(message, &agent, response, response_file, json),
        Commands::Classify { query, tier, json } => cmd_classify(query, tier, json),
        Commands::Explain { query, json } => cmd_explain(query, json),
        Commands::Fingerprint { content } => cmd_fingerprint(content),
    }
}

/// Read input from argument or stdin (- convention)
fn read_input(input: Option<String>) -> Result<String> {
    match input {
        Some(ref s) if s == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf.trim().to_string())
        },
        Some(s) => Ok(s),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf.trim().to_string())
        },
    }
}

fn cmd_scan(
    message: Option<String>,
    agent: &str,
    response: Option<String>,
    response_file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let message = read_input(message)?;

    let model_response = if let Some(path) = response_file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse response file")?
    } else if let Some(content) = response {
        ModelResponse::from_content(content)
    } else {
        ModelResponse::default()
    };

    let detector = AttackDetector::new();
    let verdict = detector.analyze(agent, &message, &model_response);

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("Agent:      {agent}");
        println!("Safe:       {}", verdict.is_safe);
        println!("Action:     {}", verdict.action);
        println!("Confidence: {:.3}", verdict.confidence);

        if !verdict.threats.is_empty() {
            println!("Threats:");
            for threat in &verdict.threats {
                println!("  [{}] {}: {}", threat.severity, threat.kind, threat.detail);
            }
        }
    }

    Ok(())
}

fn cmd_classify(query: Option<String>, tier: Option<String>, json: bool) -> Result<()> {
    let query = read_input(query)?;

    let context = match tier {
        Some(name) => Some(RoutingContext {
            force_tier: Some(name.parse()?),
            priority: None,
        }),
        None => None,
    };

    let classifier = QueryClassifier::new();
    let tier = classifier.classify(&query, context.as_ref());

    if json {
        println!(
            "{}",
            serde_json::json!({
                "tier": tier,
                "price_per_1k": tier.price_per_1k(),
                "cost_multiplier": tier.cost_multiplier(),
            })
        );
    } else {
        println!("Tier:       {tier}");
        println!("Price/1k:   ${:.6}", tier.price_per_1k());
        println!("Multiplier: {:.2}", tier.cost_multiplier());
    }

    Ok(())
}

fn cmd_explain(query: Option<String>, json: bool) -> Result<()> {
    let query = read_input(query)?;

    let classifier = QueryClassifier::new();
    let explanation = classifier.explain(&query, None);

    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        println!("Tier:       {}", explanation.tier);
        println!("Price/1k:   ${:.6}", explanation.price_per_1k);
        println!("Savings:    {:.1}% vs high", explanation.savings_percent_vs_high);
        println!(
            "Query:      {} words, {} questions, {} chars",
            explanation.word_count, explanation.question_count, explanation.char_count
        );
        println!("Reasons:");
        for reason in &explanation.reasons {
            println!("  - {reason}");
        }
    }

    Ok(())
}

fn cmd_fingerprint(content: Option<String>) -> Result<()> {
    let content = read_input(content)?;
    println!("{}", derive_fingerprint(&content));
    Ok(())
}
