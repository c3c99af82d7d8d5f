//! Attack signature patterns for rule-based detection.
//!
//! Contains regex patterns for detecting common attack phrasings:
//! - Instruction override
//! - Jailbreak personas
//! - Hidden/system-token injection markers
//! - Role manipulation
//! - Invisible Unicode controls
//! - System prompt extraction
//!
//! The tables are static configuration data, compiled once on first use and
//! testable independently of the detection engine.

use lazy_static::lazy_static;
use regex::Regex;

/// An attack signature pattern
#[derive(Debug, Clone)]
pub struct AttackPattern {
    /// Pattern name
    pub name: &'static str,
    /// Regex pattern
    pub pattern: &'static str,
    /// Description
    pub description: &'static str,
}

/// Instruction-override phrasing
pub static OVERRIDE_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "ignore_instructions",
        pattern: r"(?i)ignore\s+(?:(?:previous|all|prior|your|the|any)\s+)*(instructions|prompts|rules|guidelines)",
        description: "Attempts to override system instructions",
    },
    AttackPattern {
        name: "forget_instructions",
        pattern: r"(?i)forget\s+(everything|all|your\s+instructions|what\s+you)",
        description: "Attempts to make the model forget constraints",
    },
    AttackPattern {
        name: "disregard_instructions",
        pattern: r"(?i)disregard\s+(?:(?:your|the|all|any)\s+)*(rules|instructions|guidelines)",
        description: "Attempts to disregard the system prompt",
    },
    AttackPattern {
        name: "do_not_follow",
        pattern: r"(?i)do\s+not\s+follow\s+(your|the|previous)",
        description: "Instructs the model to abandon prior rules",
    },
    AttackPattern {
        name: "stop_behavior",
        pattern: r"(?i)stop\s+(following|being|acting)",
        description: "Instructs the model to drop its configured behavior",
    },
];

/// Jailbreak persona phrasing
pub static JAILBREAK_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "persona_swap",
        pattern: r"(?i)you\s+are\s+(now|going\s+to\s+be)?\s*(DAN|jailbroken|unrestricted|evil|unfiltered)",
        description: "Assigns an unrestricted persona",
    },
    AttackPattern {
        name: "pretend_mode",
        pattern: r"(?i)pretend\s+(you('re)?|that\s+you|to\s+be)",
        description: "Pretend/roleplay bypass framing",
    },
    AttackPattern {
        name: "act_as",
        pattern: r"(?i)act\s+(as|like)\s+(if|though|a|an)?",
        description: "Act-as bypass framing",
    },
    AttackPattern {
        name: "imagine_framing",
        pattern: r"(?i)imagine\s+you\s+(are|were|have)",
        description: "Hypothetical framing to sidestep constraints",
    },
    AttackPattern {
        name: "roleplay_request",
        pattern: r"(?i)roleplay\s+as",
        description: "Explicit roleplay request",
    },
    AttackPattern {
        name: "from_now_on",
        pattern: r"(?i)from\s+now\s+on\s+you",
        description: "Persistent behavior override",
    },
    AttackPattern {
        name: "dan_mode",
        pattern: r"(?i)DAN\s+(mode|can|has|is)|do\s+anything\s+now",
        description: "DAN (Do Anything Now) jailbreak",
    },
];

/// Hidden instruction / system-token markers
pub static MARKER_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "special_tokens",
        pattern: r"<\|.*?\|>",
        description: "Special token delimiters in user text",
    },
    AttackPattern {
        name: "bracket_injection",
        pattern: r"\[\[.*?\]\]",
        description: "Double-bracket instruction injection",
    },
    AttackPattern {
        name: "prompt_markers",
        pattern: r"(?i)###\s*(SYSTEM|USER|ASSISTANT)",
        description: "Conversation role markers in user text",
    },
    AttackPattern {
        name: "code_block_injection",
        pattern: r"(?i)```(system|prompt|instruction)",
        description: "Code-fence system prompt injection",
    },
    AttackPattern {
        name: "xml_system_tags",
        pattern: r"(?i)<(system|s|SYS)>",
        description: "XML-style system tags",
    },
];

/// Role-manipulation phrasing
pub static ROLE_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "new_persona",
        pattern: r"(?i)new\s+(persona|role|character|mode)\s*:",
        description: "Declares a replacement persona",
    },
    AttackPattern {
        name: "switch_mode",
        pattern: r"(?i)switch\s+to\s+(mode|character|persona|role)",
        description: "Requests a mode/persona switch",
    },
    AttackPattern {
        name: "override_policy",
        pattern: r"(?i)override\s+(safety|content|your)?\s*(policy|rules|guidelines)",
        description: "Requests a policy override",
    },
    AttackPattern {
        name: "privileged_mode",
        pattern: r"(?i)enter\s+(developer|admin|debug|god)\s+mode",
        description: "Fake privileged mode activation",
    },
    AttackPattern {
        name: "test_session_claim",
        pattern: r"(?i)this\s+is\s+(a|an)\s+(test|debug|admin)\s+(mode|session)",
        description: "Claims a privileged test session",
    },
    AttackPattern {
        name: "admin_override",
        pattern: r"(?i)admin\s+(override|access|mode|command)|(sudo|root)\s+",
        description: "Admin/root privilege phrasing",
    },
];

/// Invisible Unicode controls
pub static UNICODE_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "zero_width_chars",
        pattern: r"[\u{200B}-\u{200F}\u{2060}-\u{206F}]",
        description: "Zero-width characters hiding content",
    },
    AttackPattern {
        name: "directional_overrides",
        pattern: r"[\u{202A}-\u{202E}]",
        description: "Directional override characters",
    },
];

/// System-prompt extraction requests
pub static EXTRACTION_PATTERNS: &[AttackPattern] = &[
    AttackPattern {
        name: "reveal_prompt",
        pattern: r"(?i)(print|show|display|output|reveal|tell\s+me)\s+(your|the|initial|original)?\s*(system\s+prompt|instructions|rules)",
        description: "Requests the system prompt verbatim",
    },
    AttackPattern {
        name: "ask_instructions",
        pattern: r"(?i)what\s+(are|is|were)\s+your\s+(original|initial|system)?\s*(instructions|prompt|rules)",
        description: "Asks for the configured instructions",
    },
];

/// Suspicious keywords matched case-insensitively as substrings
pub static SUSPICIOUS_KEYWORDS: &[&str] = &[
    "jailbreak",
    "bypass",
    "override",
    "unrestricted",
    "unfiltered",
    "ignore limits",
    "no restrictions",
    "developer mode",
    "admin mode",
    "root access",
    "system prompt",
    "initial instructions",
    "original prompt",
    "do anything now",
    "evil mode",
    "no rules",
    "no guidelines",
    "forget your",
    "disregard your",
    "ignore your",
    "stop being",
    "pretend you're",
    "act as if",
    "roleplay",
    "new persona",
    "hidden command",
    "secret mode",
    "backdoor",
    "exploit",
];

/// Prompt-leak phrasings scanned in response content
static PROMPT_LEAK_PATTERNS: &[&str] = &[
    r"(?i)my\s+instructions\s+are",
    r"(?i)my\s+system\s+prompt\s+is",
    r"(?i)i\s+have\s+been\s+programmed\s+to",
    r"(?i)here\s+are\s+my\s+rules",
];

/// Upstream error terms that indicate the model refused on policy grounds
pub static POLICY_REFUSAL_TERMS: &[&str] = &["blocked", "unsafe", "policy", "violation"];

lazy_static! {
    /// All attack patterns, compiled once
    pub static ref COMPILED_PATTERNS: Vec<(Regex, &'static AttackPattern)> = {
        OVERRIDE_PATTERNS
            .iter()
            .chain(JAILBREAK_PATTERNS)
            .chain(MARKER_PATTERNS)
            .chain(ROLE_PATTERNS)
            .chain(UNICODE_PATTERNS)
            .chain(EXTRACTION_PATTERNS)
            .filter_map(|p| Regex::new(p.pattern).ok().map(|r| (r, p)))
            .collect()
    };

    /// Compiled prompt-leak patterns
    static ref PROMPT_LEAK_REGEX: Vec<Regex> = {
        PROMPT_LEAK_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    };
}

/// Match a message against every attack pattern
pub fn match_attack_patterns(message: &str) -> Vec<&'static AttackPattern> {
    COMPILED_PATTERNS
        .iter()
        .filter(|(regex, _)| regex.is_match(message))
        .map(|(_, pattern)| *pattern)
        .collect()
}

/// Suspicious keywords present in a message
pub fn match_suspicious_keywords(message: &str) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .copied()
        .collect()
}

/// True when response content contains prompt-leak phrasing
pub fn contains_prompt_leak(content: &str) -> bool {
    PROMPT_LEAK_REGEX.iter().any(|r| r.is_match(content))
}

/// True when an upstream error message mentions policy/safety refusal terms
pub fn error_mentions_policy(error: &str) -> bool {
    let lower = error.to_lowercase();
    POLICY_REFUSAL_TERMS.iter().any(|term| lower.contains(term))
}
