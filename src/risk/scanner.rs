//! Stateless rule evaluation over a single transcript delta.
//!
//! Runs per emitted delta, never per raw fragment, so text duplicated by
//! the chunk overlap is neither double-counted nor double-alerted.

use crate::error::{CallguardError, Result};
use crate::risk::rules::{default_rules, Rule};
use regex::{Regex, RegexBuilder};

/// Discrete risk bands over the normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Maps a normalized score to its band: ≥0.7 HIGH, ≥0.3 MEDIUM, else LOW.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Uppercase name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// One matched rule with the exact substring that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub label: String,
    pub matched_text: String,
}

/// Score and explanation for one delta. Ephemeral: reported, then dropped.
#[derive(Debug, Clone)]
pub struct RiskFinding {
    pub matches: Vec<RuleMatch>,
    /// Sum of matched weights over the sum of all weights, rounded to two
    /// decimals — in [0, 1] regardless of rule count.
    pub score: f32,
    pub level: RiskLevel,
}

/// A rule compiled for matching.
struct CompiledRule {
    regex: Regex,
    weight: f32,
    label: &'static str,
}

/// Evaluates the rule table against transcript deltas.
pub struct RiskScanner {
    rules: Vec<CompiledRule>,
    total_weight: f32,
}

impl RiskScanner {
    /// Creates a scanner with the built-in rule table.
    pub fn new() -> Result<Self> {
        Self::with_rules(default_rules())
    }

    /// Creates a scanner from an explicit rule table.
    pub fn with_rules(rules: Vec<Rule>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut total_weight = 0.0;
        for rule in rules {
            let regex = RegexBuilder::new(rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    CallguardError::Other(format!("invalid risk rule '{}': {}", rule.label, e))
                })?;
            total_weight += rule.weight;
            compiled.push(CompiledRule {
                regex,
                weight: rule.weight,
                label: rule.label,
            });
        }
        Ok(Self {
            rules: compiled,
            total_weight,
        })
    }

    /// Scores one delta. Always returns a finding; a score of 0.0 means no
    /// rule matched.
    pub fn scan(&self, delta: &str) -> RiskFinding {
        let mut matches = Vec::new();
        let mut matched_weight = 0.0;

        for rule in &self.rules {
            if let Some(m) = rule.regex.find(delta) {
                matches.push(RuleMatch {
                    label: rule.label.to_string(),
                    matched_text: m.as_str().to_string(),
                });
                matched_weight += rule.weight;
            }
        }

        let score = if self.total_weight > 0.0 {
            round2(matched_weight / self.total_weight)
        } else {
            0.0
        };

        RiskFinding {
            matches,
            score,
            level: RiskLevel::from_score(score),
        }
    }
}

/// Round to two decimal places.
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
