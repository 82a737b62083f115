//! The fraud-intent rule table.

/// One detection rule: a case-insensitive pattern, a weight, and a label
/// reported when the pattern matches.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Regex source. Compiled case-insensitively by the scanner.
    pub pattern: &'static str,
    /// Contribution to the score when matched.
    pub weight: f32,
    /// Human-readable label for reporting.
    pub label: &'static str,
}

/// Built-in rules for phone-scam signals.
///
/// Weights normalize against their own sum, so they express relative
/// severity: an OTP request alone scores 0.9/1.8 = 0.50 (MEDIUM); stacking
/// urgency or transfer language on top pushes a call toward HIGH.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            pattern: r"(send|transfer|deposit).*(money|funds|amount)",
            weight: 0.25,
            label: "Money Transfer Request",
        },
        Rule {
            pattern: r"(urgent|immediate|now).*(payment|transfer|action)",
            weight: 0.20,
            label: "Urgency with Payment",
        },
        // The second arm flags any mention of a one-time code, verb or not
        Rule {
            pattern: r"(share|tell|give).*(otp|verification\s+code)|(otp|verification\s+code)",
            weight: 0.90,
            label: "OTP/Verification Code Request",
        },
        Rule {
            pattern: r"(your\s+account).*(blocked|suspended|closed)",
            weight: 0.25,
            label: "Account Suspension Threat",
        },
        Rule {
            pattern: r"(pay|payment).*(link|request|immediately)",
            weight: 0.20,
            label: "Suspicious Payment Link",
        },
    ]
}
