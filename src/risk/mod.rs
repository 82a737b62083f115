//! Rule-based fraud-intent detection over emitted transcript deltas.

pub mod rules;
pub mod scanner;

pub use rules::{default_rules, Rule};
pub use scanner::{RiskFinding, RiskLevel, RiskScanner, RuleMatch};
