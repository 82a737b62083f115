//! Pluggable output for deduplicated transcript deltas and their risk findings.

use crate::error::Result;
use crate::risk::scanner::{RiskFinding, RiskLevel};
use owo_colors::OwoColorize;

/// Output handler for the pipeline.
///
/// Called once per emitted delta, with the finding the scanner produced for
/// it. Pairs with AudioSource on the input side.
pub trait TranscriptSink: Send + 'static {
    /// Handle one delta. `finding` always accompanies it; a zero score means
    /// no rule matched.
    fn handle(&mut self, delta: &str, finding: &RiskFinding) -> Result<()>;

    /// Called on pipeline shutdown. Return accumulated text if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Terminal sink: prints deltas as they arrive, with a colored alert line
/// whenever a rule matched.
pub struct StdoutSink {
    quiet: bool,
}

impl StdoutSink {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl TranscriptSink for StdoutSink {
    fn handle(&mut self, delta: &str, finding: &RiskFinding) -> Result<()> {
        println!("{}", delta);

        if finding.matches.is_empty() || self.quiet {
            return Ok(());
        }

        let labels: Vec<&str> = finding.matches.iter().map(|m| m.label.as_str()).collect();
        let tag = format!("[{} {:.2}]", finding.level.as_str(), finding.score);
        let line = format!("{} {}", tag, labels.join(", "));

        match finding.level {
            RiskLevel::High => eprintln!("{}", line.red().bold()),
            RiskLevel::Medium => eprintln!("{}", line.yellow()),
            RiskLevel::Low => eprintln!("{}", line.dimmed()),
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Collects deltas and findings for library use and tests.
/// Returns the joined transcript on finish().
pub struct CollectorSink {
    deltas: Vec<String>,
    findings: Vec<RiskFinding>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            deltas: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Deltas received so far, in arrival order.
    pub fn deltas(&self) -> &[String] {
        &self.deltas
    }

    /// Findings received so far, one per delta.
    pub fn findings(&self) -> &[RiskFinding] {
        &self.findings
    }

    /// The highest level seen across all findings with at least one match.
    pub fn peak_level(&self) -> Option<RiskLevel> {
        self.findings
            .iter()
            .filter(|f| !f.matches.is_empty())
            .map(|f| f.level)
            .max()
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for CollectorSink {
    fn handle(&mut self, delta: &str, finding: &RiskFinding) -> Result<()> {
        self.deltas.push(delta.to_string());
        self.findings.push(finding.clone());
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        if self.deltas.is_empty() {
            None
        } else {
            Some(self.deltas.join(" "))
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::scanner::RiskScanner;

    fn finding_for(text: &str) -> RiskFinding {
        RiskScanner::new().unwrap().scan(text)
    }

    #[test]
    fn sink_is_object_safe() {
        let _sink: Box<dyn TranscriptSink> = Box::new(CollectorSink::new());
    }

    #[test]
    fn collector_joins_deltas() {
        let mut sink = CollectorSink::new();
        sink.handle("hello", &finding_for("hello")).unwrap();
        sink.handle("world", &finding_for("world")).unwrap();
        assert_eq!(sink.finish(), Some("hello world".to_string()));
    }

    #[test]
    fn collector_empty_returns_none() {
        let mut sink = CollectorSink::new();
        assert_eq!(sink.finish(), None);
    }

    #[test]
    fn collector_records_one_finding_per_delta() {
        let mut sink = CollectorSink::new();
        sink.handle("neutral text", &finding_for("neutral text"))
            .unwrap();
        sink.handle("share your otp", &finding_for("share your otp"))
            .unwrap();

        assert_eq!(sink.findings().len(), 2);
        assert!(sink.findings()[0].matches.is_empty());
        assert!(!sink.findings()[1].matches.is_empty());
    }

    #[test]
    fn collector_peak_level_ignores_matchless_findings() {
        let mut sink = CollectorSink::new();
        sink.handle("nothing here", &finding_for("nothing here"))
            .unwrap();
        assert_eq!(sink.peak_level(), None);

        sink.handle("share your otp", &finding_for("share your otp"))
            .unwrap();
        assert_eq!(sink.peak_level(), Some(RiskLevel::Medium));
    }

    #[test]
    fn stdout_sink_handles_clean_and_flagged_deltas() {
        let mut sink = StdoutSink::new(false);
        sink.handle("hello", &finding_for("hello")).unwrap();
        sink.handle("transfer money now", &finding_for("transfer money now"))
            .unwrap();
        assert_eq!(sink.finish(), None);
    }

    #[test]
    fn sink_names() {
        assert_eq!(StdoutSink::new(false).name(), "stdout");
        assert_eq!(CollectorSink::new().name(), "collector");
    }
}
