//! Per-run execution reporting.
//!
//! The engine never aborts on an operation failure; every operation resolves
//! to an outcome collected here, so callers can observe partial failure
//! instead of a single aggregate boolean.

/// How a single operation (or whole rule) resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Applied,
    Skipped(String),
    Failed(String),
}

/// One entry per rule-document operation, in execution order.
///
/// A rule skipped wholesale (target sheet absent) is recorded as a single
/// entry with `operation == "rule"`.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub sheet: String,
    pub operation: &'static str,
    pub status: OutcomeStatus,
}

/// Aggregated result of one `execute_rules` call.
///
/// `executed()` mirrors the engine's historical aggregate: it only says
/// whether a non-empty document was run, not whether every operation
/// succeeded. Per-operation outcomes carry the rest.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    executed: bool,
    outcomes: Vec<OperationOutcome>,
}

impl ExecutionReport {
    pub fn new(executed: bool) -> ExecutionReport {
        ExecutionReport {
            executed,
            outcomes: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        sheet: impl Into<String>,
        operation: &'static str,
        status: OutcomeStatus,
    ) {
        self.outcomes.push(OperationOutcome {
            sheet: sheet.into(),
            operation,
            status,
        });
    }

    /// Whether a non-empty rule document was run at all.
    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn outcomes(&self) -> &[OperationOutcome] {
        &self.outcomes
    }

    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed(_)))
    }

    /// True when no operation failed (skips are not failures).
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} applied, {} skipped, {} failed",
            self.applied(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut report = ExecutionReport::new(true);
        report.record("Plan1", "clear_range", OutcomeStatus::Applied);
        report.record(
            "Plan1",
            "copy_range",
            OutcomeStatus::Skipped("missing 'source' or 'destination' parameter".into()),
        );
        report.record(
            "Plan2",
            "process_r2_analise",
            OutcomeStatus::Failed("no anchor cell".into()),
        );

        assert!(report.executed());
        assert_eq!(report.applied(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.summary(), "1 applied, 1 skipped, 1 failed");
    }

    #[test]
    fn test_empty_document_report() {
        let report = ExecutionReport::new(false);
        assert!(!report.executed());
        assert!(report.is_clean());
        assert!(report.outcomes().is_empty());
    }
}
