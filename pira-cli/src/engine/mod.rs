//! Rule loading and execution against an open workbook.

mod ops;
mod report;

pub use report::{ExecutionReport, OperationOutcome, OutcomeStatus};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use umya_spreadsheet::Spreadsheet;

use crate::rules::RuleDocument;
use crate::xlsx;

/// Interprets per-client rule documents.
pub struct RulesEngine {
    rules_dir: PathBuf,
}

impl RulesEngine {
    pub fn new(rules_dir: impl Into<PathBuf>) -> RulesEngine {
        RulesEngine {
            rules_dir: rules_dir.into(),
        }
    }

    /// Load `<rules_dir>/<client_tag>.json`.
    ///
    /// A missing or malformed file yields an empty document with a log entry,
    /// never an error: rule configuration problems must not crash a run.
    pub fn load_client_rules(&self, client_tag: &str) -> RuleDocument {
        log::info!("Loading rules for client: {client_tag}");
        let path = self.rules_dir.join(format!("{client_tag}.json"));

        if !path.exists() {
            log::warn!("Rule file not found: {}", path.display());
            return RuleDocument::default();
        }

        match read_document(&path) {
            Ok(doc) => {
                log::info!("Loaded {} rules from {}", doc.rules.len(), path.display());
                doc
            }
            Err(e) => {
                log::error!("Failed to load rules from {}: {e:#}", path.display());
                RuleDocument::default()
            }
        }
    }

    /// Replay a rule document against an open workbook.
    ///
    /// Returns immediately with `executed() == false` when the document is
    /// empty. Rules whose sheet is absent are skipped with a warning; every
    /// operation failure is recorded and logged, and never aborts the
    /// operations after it.
    pub fn execute_rules(&self, book: &mut Spreadsheet, doc: &RuleDocument) -> ExecutionReport {
        if doc.is_empty() {
            log::warn!("No rules to execute");
            return ExecutionReport::new(false);
        }

        log::info!("Executing {} rules", doc.rules.len());
        let mut report = ExecutionReport::new(true);

        for rule in &doc.rules {
            if !xlsx::has_sheet(book, &rule.sheet) {
                log::warn!("Sheet not found, skipping rule: {}", rule.sheet);
                report.record(
                    &rule.sheet,
                    "rule",
                    OutcomeStatus::Skipped("sheet not found in workbook".into()),
                );
                continue;
            }

            log::info!("Processing sheet: {}", rule.sheet);
            for op in &rule.operations {
                let status = ops::apply(book, &rule.sheet, op);
                match &status {
                    OutcomeStatus::Applied => {
                        log::info!("{}: {} applied", rule.sheet, op.name());
                    }
                    OutcomeStatus::Skipped(reason) => {
                        log::warn!("{}: {} skipped: {reason}", rule.sheet, op.name());
                    }
                    OutcomeStatus::Failed(reason) => {
                        log::error!("{}: {} failed: {reason}", rule.sheet, op.name());
                    }
                }
                report.record(&rule.sheet, op.name(), status);
            }
        }

        log::info!("Rule execution finished: {}", report.summary());
        report
    }
}

fn read_document(path: &Path) -> Result<RuleDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Malformed rule file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::cell_text;
    use crate::addr::CellAddr;
    use std::io::Write;

    fn engine_with_rules(name: &str, json: &str) -> (tempfile::TempDir, RulesEngine) {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(format!("{name}.json"))).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let engine = RulesEngine::new(dir.path());
        (dir, engine)
    }

    #[test]
    fn test_load_rules_missing_client_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RulesEngine::new(dir.path());
        let doc = engine.load_client_rules("nonexistent");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_load_rules_malformed_json_is_empty() {
        let (_dir, engine) = engine_with_rules("broken", "{not json");
        assert!(engine.load_client_rules("broken").is_empty());
    }

    #[test]
    fn test_load_rules_ok() {
        let (_dir, engine) = engine_with_rules(
            "jaguare",
            r#"{"rules": [{"sheet": "Plan1", "operations": [
                {"type": "clear_range", "params": {"range": "A1:B2"}}
            ]}]}"#,
        );
        let doc = engine.load_client_rules("jaguare");
        assert_eq!(doc.rules.len(), 1);
    }

    #[test]
    fn test_execute_empty_document_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RulesEngine::new(dir.path());
        let mut book = umya_spreadsheet::new_file();
        let report = engine.execute_rules(&mut book, &RuleDocument::default());
        assert!(!report.executed());
    }

    #[test]
    fn test_execute_skips_absent_sheet_and_continues() {
        let (_dir, engine) = engine_with_rules(
            "client",
            r#"{"rules": [
                {"sheet": "Missing", "operations": [
                    {"type": "clear_range", "params": {"range": "A1"}}
                ]},
                {"sheet": "Plan1", "operations": [
                    {"type": "clear_range", "params": {"range": "A1"}}
                ]}
            ]}"#,
        );
        let doc = engine.load_client_rules("client");

        let mut book = umya_spreadsheet::new_file();
        book.get_active_sheet_mut().set_name("Plan1");
        book.get_active_sheet_mut()
            .get_cell_mut("A1")
            .set_value("gone");

        let report = engine.execute_rules(&mut book, &doc);
        assert!(report.executed());
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.applied(), 1);
        let sheet = book.get_sheet_by_name("Plan1").unwrap();
        assert_eq!(cell_text(sheet, CellAddr::new(1, 1)), "");
    }

    #[test]
    fn test_partial_failure_is_visible_in_report() {
        let (_dir, engine) = engine_with_rules(
            "client",
            r#"{"rules": [{"sheet": "Plan1", "operations": [
                {"type": "clear_range", "params": {"range": "A1"}},
                {"type": "process_r2_analise", "params": {}}
            ]}]}"#,
        );
        let doc = engine.load_client_rules("client");

        let mut book = umya_spreadsheet::new_file();
        book.get_active_sheet_mut().set_name("Plan1");
        book.get_active_sheet_mut()
            .get_cell_mut("A1")
            .set_value("x");

        // No anchor formula anywhere: the second operation fails, the first
        // still applies, and the aggregate flag stays true.
        let report = engine.execute_rules(&mut book, &doc);
        assert!(report.executed());
        assert_eq!(report.applied(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
    }
}
