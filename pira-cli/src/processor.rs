//! Top-level PIRA processing orchestration.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::detector::StructureDetector;
use crate::engine::RulesEngine;
use crate::rules::RuleDocument;
use crate::xlsx;

/// Detects the client, loads its rules and replays them against a workbook.
///
/// One `process` call owns the workbook for its whole duration: open, mutate,
/// save, release. There is no locking against concurrent writers of the same
/// file.
pub struct PiraProcessor {
    client_type: Option<String>,
    detector: StructureDetector,
    engine: RulesEngine,
}

impl PiraProcessor {
    /// `client_type` of `None` means "detect from the sheet layout"; the
    /// detected tag is cached on the instance.
    pub fn new(client_type: Option<String>, rules_dir: impl Into<PathBuf>) -> PiraProcessor {
        PiraProcessor {
            client_type,
            detector: StructureDetector::new(),
            engine: RulesEngine::new(rules_dir),
        }
    }

    /// Process a PIRA workbook end to end.
    ///
    /// Every failure mode is logged and collapsed into `false`; this never
    /// panics or returns an error. The workbook is saved only when a
    /// non-empty rule document actually ran.
    pub fn process(&mut self, file_path: &Path) -> bool {
        log::info!("Processing file: {}", file_path.display());

        if !file_path.exists() {
            log::error!("File not found: {}", file_path.display());
            return false;
        }

        let client = match &self.client_type {
            Some(tag) => tag.clone(),
            None => {
                let detected = self.detector.detect_client(file_path);
                log::info!("Detected client: {detected}");
                self.client_type = Some(detected.clone());
                detected
            }
        };

        let doc = self.engine.load_client_rules(&client);
        if doc.is_empty() {
            log::error!("No usable rules for client '{client}'; file left untouched");
            return false;
        }

        match self.run(file_path, &doc) {
            Ok(saved) => saved,
            Err(e) => {
                log::error!("Failed to process {}: {e:#}", file_path.display());
                false
            }
        }
    }

    fn run(&self, file_path: &Path, doc: &RuleDocument) -> Result<bool> {
        let mut book = xlsx::open(file_path)?;
        log::info!("Workbook opened");

        let report = self.engine.execute_rules(&mut book, doc);
        if !report.executed() {
            log::error!("Rule execution did not run; workbook not modified");
            return Ok(false);
        }
        if !report.is_clean() {
            log::warn!("Partial failure: {}", report.summary());
        }

        xlsx::save(&book, file_path)?;
        log::info!("Workbook saved ({})", report.summary());
        Ok(true)
    }

    /// The resolved client tag, once supplied or detected.
    pub fn client_type(&self) -> Option<&str> {
        self.client_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = PiraProcessor::new(None, dir.path());
        assert!(!processor.process(Path::new("/no/such/pira.xlsx")));
        // The detector never ran: no client tag was cached.
        assert_eq!(processor.client_type(), None);
    }

    #[test]
    fn test_empty_rule_document_fails_without_touching_workbook() {
        let rules = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pira.xlsx");

        let mut book = umya_spreadsheet::new_file();
        book.get_active_sheet_mut().get_cell_mut("A1").set_value("v");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        let bytes_before = std::fs::read(&path).unwrap();

        // No rule file exists for any client; detection lands on "generico".
        let mut processor = PiraProcessor::new(None, rules.path());
        assert!(!processor.process(&path));
        assert_eq!(processor.client_type(), Some("generico"));
        assert_eq!(std::fs::read(&path).unwrap(), bytes_before);
    }

    #[test]
    fn test_supplied_client_type_skips_detection() {
        let rules = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(rules.path().join("custom.json")).unwrap();
        file.write_all(
            br#"{"rules": [{"sheet": "Plan1", "operations": [
                {"type": "clear_range", "params": {"range": "A1"}}
            ]}]}"#,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pira.xlsx");
        let mut book = umya_spreadsheet::new_file();
        book.get_active_sheet_mut().set_name("Plan1");
        book.get_active_sheet_mut()
            .get_cell_mut("A1")
            .set_value("wipe");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut processor = PiraProcessor::new(Some("custom".into()), rules.path());
        assert!(processor.process(&path));

        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name("Plan1").unwrap();
        let text = sheet
            .get_cell("A1")
            .map(|c| c.get_value().to_string())
            .unwrap_or_default();
        assert_eq!(text, "");
    }
}
