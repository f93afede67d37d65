//! Client-layout detection from workbook sheet names.
//!
//! Each known client ships its PIRA with a recognizable sheet, so the tag can
//! be inferred without reading any cell data. The workbook is opened
//! read-only; detection never mutates the file.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Reader, Xlsx, open_workbook};

/// Sentinel returned when the workbook opened fine but matched no signature.
pub const GENERIC_CLIENT: &str = "generico";
/// Sentinel returned when the workbook could not be opened or enumerated.
pub const UNKNOWN_CLIENT: &str = "desconhecido";

/// Ordered sheet-name signatures; the first match wins.
const SIGNATURES: &[(&str, fn(&[String]) -> bool)] = &[
    ("jaguare", is_jaguare),
    ("sacolao", is_sacolao),
    ("estacao_santa", is_estacao_santa),
    ("rainha", is_rainha),
    ("padaria_real", is_padaria_real),
];

fn is_jaguare(names: &[String]) -> bool {
    names.iter().any(|n| n == "R2_Análise de Resul. Acum.")
}

fn is_sacolao(names: &[String]) -> bool {
    names.iter().any(|n| n == "R2_Análise Resul Acumulado")
}

fn is_estacao_santa(names: &[String]) -> bool {
    // Upstream files are inconsistent about the leading space in this sheet
    // name; both spellings occur, so both are accepted.
    names
        .iter()
        .any(|n| n == " E7_Fat Estação da Santa" || n == "E7_Fat Estação da Santa")
}

fn is_rainha(_names: &[String]) -> bool {
    // No known signature for this client yet.
    false
}

fn is_padaria_real(_names: &[String]) -> bool {
    // No known signature for this client yet.
    false
}

/// Identifies the client layout convention of a PIRA workbook.
#[derive(Debug, Default)]
pub struct StructureDetector;

impl StructureDetector {
    pub fn new() -> StructureDetector {
        StructureDetector
    }

    /// Classify a workbook by its sheet names.
    ///
    /// Returns [`UNKNOWN_CLIENT`] when the file cannot be opened or its
    /// sheets enumerated (a transport failure), and [`GENERIC_CLIENT`] when
    /// the workbook opens fine but matches no known signature.
    pub fn detect_client(&self, path: &Path) -> String {
        log::info!("Detecting client type for: {}", path.display());

        let names = match self.sheet_names(path) {
            Ok(names) => names,
            Err(e) => {
                log::error!("Failed to inspect workbook {}: {e:#}", path.display());
                return UNKNOWN_CLIENT.to_string();
            }
        };
        log::info!("Sheets found: {names:?}");

        for (tag, matches) in SIGNATURES {
            if matches(&names) {
                return (*tag).to_string();
            }
        }

        log::warn!("No client signature matched; falling back to '{GENERIC_CLIENT}'");
        GENERIC_CLIENT.to_string()
    }

    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let workbook: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
        Ok(workbook.sheet_names().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn workbook_with_sheet(name: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut book = umya_spreadsheet::new_file();
        book.get_active_sheet_mut().set_name(name);
        umya_spreadsheet::writer::xlsx::write(&book, dir.path().join("pira.xlsx")).unwrap();
        dir
    }

    #[test]
    fn test_detects_jaguare() {
        let dir = workbook_with_sheet("R2_Análise de Resul. Acum.");
        let detector = StructureDetector::new();
        assert_eq!(detector.detect_client(&dir.path().join("pira.xlsx")), "jaguare");
    }

    #[test]
    fn test_detects_sacolao() {
        let dir = workbook_with_sheet("R2_Análise Resul Acumulado");
        let detector = StructureDetector::new();
        assert_eq!(detector.detect_client(&dir.path().join("pira.xlsx")), "sacolao");
    }

    #[test]
    fn test_detects_estacao_santa_both_spellings() {
        let detector = StructureDetector::new();
        for name in [" E7_Fat Estação da Santa", "E7_Fat Estação da Santa"] {
            let dir = workbook_with_sheet(name);
            assert_eq!(
                detector.detect_client(&dir.path().join("pira.xlsx")),
                "estacao_santa"
            );
        }
    }

    #[test]
    fn test_unmatched_layout_is_generic() {
        let dir = workbook_with_sheet("Plan1");
        let detector = StructureDetector::new();
        assert_eq!(
            detector.detect_client(&dir.path().join("pira.xlsx")),
            GENERIC_CLIENT
        );
    }

    #[test]
    fn test_missing_file_is_unknown() {
        let detector = StructureDetector::new();
        assert_eq!(
            detector.detect_client(Path::new("/no/such/file.xlsx")),
            UNKNOWN_CLIENT
        );
    }

    #[test]
    fn test_corrupt_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"this is not a zip archive").unwrap();
        let detector = StructureDetector::new();
        assert_eq!(detector.detect_client(&path), UNKNOWN_CLIENT);
    }
}
