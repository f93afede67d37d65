//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::processor::PiraProcessor;

/// Rule-driven rewriter for client PIRA report workbooks.
#[derive(Debug, Parser)]
#[command(name = "pira-cli", version, about)]
pub struct Cli {
    /// Workbook to process (.xlsx or .xlsm)
    pub file: PathBuf,

    /// Client tag (e.g. "jaguare"); detected from the sheet layout when
    /// omitted
    pub client_type: Option<String>,

    /// Directory holding the <client>.json rule documents
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Directory for the per-run log file (defaults to the working directory)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Resolve the rules directory: `--rules-dir`, then `PIRA_RULES_DIR`, then
/// the user config dir, then `./rules`.
pub fn resolve_rules_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.rules_dir {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("PIRA_RULES_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(config) = dirs::config_dir() {
        let candidate = config.join("pira").join("rules");
        if candidate.is_dir() {
            return candidate;
        }
    }
    PathBuf::from("rules")
}

/// Run the processor for the parsed arguments; returns the process exit code.
pub fn run(cli: Cli) -> i32 {
    let rules_dir = resolve_rules_dir(&cli);
    log::info!("Using rules directory: {}", rules_dir.display());

    let mut processor = PiraProcessor::new(cli.client_type.clone(), rules_dir);
    if processor.process(&cli.file) {
        log::info!("Processing finished successfully");
        0
    } else {
        log::error!("Processing failed");
        1
    }
}
