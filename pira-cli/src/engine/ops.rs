//! The closed set of rule operations.
//!
//! Every handler resolves to an [`OutcomeStatus`] instead of returning an
//! error: a failed or skipped operation never stops the ones after it.
//! Handlers receive the whole workbook plus the target sheet name because
//! column insertion rewrites cross-sheet formula references and therefore
//! works at the workbook level.

use std::sync::OnceLock;

use chrono::{Datelike, Local};
use regex::Regex;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::report::OutcomeStatus;
use crate::addr::{CellAddr, Rect, column_letters};
use crate::rules::Operation;
use crate::xlsx;

/// Rows carried over when filling the inserted columns of
/// `process_r2_analise`.
const COPY_ROWS: u32 = 90;

/// Scan bounds for the anchor search, capped so a huge used range does not
/// turn the scan into a full-sheet walk.
const ANCHOR_MAX_ROWS: u32 = 100;
const ANCHOR_MAX_COLS: u32 = 200;

/// Scan bounds for the date-label search on the information sheet.
const DATE_SCAN_ROWS: u32 = 20;
const DATE_SCAN_COLS: u32 = 10;

/// Anchor pattern for `process_r2_analise`: a formula referencing any single
/// column at row 2, e.g. `=X$2`.
fn anchor_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=\$?[A-Z]+\$?2").unwrap())
}

/// Dispatch one operation against the named sheet.
pub fn apply(book: &mut Spreadsheet, sheet_name: &str, op: &Operation) -> OutcomeStatus {
    match op {
        Operation::ClearRange { range } => clear_range(book, sheet_name, range.as_deref()),
        Operation::CopyRange {
            source,
            destination,
            clear_source,
        } => copy_range(
            book,
            sheet_name,
            source.as_deref(),
            destination.as_deref(),
            *clear_source,
        ),
        Operation::ClearRangeExcept { range, exceptions } => {
            clear_range_except(book, sheet_name, range.as_deref(), exceptions)
        }
        Operation::UpdateInfGerais { month, year } => {
            update_inf_gerais(book, sheet_name, *month, *year)
        }
        Operation::ProcessR2Analise {} => process_r2_analise(book, sheet_name),
    }
}

fn missing_sheet(name: &str) -> OutcomeStatus {
    OutcomeStatus::Failed(format!("sheet disappeared during execution: {name}"))
}

fn clear_range(book: &mut Spreadsheet, sheet_name: &str, range: Option<&str>) -> OutcomeStatus {
    let Some(range) = range else {
        return OutcomeStatus::Skipped("missing 'range' parameter".into());
    };
    let Some(rect) = Rect::parse(range) else {
        return OutcomeStatus::Failed(format!("invalid range address: {range}"));
    };
    let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
        return missing_sheet(sheet_name);
    };

    xlsx::clear_rect(sheet, rect);
    log::info!("Cleared range {range}");
    OutcomeStatus::Applied
}

fn copy_range(
    book: &mut Spreadsheet,
    sheet_name: &str,
    source: Option<&str>,
    destination: Option<&str>,
    clear_source: bool,
) -> OutcomeStatus {
    let (Some(source), Some(destination)) = (source, destination) else {
        return OutcomeStatus::Skipped("missing 'source' or 'destination' parameter".into());
    };
    let Some(src) = Rect::parse(source) else {
        return OutcomeStatus::Failed(format!("invalid source address: {source}"));
    };
    let Some(dst) = Rect::parse(destination) else {
        return OutcomeStatus::Failed(format!("invalid destination address: {destination}"));
    };
    let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
        return missing_sheet(sheet_name);
    };

    // Capture the whole source first so overlapping ranges behave like a
    // clipboard paste rather than a cell-by-cell shift.
    let origin = dst.start;
    let captured: Vec<(CellAddr, String, Option<String>)> = src
        .cells()
        .map(|addr| {
            let target = CellAddr::new(
                origin.col + (addr.col - src.start.col),
                origin.row + (addr.row - src.start.row),
            );
            (
                target,
                xlsx::cell_text(sheet, addr),
                xlsx::number_format(sheet, addr),
            )
        })
        .collect();

    for (target, text, format) in captured {
        if text.is_empty() {
            xlsx::clear_cell(sheet, target);
        } else {
            xlsx::set_cell_text(sheet, target, &text);
        }
        if let Some(code) = format {
            xlsx::set_number_format(sheet, target, &code);
        }
    }
    log::info!("Copied {source} to {destination}");

    if clear_source {
        xlsx::clear_rect(sheet, src);
        log::info!("Cleared source range {source}");
    }
    OutcomeStatus::Applied
}

fn clear_range_except(
    book: &mut Spreadsheet,
    sheet_name: &str,
    range: Option<&str>,
    exceptions: &[String],
) -> OutcomeStatus {
    let Some(range) = range else {
        return OutcomeStatus::Skipped("missing 'range' parameter".into());
    };
    let Some(rect) = Rect::parse(range) else {
        return OutcomeStatus::Failed(format!("invalid range address: {range}"));
    };

    let mut saved = Vec::with_capacity(exceptions.len());
    for cell in exceptions {
        let Some(addr) = CellAddr::parse(cell) else {
            return OutcomeStatus::Failed(format!("invalid exception cell address: {cell}"));
        };
        saved.push(addr);
    }

    let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
        return missing_sheet(sheet_name);
    };

    // Save, clear everything, restore. Whatever the exception cells hold at
    // snapshot time survives exactly, formulas included.
    let snapshots: Vec<_> = saved
        .iter()
        .map(|&addr| (addr, xlsx::snapshot_cell(sheet, addr)))
        .collect();
    xlsx::clear_rect(sheet, rect);
    for (addr, snapshot) in snapshots {
        xlsx::restore_cell(sheet, addr, snapshot);
    }

    log::info!(
        "Cleared range {range} keeping {} exception cells",
        exceptions.len()
    );
    OutcomeStatus::Applied
}

fn update_inf_gerais(
    book: &mut Spreadsheet,
    sheet_name: &str,
    month: Option<u32>,
    year: Option<i32>,
) -> OutcomeStatus {
    let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
        return missing_sheet(sheet_name);
    };

    let today = Local::now();
    let month = month.unwrap_or_else(|| today.month());
    let year = year.unwrap_or_else(|| today.year());
    let stamp = format!("{month}/{year}");

    for row in 1..=DATE_SCAN_ROWS {
        for col in 1..=DATE_SCAN_COLS {
            let text = xlsx::cell_text(sheet, CellAddr::new(col, row));
            if text.to_lowercase().contains("data") {
                let target = CellAddr::new(col + 1, row);
                xlsx::set_cell_text(sheet, target, &stamp);
                log::info!("Date stamp {stamp} written at {target}");
                return OutcomeStatus::Applied;
            }
        }
    }
    OutcomeStatus::Skipped("no date label cell found".into())
}

fn process_r2_analise(book: &mut Spreadsheet, sheet_name: &str) -> OutcomeStatus {
    // Locate the anchor first; when it is absent nothing may be mutated.
    let anchor = {
        let Some(sheet) = xlsx::get_sheet(book, sheet_name) else {
            return missing_sheet(sheet_name);
        };
        find_anchor(sheet)
    };
    let Some(anchor) = anchor else {
        log::error!("No row-2 reference formula found on '{sheet_name}'; aborting column insertion");
        return OutcomeStatus::Failed("no anchor cell matching a row-2 column reference".into());
    };

    // A column insert through a merged region corrupts it, so the region
    // covering the anchor is dissolved first.
    {
        let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
            return missing_sheet(sheet_name);
        };
        if let Some(region) = xlsx::merged_region_covering(sheet, anchor) {
            log::info!("Anchor cell {anchor} sits in merged region {region}; un-merging");
            xlsx::unmerge_region(sheet, &region);
        }
    }

    xlsx::insert_columns(book, sheet_name, anchor.col, 2);
    log::info!(
        "Inserted two columns at {} on '{sheet_name}'",
        column_letters(anchor.col)
    );

    // The template columns now sit immediately right of the inserted pair.
    let Some(sheet) = xlsx::get_sheet_mut(book, sheet_name) else {
        return missing_sheet(sheet_name);
    };
    for offset in 0..2 {
        let source_col = anchor.col + 2 + offset;
        let dest_col = anchor.col + offset;
        copy_column(sheet, source_col, dest_col);
        log::info!(
            "Copied column {} into {}",
            column_letters(source_col),
            column_letters(dest_col)
        );
    }
    OutcomeStatus::Applied
}

/// Row-major scan of the used range (capped at 100x200) for the first cell
/// whose formula references a column at row 2.
fn find_anchor(sheet: &Worksheet) -> Option<CellAddr> {
    let (max_col, max_row) = xlsx::used_extent(sheet);
    let last_col = max_col.min(ANCHOR_MAX_COLS);
    let last_row = max_row.min(ANCHOR_MAX_ROWS);

    for row in 1..=last_row {
        for col in 1..=last_col {
            let addr = CellAddr::new(col, row);
            if let Some(formula) = xlsx::cell_formula(sheet, addr) {
                if anchor_pattern().is_match(&formula) {
                    log::info!("Row-2 reference found at {addr}: {formula}");
                    return Some(addr);
                }
            }
        }
    }
    None
}

/// Copy values and number formats of one column into another, rows 1..=90.
/// Empty source cells are passed over, leaving the destination cell as the
/// insert produced it.
fn copy_column(sheet: &mut Worksheet, source_col: u32, dest_col: u32) {
    for row in 1..=COPY_ROWS {
        let src = CellAddr::new(source_col, row);
        let text = xlsx::cell_text(sheet, src);
        if text.is_empty() {
            continue;
        }
        let dst = CellAddr::new(dest_col, row);
        xlsx::set_cell_text(sheet, dst, &text);
        if let Some(code) = xlsx::number_format(sheet, src) {
            xlsx::set_number_format(sheet, dst, &code);
        }
    }
}
