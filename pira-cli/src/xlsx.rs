//! Thin helpers over umya-spreadsheet.
//!
//! All direct workbook access funnels through this module so the rest of the
//! crate speaks in [`CellAddr`]/[`Rect`] terms and stays independent of the
//! library's addressing quirks.

use std::path::Path;

use anyhow::{Context, Result};
use umya_spreadsheet::{Cell, CellValue, Spreadsheet, Worksheet};

use crate::addr::{CellAddr, Rect};

/// Open a workbook for in-place mutation.
pub fn open(path: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))
}

/// Save a workbook back to disk.
pub fn save(book: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))
}

pub fn get_sheet<'a>(book: &'a Spreadsheet, name: &str) -> Option<&'a Worksheet> {
    book.get_sheet_by_name(name)
}

pub fn get_sheet_mut<'a>(book: &'a mut Spreadsheet, name: &str) -> Option<&'a mut Worksheet> {
    book.get_sheet_by_name_mut(name)
}

pub fn has_sheet(book: &Spreadsheet, name: &str) -> bool {
    book.get_sheet_by_name(name).is_some()
}

fn cell_at(sheet: &Worksheet, addr: CellAddr) -> Option<&Cell> {
    sheet.get_cell((addr.col, addr.row))
}

/// Cell text as stored (cached value for formula cells); empty string when
/// the cell is absent.
pub fn cell_text(sheet: &Worksheet, addr: CellAddr) -> String {
    cell_at(sheet, addr)
        .map(|c| c.get_value().to_string())
        .unwrap_or_default()
}

/// Formula in `=...` form, or None when the cell holds no formula.
pub fn cell_formula(sheet: &Worksheet, addr: CellAddr) -> Option<String> {
    let formula = cell_at(sheet, addr)?.get_formula();
    if formula.is_empty() {
        None
    } else if formula.starts_with('=') {
        Some(formula.to_string())
    } else {
        Some(format!("={formula}"))
    }
}

pub fn set_cell_text(sheet: &mut Worksheet, addr: CellAddr, value: &str) {
    sheet.get_cell_mut((addr.col, addr.row)).set_value(value);
}

/// Clear a cell's contents (value and formula); styling is untouched.
/// Absent cells are left absent rather than materialized.
pub fn clear_cell(sheet: &mut Worksheet, addr: CellAddr) {
    if cell_at(sheet, addr).is_some() {
        sheet.get_cell_mut((addr.col, addr.row)).set_blank();
    }
}

pub fn clear_rect(sheet: &mut Worksheet, rect: Rect) {
    for addr in rect.cells() {
        clear_cell(sheet, addr);
    }
}

/// Number-format code of a cell, if one is set.
pub fn number_format(sheet: &Worksheet, addr: CellAddr) -> Option<String> {
    if let Some(format) = cell_at(sheet, addr)?.get_style().get_number_format() {
        Some(format.get_format_code().to_string())
    } else {
        None
    }
}

pub fn set_number_format(sheet: &mut Worksheet, addr: CellAddr, code: &str) {
    sheet
        .get_cell_mut((addr.col, addr.row))
        .get_style_mut()
        .get_number_format_mut()
        .set_format_code(code);
}

/// Exact snapshot of a cell's stored value, for save/clear/restore flows.
#[derive(Debug, Clone)]
pub struct CellSnapshot {
    value: Option<CellValue>,
}

pub fn snapshot_cell(sheet: &Worksheet, addr: CellAddr) -> CellSnapshot {
    CellSnapshot {
        value: cell_at(sheet, addr).map(|c| c.get_cell_value().clone()),
    }
}

pub fn restore_cell(sheet: &mut Worksheet, addr: CellAddr, snapshot: CellSnapshot) {
    match snapshot.value {
        Some(value) => {
            *sheet.get_cell_mut((addr.col, addr.row)).get_cell_value_mut() = value;
        }
        None => clear_cell(sheet, addr),
    }
}

/// Highest used (column, row) of a sheet, 1-based.
pub fn used_extent(sheet: &Worksheet) -> (u32, u32) {
    sheet.get_highest_column_and_row()
}

/// The merged region covering `addr`, as its "A1:B2" range string.
pub fn merged_region_covering(sheet: &Worksheet, addr: CellAddr) -> Option<String> {
    sheet.get_merge_cells().iter().find_map(|range| {
        let text = range.get_range();
        let rect = Rect::parse(&text)?;
        rect.contains(addr).then_some(text)
    })
}

/// Remove a merged region previously returned by [`merged_region_covering`].
pub fn unmerge_region(sheet: &mut Worksheet, region: &str) {
    sheet.get_merge_cells_mut().retain(|r| r.get_range() != region);
}

/// Insert `count` blank columns at 1-based `col`, shifting existing columns
/// (and their formula references) to the right.
pub fn insert_columns(book: &mut Spreadsheet, sheet_name: &str, col: u32, count: u32) {
    book.insert_new_column_by_index(sheet_name, &col, &count);
}
