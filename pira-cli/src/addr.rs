//! A1-style address handling.
//!
//! Bidirectional conversion between 1-based column numbers and spreadsheet
//! letter notation, plus parsing of single-cell ("B2") and rectangular
//! ("A1:C3") references. Rows and columns are 1-based throughout, matching
//! the spreadsheet UI and the workbook library.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

fn a1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$?(?<letters>[A-Za-z]+)\$?(?<row>[0-9]+)$").unwrap())
}

/// Convert a 1-based column number to letters (1 -> A, 26 -> Z, 27 -> AA).
pub fn column_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Convert column letters back to a 1-based column number.
/// Returns None for empty or non-alphabetic input.
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let mut col: u32 = 0;
    for b in letters.to_ascii_uppercase().bytes() {
        col = col.checked_mul(26)?.checked_add((b - b'A') as u32 + 1)?;
    }
    Some(col)
}

/// A single cell position, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddr {
    pub col: u32,
    pub row: u32,
}

impl CellAddr {
    pub fn new(col: u32, row: u32) -> CellAddr {
        CellAddr { col, row }
    }

    /// Parse an A1-style reference such as "B2" or "$B$2".
    pub fn parse(s: &str) -> Option<CellAddr> {
        let caps = a1_regex().captures(s.trim())?;
        let col = column_number(&caps["letters"])?;
        let row: u32 = caps["row"].parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(CellAddr::new(col, row))
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// An inclusive rectangular range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub start: CellAddr,
    pub end: CellAddr,
}

impl Rect {
    /// Parse "A1:C3" or a single cell "B2" (a 1x1 rectangle).
    pub fn parse(s: &str) -> Option<Rect> {
        match s.split_once(':') {
            Some((a, b)) => {
                let a = CellAddr::parse(a)?;
                let b = CellAddr::parse(b)?;
                Some(Rect {
                    start: CellAddr::new(a.col.min(b.col), a.row.min(b.row)),
                    end: CellAddr::new(a.col.max(b.col), a.row.max(b.row)),
                })
            }
            None => {
                let cell = CellAddr::parse(s)?;
                Some(Rect {
                    start: cell,
                    end: cell,
                })
            }
        }
    }

    pub fn contains(&self, addr: CellAddr) -> bool {
        self.start.col <= addr.col
            && addr.col <= self.end.col
            && self.start.row <= addr.row
            && addr.row <= self.end.row
    }

    /// All cells of the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellAddr> {
        let (c1, c2) = (self.start.col, self.end.col);
        (self.start.row..=self.end.row)
            .flat_map(move |row| (c1..=c2).map(move |col| CellAddr::new(col, row)))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}
