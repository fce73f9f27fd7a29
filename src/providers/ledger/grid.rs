//! A1 cell arithmetic and lookups over fetched sheet values.
//!
//! The ledger sheet is read in rectangular blocks. A [`ValueGrid`] keeps one
//! block together with its top-left cell so lookups can stay in sheet
//! coordinates.

use std::fmt;

use serde::Serialize;

use crate::config::SheetLayout;

/// Converts a column name (`"A"`, `"N"`, `"AA"`) to a zero-based index.
pub fn column_index(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    name.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
    .map(|n| n - 1)
}

/// Converts a zero-based column index to its name.
pub fn column_name(index: u32) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

/// A single cell in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Zero-based column index.
    pub column: u32,
    /// One-based row number, as shown in the sheet.
    pub row: u32,
}

impl CellRef {
    /// Creates a cell reference.
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Parses `"H3"` style references.
    pub fn parse(a1: &str) -> Option<Self> {
        let split = a1.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = a1.split_at(split);
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(column_index(letters)?, row))
    }

    /// The cell `rows` rows below this one.
    pub fn down(self, rows: u32) -> Self {
        Self::new(self.column, self.row + rows)
    }

    /// This cell as a zero-based, end-exclusive grid range.
    pub fn grid_range(&self, sheet_id: i64) -> GridRange {
        GridRange {
            sheet_id,
            start_row_index: self.row - 1,
            end_row_index: self.row,
            start_column_index: self.column,
            end_column_index: self.column + 1,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.column), self.row)
    }
}

/// A grid range as the Sheets `batchUpdate` API expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}

/// A rectangular block of formatted cell values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueGrid {
    origin: CellRef,
    rows: Vec<Vec<String>>,
}

impl ValueGrid {
    /// Wraps values fetched for a range starting at `origin`.
    ///
    /// Trailing empty rows and cells may be missing, as the Sheets API omits them.
    pub fn new(origin: CellRef, rows: Vec<Vec<String>>) -> Self {
        Self { origin, rows }
    }

    /// Returns the value of `cell`, or `None` if it lies outside the fetched block.
    pub fn get(&self, cell: CellRef) -> Option<&str> {
        let row = cell.row.checked_sub(self.origin.row)?;
        let column = cell.column.checked_sub(self.origin.column)?;
        self.rows
            .get(row as usize)?
            .get(column as usize)
            .map(String::as_str)
    }
}

/// A1 range covering every date header of the layout.
pub fn date_header_range(layout: &SheetLayout) -> Option<(CellRef, CellRef)> {
    let first = column_index(&layout.first_day_column)?;
    let last = column_index(&layout.last_day_column)?;
    let top = *layout.date_rows.iter().min()?;
    let bottom = *layout.date_rows.iter().max()?;
    Some((CellRef::new(first, top), CellRef::new(last, bottom)))
}

/// Finds the header cell holding `date`.
///
/// Date rows are scanned in configured order, each one left to right.
pub fn find_date_cell(grid: &ValueGrid, layout: &SheetLayout, date: &str) -> Option<CellRef> {
    let first = column_index(&layout.first_day_column)?;
    let last = column_index(&layout.last_day_column)?;

    layout
        .date_rows
        .iter()
        .flat_map(|&row| (first..=last).map(move |column| CellRef::new(column, row)))
        .find(|&cell| grid.get(cell).map(str::trim) == Some(date))
}

/// One row of the weekly summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    pub row: u32,
    pub start: String,
    pub end: String,
    pub balance: String,
}

impl WeekRow {
    /// Whether `day` of the month falls inside this week.
    pub fn contains_day(&self, day: u32) -> bool {
        match (day_of_month(&self.start), day_of_month(&self.end)) {
            (Some(start), Some(end)) => start <= day && day <= end,
            _ => false,
        }
    }
}

/// Reads the summary rows of the layout out of `grid`.
pub fn week_rows(grid: &ValueGrid, layout: &SheetLayout) -> Vec<WeekRow> {
    let (Some(start), Some(end), Some(balance)) = (
        column_index(&layout.week_start_column),
        column_index(&layout.week_end_column),
        column_index(&layout.balance_column),
    ) else {
        return Vec::new();
    };

    let value = |column, row| {
        grid.get(CellRef::new(column, row))
            .unwrap_or_default()
            .to_string()
    };

    layout
        .week_rows
        .iter()
        .map(|&row| WeekRow {
            row,
            start: value(start, row),
            end: value(end, row),
            balance: value(balance, row),
        })
        .collect()
}

/// Picks the week containing `day`. If several match, the last one wins.
pub fn week_for_day(weeks: &[WeekRow], day: u32) -> Option<&WeekRow> {
    weeks.iter().rev().find(|week| week.contains_day(day))
}

/// Day of month from a `YYYY-MM-DD` cell: the number after the last hyphen.
fn day_of_month(value: &str) -> Option<u32> {
    value.trim().rsplit('-').next()?.trim().parse().ok()
}
