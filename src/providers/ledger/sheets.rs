//! Google Sheets ledger.
//!
//! Each month has its own tab named `YYYY-MM`. The tab holds a calendar of
//! day cells; receipts of a day go into the rows below its date cell, one row
//! per receipt, with the item list attached as a cell note. A summary table
//! on the same tab holds the remaining balance per week.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::grid::{self, CellRef, ValueGrid};
use super::traits::LedgerStore;
use crate::config::{LedgerSettings, SheetLayout};
use crate::domain::{PollingBatch, ReceiptRecord};
use crate::providers::google::GoogleSession;
use crate::providers::{ProviderError, Result};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Response from the values.get endpoint.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Body of the values.update endpoint.
#[derive(Debug, Serialize)]
struct ValueUpdate<'a> {
    range: &'a str,
    values: [[&'a str; 1]; 1],
}

/// Name of the tab holding the month of `date`.
pub fn month_tab(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// The date format used in the ledger's day cells.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// A receipt placed on its ledger cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    cell: CellRef,
    amount: String,
    note: String,
}

/// Receipts of `batch` purchased on `date`, in batch order.
fn receipts_on<'a>(batch: &'a PollingBatch, date: &str) -> Vec<&'a ReceiptRecord> {
    batch
        .iter()
        .filter(|record| record.purchase_date == date)
        .collect()
}

/// Places `records` one per row, starting at `first`.
fn plan_entries(records: &[&ReceiptRecord], first: CellRef) -> Vec<LedgerEntry> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| LedgerEntry {
            cell: first.down(i as u32),
            amount: record.total_amount.clone(),
            note: record.items_note(),
        })
        .collect()
}

/// batchUpdate body setting the note of a single cell.
fn note_request(cell: CellRef, sheet_id: i64, note: &str) -> serde_json::Value {
    json!({
        "requests": [{
            "repeatCell": {
                "range": cell.grid_range(sheet_id),
                "cell": { "note": note },
                "fields": "note",
            }
        }]
    })
}

/// The balance as the ledger formats it, minus thousands separators.
fn strip_spaces(balance: &str) -> String {
    balance.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Spreadsheet ledger backed by the Sheets REST API.
pub struct SheetsLedger {
    session: Arc<GoogleSession>,
    base_url: Url,
    spreadsheet_id: String,
    sheet_id: i64,
    layout: SheetLayout,
}

impl SheetsLedger {
    /// Creates a ledger for the configured spreadsheet.
    pub fn new(session: Arc<GoogleSession>, settings: &LedgerSettings) -> Result<Self> {
        let base_url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| ProviderError::Internal(format!("bad api url: {}", e)))?;

        Ok(Self {
            session,
            base_url,
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_id: settings.sheet_id,
            layout: settings.layout.clone(),
        })
    }

    /// URL below the API base, with each segment escaped.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        self.url(&[self.spreadsheet_id.as_str(), "values", range])
    }

    fn batch_update_url(&self) -> Result<Url> {
        let endpoint = format!("{}:batchUpdate", self.spreadsheet_id);
        self.url(&[endpoint.as_str()])
    }

    async fn read_grid(&self, tab: &str, top_left: CellRef, bottom_right: CellRef) -> Result<ValueGrid> {
        let range = format!("{}!{}:{}", tab, top_left, bottom_right);
        let url = self.values_url(&range)?;
        let response: ValueRange = self.session.get(url).await?;
        tracing::debug!(range = %range, rows = response.values.len(), "Read sheet values");
        Ok(ValueGrid::new(top_left, response.values))
    }

    async fn find_day_cell(&self, tab: &str, date: &str) -> Result<CellRef> {
        let (top_left, bottom_right) = grid::date_header_range(&self.layout)
            .ok_or_else(|| ProviderError::InvalidRequest("invalid date header layout".to_string()))?;
        let values = self.read_grid(tab, top_left, bottom_right).await?;

        let cell = grid::find_date_cell(&values, &self.layout, date)
            .ok_or_else(|| ProviderError::NotFound(format!("no cell for {} in {}", date, tab)))?;
        tracing::debug!(cell = %cell, "Got date cell");
        Ok(cell)
    }

    async fn write_amount(&self, tab: &str, cell: CellRef, amount: &str) -> Result<()> {
        let range = format!("{}!{}", tab, cell);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = ValueUpdate {
            range: &range,
            values: [[amount]],
        };
        let _: serde_json::Value = self.session.put(url, &body).await?;
        Ok(())
    }

    async fn write_note(&self, cell: CellRef, note: &str) -> Result<()> {
        let body = note_request(cell, self.sheet_id, note);
        let _: serde_json::Value = self.session.post(self.batch_update_url()?, &body).await?;
        Ok(())
    }

    async fn write_entry(&self, tab: &str, entry: &LedgerEntry) -> Result<()> {
        tracing::debug!(cell = %entry.cell, total = %entry.amount, "Entering receipt");
        self.write_amount(tab, entry.cell, &entry.amount).await?;
        self.write_note(entry.cell, &entry.note).await
    }
}

#[async_trait]
impl LedgerStore for SheetsLedger {
    async fn write_batch(&self, batch: &PollingBatch, today: NaiveDate) -> Result<usize> {
        let date = day_label(today);
        let todays = receipts_on(batch, &date);

        if todays.is_empty() {
            tracing::info!(date = %date, "No receipts for today");
            return Ok(0);
        }

        let tab = month_tab(today);
        let first = self
            .find_day_cell(&tab, &date)
            .await?
            .down(self.layout.receipt_row_offset);

        for entry in plan_entries(&todays, first) {
            self.write_entry(&tab, &entry).await?;
        }

        tracing::info!(date = %date, written = todays.len(), "Receipts written to ledger");
        Ok(todays.len())
    }

    async fn weekly_balance(&self, today: NaiveDate) -> Result<String> {
        let layout = &self.layout;
        let invalid = || ProviderError::InvalidRequest("invalid week table layout".to_string());

        let columns = [
            &layout.week_start_column,
            &layout.week_end_column,
            &layout.balance_column,
        ]
        .iter()
        .map(|name| grid::column_index(name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
        let left = *columns.iter().min().ok_or_else(invalid)?;
        let right = *columns.iter().max().ok_or_else(invalid)?;
        let top = *layout.week_rows.iter().min().ok_or_else(invalid)?;
        let bottom = *layout.week_rows.iter().max().ok_or_else(invalid)?;

        let tab = month_tab(today);
        let values = self
            .read_grid(&tab, CellRef::new(left, top), CellRef::new(right, bottom))
            .await?;
        let weeks = grid::week_rows(&values, layout);

        let week = grid::week_for_day(&weeks, today.day()).ok_or_else(|| {
            ProviderError::NotFound(format!("no week containing {} in {}", day_label(today), tab))
        })?;

        let balance = strip_spaces(&week.balance);
        tracing::debug!(row = week.row, balance = %balance, "Got weekly balance");
        Ok(balance)
    }
}
