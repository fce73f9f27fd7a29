//! One end-to-end cycle: poll, write, read the balance, notify.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{NotificationService, PollingService, RetryPolicy};
use crate::providers::ledger::LedgerStore;

/// Result of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Messages listed from the mailbox.
    pub messages_seen: usize,
    /// Receipt records built from them.
    pub records_built: usize,
    /// Messages skipped before parsing.
    pub skipped: usize,
    /// Merchant messages whose receipt did not parse.
    pub malformed: usize,
    /// Records written to the ledger (today's receipts only).
    pub records_written: usize,
    /// Remaining weekly balance, as shown in the ledger.
    pub balance: String,
    /// ID of the summary email, if one was sent.
    pub notification_id: Option<String>,
    /// Duration of the cycle.
    pub duration_ms: u64,
}

/// Runs cycles against the mailbox and ledger.
pub struct CycleService {
    polling: PollingService,
    ledger: Arc<dyn LedgerStore>,
    notification: NotificationService,
    retry: RetryPolicy,
}

impl CycleService {
    /// Creates a cycle service from its parts.
    pub fn new(
        polling: PollingService,
        ledger: Arc<dyn LedgerStore>,
        notification: NotificationService,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            polling,
            ledger,
            notification,
            retry,
        }
    }

    /// Runs a cycle for the current local date.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_on(Local::now().date_naive()).await
    }

    /// Runs a cycle as if `today` were the current date.
    pub async fn run_cycle_on(&self, today: NaiveDate) -> Result<CycleReport> {
        let start = Instant::now();
        tracing::info!(date = %today, "Starting to get receipts");

        let outcome = self.polling.poll().await?;

        tracing::info!(receipts = outcome.batch.len(), "Writing receipts to ledger");
        let records_written = self
            .retry
            .run("write ledger", || self.ledger.write_batch(&outcome.batch, today))
            .await
            .context("writing receipts to ledger")?;

        let balance = self
            .retry
            .run("read balance", || self.ledger.weekly_balance(today))
            .await
            .context("reading weekly balance")?;

        let notification_id = self.notification.send_summary(&balance).await?;

        let report = CycleReport {
            messages_seen: outcome.messages_seen,
            records_built: outcome.batch.len(),
            skipped: outcome.skipped,
            malformed: outcome.malformed,
            records_written,
            balance,
            notification_id,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            written = report.records_written,
            malformed = report.malformed,
            balance = %report.balance,
            duration_ms = report.duration_ms,
            "Cycle completed"
        );
        Ok(report)
    }
}
