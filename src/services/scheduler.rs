//! Daily scheduler.
//!
//! Runs one cycle per day at a fixed local start time. A failed cycle is
//! logged and the next one is armed as usual.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime};

use super::CycleService;
use crate::config::ScheduleSettings;

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Time from `now` until the next occurrence of `start`.
///
/// The next occurrence is strictly in the future: at exactly `start` the
/// wait is a full day.
pub fn wait_duration(now: NaiveTime, start: NaiveTime) -> Duration {
    let mut secs = start.signed_duration_since(now).num_seconds();
    if secs <= 0 {
        secs += SECONDS_PER_DAY;
    }
    Duration::from_secs(secs as u64)
}

/// Drives [`CycleService`] on a daily schedule.
pub struct Scheduler {
    cycle: Arc<CycleService>,
    settings: ScheduleSettings,
}

impl Scheduler {
    /// Creates a scheduler for `cycle`.
    pub fn new(cycle: Arc<CycleService>, settings: ScheduleSettings) -> Self {
        Self { cycle, settings }
    }

    /// Runs one cycle and logs its outcome. Returns whether it succeeded.
    async fn run_logged(&self) -> bool {
        match self.cycle.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    written = report.records_written,
                    balance = %report.balance,
                    "Scheduled cycle succeeded"
                );
                true
            }
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Cycle failed, next cycle stays armed");
                false
            }
        }
    }

    /// Runs until `shutdown` completes.
    ///
    /// Shutdown is only observed while waiting; a running cycle is allowed
    /// to finish.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.settings.run_on_start {
            tracing::info!("Running startup cycle");
            self.run_logged().await;
        }

        loop {
            let wait = wait_duration(Local::now().time(), self.settings.start_time);
            tracing::info!(
                start_time = %self.settings.start_time,
                wait_secs = wait.as_secs(),
                "Waiting for start time"
            );

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            self.run_logged().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MerchantSettings, NotificationSettings};
    use crate::providers::email::MockMailboxProvider;
    use crate::providers::ledger::MockLedgerStore;
    use crate::providers::ProviderError;
    use crate::receipt::ReceiptExtractor;
    use crate::services::{NotificationService, PollingService, RetryPolicy};

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn waits_until_later_today() {
        assert_eq!(
            wait_duration(time(22, 0, 0), time(22, 25, 0)),
            Duration::from_secs(25 * 60)
        );
    }

    #[test]
    fn wraps_to_tomorrow() {
        assert_eq!(
            wait_duration(time(22, 25, 1), time(22, 25, 0)),
            Duration::from_secs(24 * 3600 - 1)
        );
        assert_eq!(
            wait_duration(time(23, 59, 59), time(0, 0, 0)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn exact_start_time_waits_a_full_day() {
        assert_eq!(
            wait_duration(time(22, 25, 0), time(22, 25, 0)),
            Duration::from_secs(24 * 3600)
        );
    }

    fn failing_cycle() -> Arc<CycleService> {
        let mut mailbox = MockMailboxProvider::new();
        mailbox
            .expect_list_recent()
            .times(1)
            .returning(|_| Err(ProviderError::Connection("offline".to_string())));
        let mailbox = Arc::new(mailbox);

        let polling = PollingService::new(
            mailbox.clone(),
            ReceiptExtractor::new(MerchantSettings::default()),
            30,
            RetryPolicy::none(),
        );
        let notification = NotificationService::new(
            mailbox,
            None,
            NotificationSettings::default(),
            RetryPolicy::none(),
        );
        Arc::new(CycleService::new(
            polling,
            Arc::new(MockLedgerStore::new()),
            notification,
            RetryPolicy::none(),
        ))
    }

    #[tokio::test]
    async fn failed_startup_cycle_does_not_stop_the_loop() {
        let scheduler = Scheduler::new(
            failing_cycle(),
            ScheduleSettings {
                run_on_start: true,
                ..ScheduleSettings::default()
            },
        );

        // The loop keeps going after the failure and exits on shutdown.
        scheduler.run(std::future::ready(())).await;
    }

    #[tokio::test]
    async fn shutdown_while_waiting() {
        let mut mailbox = MockMailboxProvider::new();
        mailbox.expect_list_recent().times(0);
        let mailbox = Arc::new(mailbox);
        let cycle = Arc::new(CycleService::new(
            PollingService::new(
                mailbox.clone(),
                ReceiptExtractor::new(MerchantSettings::default()),
                30,
                RetryPolicy::none(),
            ),
            Arc::new(MockLedgerStore::new()),
            NotificationService::new(mailbox, None, NotificationSettings::default(), RetryPolicy::none()),
            RetryPolicy::none(),
        ));

        let scheduler = Scheduler::new(
            cycle,
            ScheduleSettings {
                run_on_start: false,
                ..ScheduleSettings::default()
            },
        );
        scheduler.run(std::future::ready(())).await;
    }
}
