//! Services layer.
//!
//! Services orchestrate the receipt pipeline against the providers:
//!
//! ```text
//!   Scheduler (daily start time)
//!        |
//!        v
//!   CycleService --> PollingService --> MailboxProvider + ReceiptExtractor
//!        |       \
//!        |        --> LedgerStore (write, weekly balance)
//!        v
//!   NotificationService --> FortuneSource, MailboxProvider
//! ```
//!
//! - [`PollingService`]: lists, fetches and extracts one batch of receipts
//! - [`CycleService`]: runs one poll-write-notify cycle
//! - [`NotificationService`]: composes and sends the daily summary
//! - [`Scheduler`]: runs cycles once a day
//! - [`RetryPolicy`]: bounded backoff for transient provider errors

mod cycle_service;
mod notification_service;
mod polling_service;
mod retry;
mod scheduler;

pub use cycle_service::{CycleReport, CycleService};
pub use notification_service::{summary_text, NotificationService};
pub use polling_service::{PollOutcome, PollingService};
pub use retry::RetryPolicy;
pub use scheduler::{wait_duration, Scheduler};
