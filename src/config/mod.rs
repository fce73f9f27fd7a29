//! Configuration and settings management.
//!
//! Settings are loaded once at startup and passed by reference to every
//! component that needs them.

mod settings;

pub use settings::{
    ConfigError, FortuneSettings, GoogleSettings, LedgerSettings, MailboxSettings,
    MerchantSettings, NotificationSettings, ReceiptFormat, RetrySettings, ScheduleSettings,
    Settings, SheetLayout,
};
