//! Application settings and configuration types.
//!
//! Settings are read from `$KVITAS_CONFIG` when set, otherwise from
//! `~/.config/kvitas/settings.json` (or the platform equivalent). A missing
//! file yields the defaults; every section may be omitted or partial.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "KVITAS_CONFIG";

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// The settings file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A required value is missing or out of range.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Which sender is treated as the merchant and how its receipts look.
    pub merchant: MerchantSettings,
    /// Mailbox polling window.
    pub mailbox: MailboxSettings,
    /// Spreadsheet ledger location and layout.
    pub ledger: LedgerSettings,
    /// Daily summary email.
    pub notification: NotificationSettings,
    /// Daily schedule.
    pub schedule: ScheduleSettings,
    /// Retry policy for mailbox, ledger and HTTP calls.
    pub retry: RetrySettings,
    /// Fortune-of-the-day source.
    pub fortune: FortuneSettings,
    /// Google account credentials lookup.
    pub google: GoogleSettings,
}

impl Settings {
    /// Returns the default settings file path.
    ///
    /// `$KVITAS_CONFIG` wins over the platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(custom) = std::env::var(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(custom));
        }

        directories::ProjectDirs::from("", "", "kvitas")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads settings from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path()?)
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that the values needed for an unattended run are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merchant.sender_address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "merchant.sender_address",
                reason: "must not be empty".to_string(),
            });
        }
        let format = &self.merchant.format;
        for (field, marker) in [
            ("merchant.format.amount_due_marker", &format.amount_due_marker),
            ("merchant.format.discount_marker", &format.discount_marker),
            ("merchant.format.tax_suffix", &format.tax_suffix),
        ] {
            if marker.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if format.trailing_columns == 0 {
            return Err(ConfigError::Invalid {
                field: "merchant.format.trailing_columns",
                reason: "must be at least 1".to_string(),
            });
        }
        if format.date_token_start >= format.date_token_end {
            return Err(ConfigError::Invalid {
                field: "merchant.format.date_token_end",
                reason: format!(
                    "must be greater than date_token_start ({})",
                    format.date_token_start
                ),
            });
        }
        if self.mailbox.window == 0 {
            return Err(ConfigError::Invalid {
                field: "mailbox.window",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.ledger.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ledger.spreadsheet_id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.notification.enabled && self.notification.from.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "notification.from",
                reason: "required when notifications are enabled".to_string(),
            });
        }
        if self.notification.enabled && self.notification.to.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "notification.to",
                reason: "required when notifications are enabled".to_string(),
            });
        }
        let layout = &self.ledger.layout;
        for (field, column) in [
            ("ledger.layout.first_day_column", &layout.first_day_column),
            ("ledger.layout.last_day_column", &layout.last_day_column),
            ("ledger.layout.week_start_column", &layout.week_start_column),
            ("ledger.layout.week_end_column", &layout.week_end_column),
            ("ledger.layout.balance_column", &layout.balance_column),
        ] {
            if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{:?} is not a column name", column),
                });
            }
        }
        if layout.date_rows.is_empty() || layout.date_rows.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "ledger.layout.date_rows",
                reason: "must list at least one row, rows start at 1".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// The merchant whose receipts are extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantSettings {
    /// Exact sender address receipts arrive from.
    pub sender_address: String,
    /// Tokens of the merchant's receipt layout.
    pub format: ReceiptFormat,
}

impl Default for MerchantSettings {
    fn default() -> Self {
        Self {
            sender_address: "noreply.code.provider@maxima.lt".to_string(),
            format: ReceiptFormat::default(),
        }
    }
}

/// Fixed tokens of the merchant's plain-text receipt layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptFormat {
    /// Marker found on the line carrying the amount due.
    pub amount_due_marker: String,
    /// Prefix of discount lines.
    pub discount_marker: String,
    /// Trailing token marking a priced (taxed) item line.
    pub tax_suffix: String,
    /// Number of trailing price/quantity tokens dropped from descriptions.
    pub trailing_columns: usize,
    /// First whitespace token of the date line that belongs to the date.
    pub date_token_start: usize,
    /// One past the last date token.
    pub date_token_end: usize,
}

impl Default for ReceiptFormat {
    fn default() -> Self {
        Self {
            amount_due_marker: "Mokėti".to_string(),
            discount_marker: "Nuolaida".to_string(),
            tax_suffix: "A".to_string(),
            trailing_columns: 2,
            date_token_start: 3,
            date_token_end: 6,
        }
    }
}

/// Mailbox polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxSettings {
    /// Mailbox user ID; `me` is the authenticated account.
    pub user_id: String,
    /// Number of most recent messages inspected per cycle.
    pub window: u32,
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            user_id: "me".to_string(),
            window: 30,
        }
    }
}

/// Spreadsheet ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Spreadsheet ID from the sheet URL.
    pub spreadsheet_id: String,
    /// Numeric sheet (tab) ID notes are attached to.
    pub sheet_id: i64,
    /// Cell layout of the monthly tab.
    pub layout: SheetLayout,
}

/// Where things live on a monthly ledger tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Rows holding the day-of-week date headers, one per week.
    pub date_rows: Vec<u32>,
    /// First column of the date headers.
    pub first_day_column: String,
    /// Last column of the date headers.
    pub last_day_column: String,
    /// Rows between a date header and the first receipt row below it.
    pub receipt_row_offset: u32,
    /// Rows of the weekly summary table.
    pub week_rows: Vec<u32>,
    /// Column holding each week's start date.
    pub week_start_column: String,
    /// Column holding each week's end date.
    pub week_end_column: String,
    /// Column holding each week's remaining balance.
    pub balance_column: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            date_rows: vec![3, 10, 17, 24],
            first_day_column: "H".to_string(),
            last_day_column: "N".to_string(),
            receipt_row_offset: 2,
            week_rows: vec![19, 20, 21, 22],
            week_start_column: "B".to_string(),
            week_end_column: "C".to_string(),
            balance_column: "E".to_string(),
        }
    }
}

/// Daily summary email configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Whether the summary is sent at all.
    pub enabled: bool,
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            from: String::new(),
            to: String::new(),
            subject: "FINANSAI: Likęs balansas savaitei".to_string(),
        }
    }
}

/// Daily schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Local time of day each cycle starts.
    pub start_time: NaiveTime,
    /// Whether to run one cycle immediately at startup.
    pub run_on_start: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            start_time: NaiveTime::from_hms_opt(22, 25, 0).unwrap_or_default(),
            run_on_start: true,
        }
    }
}

/// Retry policy for transport calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds.
    pub initial_delay_seconds: u64,
    /// Upper bound on the delay between retries, in seconds.
    pub max_delay_seconds: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_seconds: 2,
            max_delay_seconds: 60,
        }
    }
}

/// Fortune-of-the-day source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FortuneSettings {
    /// Whether a fortune is included in the summary.
    pub enabled: bool,
    /// Base URL; the page number is appended as a path segment.
    pub base_url: String,
    /// Highest fortune page number.
    pub max_page: u32,
    /// Pages tried before giving up.
    pub max_attempts: u32,
}

impl Default for FortuneSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://www.myfortunecookie.co.uk/fortunes".to_string(),
            max_page: 152,
            max_attempts: 5,
        }
    }
}

/// Google OAuth credentials lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Keychain account the credentials are stored under.
    pub keychain_account: String,
    /// JSON credentials file read instead of the keychain when set.
    pub credentials_file: Option<PathBuf>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            keychain_account: "default".to_string(),
            credentials_file: None,
        }
    }
}
