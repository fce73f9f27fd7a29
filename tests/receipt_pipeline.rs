//! Integration tests for the receipt pipeline.
//!
//! These tests drive the public API the way the daily cycle does: a raw
//! Gmail message goes in, a ledger-ready record comes out. Each module also
//! carries its own unit tests for detailed logic.

use base64::prelude::*;
use chrono::NaiveTime;
use pretty_assertions::assert_eq;

use kvitas::config::{MerchantSettings, SheetLayout, Settings};
use kvitas::domain::{LineItem, MessageId, RawMessage, ReceiptRecord};
use kvitas::providers::ledger::grid::{self, CellRef, ValueGrid};
use kvitas::receipt::{ExtractError, MalformedReceipt, ReceiptExtractor, SkipReason};
use kvitas::services::{summary_text, wait_duration};

// ============================================================================
// Fixtures
// ============================================================================

const MERCHANT_FROM: &str = "\"MAXIMA LT\" <noreply.code.provider@maxima.lt>";

const RECEIPT_HTML: &str = "<html><body>\n\
<pre>MAXIMA LT, UAB\nSavanorių pr. 247, Vilnius</pre>\n\
<pre>Kvitas Nr. 0042                      \n\
Duona ruginė                           \n\
1kg                        1,29 A\n\
Nuolaida                  -0,20 A\n\
Pienas 2,5%                0,89 A\n\
Jogurtas                               \n\
braškių                    0,79 A\n\
Mokėti                     2,77\n\
Kasa 7 Nr. 2019 09 30 21:14\n\
</pre>\n\
</body></html>";

fn multipart_message(from: &str, html: &str) -> String {
    format!(
        "From: {from}\r\n\
         To: me@example.com\r\n\
         Subject: =?UTF-8?Q?J=C5=ABs=C5=B3_kvitas?=\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
         \r\n\
         --b1\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         Jūsų kvitas prisegtas.\r\n\
         --b1\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {}\r\n\
         --b1--\r\n",
        BASE64_STANDARD.encode(html)
    )
}

fn raw(id: &str, message: &str) -> RawMessage {
    RawMessage {
        id: MessageId::from(id),
        encoded_body: BASE64_URL_SAFE_NO_PAD.encode(message),
    }
}

fn extractor() -> ReceiptExtractor {
    ReceiptExtractor::new(MerchantSettings::default())
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn multipart_receipt_becomes_a_record() {
    let message = raw("m1", &multipart_message(MERCHANT_FROM, RECEIPT_HTML));

    let record = extractor().extract(&message).unwrap();
    assert_eq!(
        record,
        ReceiptRecord {
            purchase_date: "2019-09-30".to_string(),
            total_amount: "-2.77".to_string(),
            line_items: vec![
                LineItem::new("Duona ruginė 1kg"),
                LineItem::new("Pienas 2,5%"),
                LineItem::new("Jogurtas braškių"),
            ],
        }
    );
    assert_eq!(record.items_note(), "Duona ruginė 1kg\nPienas 2,5%\nJogurtas braškių");
}

#[test]
fn extraction_is_deterministic() {
    let message = raw("m1", &multipart_message(MERCHANT_FROM, RECEIPT_HTML));
    assert_eq!(extractor().extract(&message), extractor().extract(&message));
}

#[test]
fn other_senders_are_skipped() {
    let message = raw(
        "m2",
        &multipart_message("Shop <receipts@shop.example>", RECEIPT_HTML),
    );
    assert_eq!(
        extractor().extract(&message),
        Err(ExtractError::Skipped(SkipReason::SenderMismatch(
            "receipts@shop.example".to_string()
        )))
    );
}

#[test]
fn merchant_newsletter_is_malformed() {
    let html = "<html><body><h1>Akcijos!</h1><pre>tik viena</pre></body></html>";
    let message = raw("m3", &multipart_message(MERCHANT_FROM, html));
    assert_eq!(
        extractor().extract(&message),
        Err(ExtractError::Malformed(MalformedReceipt::MissingPreBlocks {
            found: 1
        }))
    );
}

#[test]
fn garbage_body_is_skipped() {
    let message = RawMessage {
        id: MessageId::from("m4"),
        encoded_body: "***not base64***".to_string(),
    };
    assert!(matches!(
        extractor().extract(&message),
        Err(ExtractError::Skipped(SkipReason::InvalidBase64(_)))
    ));
}

// ============================================================================
// Ledger Layout Tests
// ============================================================================

#[test]
fn receipt_rows_start_below_the_date_cell() {
    let layout = SheetLayout::default();
    let (top_left, _) = grid::date_header_range(&layout).unwrap();

    let mut rows = vec![Vec::new(); 22];
    rows[21] = vec!["2019-09-30".to_string()];
    let values = ValueGrid::new(top_left, rows);

    let cell = grid::find_date_cell(&values, &layout, "2019-09-30").unwrap();
    assert_eq!(cell, CellRef::parse("H24").unwrap());
    assert_eq!(cell.down(layout.receipt_row_offset).to_string(), "H26");
}

#[test]
fn weekly_balance_row_for_day() {
    let layout = SheetLayout::default();
    let values = ValueGrid::new(
        CellRef::parse("B19").unwrap(),
        vec![
            vec!["2019-09-01".into(), "2019-09-08".into(), "".into(), "50".into()],
            vec!["2019-09-09".into(), "2019-09-15".into(), "".into(), "40".into()],
            vec!["2019-09-16".into(), "2019-09-22".into(), "".into(), "30".into()],
            vec!["2019-09-23".into(), "2019-09-30".into(), "".into(), "1 234,50".into()],
        ],
    );

    let weeks = grid::week_rows(&values, &layout);
    let week = grid::week_for_day(&weeks, 30).unwrap();
    assert_eq!(week.row, 22);
    assert_eq!(week.balance, "1 234,50");
}

// ============================================================================
// Summary and Schedule Tests
// ============================================================================

#[test]
fn summary_email_text() {
    assert_eq!(
        summary_text("1234,50", Some("Tomorrow is another day.")),
        "Labas,\nSavaitės likutis: 1234,50\n\nŠios dienos palinkėjimas: Tomorrow is another day."
    );
}

#[test]
fn default_schedule_waits_for_evening_run() {
    let settings = Settings::default();
    let morning = NaiveTime::from_hms_opt(8, 25, 0).unwrap();
    assert_eq!(
        wait_duration(morning, settings.schedule.start_time).as_secs(),
        14 * 3600
    );
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "ledger": { "spreadsheet_id": "abc", "sheet_id": 42 },
            "notification": { "from": "bot@example.com", "to": "me@example.com" },
            "schedule": { "start_time": "06:30:00" }
        }"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.ledger.spreadsheet_id, "abc");
    assert_eq!(settings.ledger.sheet_id, 42);
    assert_eq!(settings.schedule.start_time, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
    assert_eq!(settings.mailbox.window, 30);
    assert!(settings.validate().is_ok());
}
