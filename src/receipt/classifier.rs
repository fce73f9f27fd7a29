//! Receipt line classification and item assembly.
//!
//! The receipt body is a fixed-width table. An item's description may wrap
//! onto a second line, and the line carrying the price ends with the tax
//! suffix. Each line is classified on its own by [`classify`]; [`assemble`]
//! folds the classified lines into items while carrying at most one pending
//! description between lines.

use crate::config::ReceiptFormat;
use crate::domain::LineItem;

/// What a single receipt line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Carries the amount due as its last token.
    Total(&'a str),
    /// A discount adjustment. Contributes nothing.
    Discount,
    /// First half of an item description.
    Continuation,
    /// Completes an item and carries its price columns.
    Terminal,
}

/// Classifies one receipt line.
///
/// The checks run in a fixed order: total, discount, continuation, terminal.
/// Discount lines are recognised before the tax suffix is looked at, so a
/// discount can never become the first half of the next item.
pub fn classify<'a>(line: &'a str, format: &ReceiptFormat) -> LineKind<'a> {
    let trimmed = line.trim();

    if trimmed.contains(format.amount_due_marker.as_str()) {
        let amount = trimmed.split_whitespace().last().unwrap_or_default();
        return LineKind::Total(amount);
    }

    if line.starts_with(format.discount_marker.as_str()) {
        return LineKind::Discount;
    }

    if !has_tax_suffix(line, &format.tax_suffix) {
        return LineKind::Continuation;
    }

    LineKind::Terminal
}

fn has_tax_suffix(line: &str, suffix: &str) -> bool {
    // Trailing padding is ignored: `1,29 A   ` is a terminal line.
    line.trim_end()
        .strip_suffix(suffix)
        .is_some_and(|rest| rest.ends_with(char::is_whitespace))
}

/// Assembler state carried from one line to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Pending {
    #[default]
    AwaitingContinuation,
    HaveDescription(String),
}

/// Result of folding a receipt body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    /// Amount due with the negation marker, as printed (`-15,30`).
    pub total_amount: Option<String>,
    /// Items in receipt order.
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Default)]
struct Accumulator {
    pending: Pending,
    assembled: Assembled,
}

/// Folds receipt body lines into a total and an ordered item list.
///
/// If more than one line carries the amount-due marker, the first wins.
pub fn assemble<'a, I>(lines: I, format: &ReceiptFormat) -> Assembled
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .fold(Accumulator::default(), |mut acc, line| {
            match classify(line, format) {
                LineKind::Total(amount) => {
                    if acc.assembled.total_amount.is_none() {
                        acc.assembled.total_amount = Some(format!("-{amount}"));
                    } else {
                        tracing::debug!(line, "Ignoring additional amount due line");
                    }
                }
                LineKind::Discount => {}
                LineKind::Continuation => {
                    acc.pending = Pending::HaveDescription(line.to_string());
                }
                LineKind::Terminal => {
                    let joined = match std::mem::take(&mut acc.pending) {
                        Pending::HaveDescription(prefix) => format!("{prefix} {line}"),
                        Pending::AwaitingContinuation => line.to_string(),
                    };
                    let description = drop_trailing_tokens(&joined, format.trailing_columns);
                    acc.assembled.line_items.push(LineItem::new(description));
                }
            }
            acc
        })
        .assembled
}

/// Drops the last `count` whitespace tokens and rejoins the rest with single spaces.
fn drop_trailing_tokens(text: &str, count: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let keep = tokens.len().saturating_sub(count);
    tokens[..keep].join(" ")
}
