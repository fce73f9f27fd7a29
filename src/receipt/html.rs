//! HTML helpers for receipt extraction.

use std::sync::OnceLock;

use scraper::{Html, Selector};

fn pre_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("pre").expect("invalid pre selector"))
}

/// Returns every `<pre>` element of `html`, serialized with its tags.
///
/// The opening tag stays on the first line of each block, which is why
/// callers drop that line together with the receipt header. Non-breaking
/// spaces are kept as characters rather than `&nbsp;` so they still split
/// columns.
pub fn preformatted_blocks(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(pre_selector())
        .map(|el| el.html().replace("&nbsp;", "\u{a0}"))
        .collect()
}

/// Splits a serialized `<pre>` block into receipt body lines.
///
/// The first line (opening tag plus header) is discarded.
pub fn receipt_lines(block: &str) -> Vec<&str> {
    block.lines().skip(1).collect()
}
