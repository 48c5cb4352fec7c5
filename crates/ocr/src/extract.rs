use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::types::ReceiptScan;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// An amount always ends in a separator plus exactly two digits, which keeps
// dates (2024-05-20) and phone numbers (555-0199) out. ASCII digits only.
re!(re_amount,
    r"[$€£]?\s*([0-9]{1,3}(?:[.,][0-9]{3})*[.,][0-9]{2})");
re!(re_number_prefix,
    r"^[0-9]+(?:\.[0-9]+)?");
re!(re_subtotal,
    r"sub\s*-?\s*total");

const TOTAL_KEYWORDS: [&str; 5] = ["total", "amount", "due", "balance", "grand total"];

// ── Public extraction API ─────────────────────────────────────────────────────

/// Pick the amount actually paid out of raw receipt OCR text.
///
/// Lines are scanned bottom-up; the first one carrying a total keyword and
/// an amount wins, taking its rightmost amount. Subtotal lines and tax/VAT
/// lines that don't also say "total" are passed over. With no such line the
/// largest amount anywhere in the text is used. Never fails: text without a
/// single amount yields `total: None`.
pub fn parse_receipt(text: &str) -> ReceiptScan {
    let total = labeled_total(text).or_else(|| amounts(text).max());
    ReceiptScan {
        total,
        raw_text: text.to_string(),
    }
}

fn labeled_total(text: &str) -> Option<Decimal> {
    text.lines().rev().find_map(|line| {
        let lower = line.to_lowercase();
        if re_subtotal().is_match(&lower) {
            return None;
        }
        let mentions_tax = lower.contains("tax") || lower.contains("vat");
        if mentions_tax && !lower.contains("total") {
            return None;
        }
        if !TOTAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return None;
        }
        amounts(line).last()
    })
}

/// Every candidate amount in `text`, in order of appearance.
fn amounts(text: &str) -> impl Iterator<Item = Decimal> + '_ {
    re_amount()
        .captures_iter(text)
        .filter_map(|c| parse_amount(c.get(1)?.as_str()))
}

// ── Amount parsing ────────────────────────────────────────────────────────────

/// Normalize `1,200.50` / `1.200,50` / `12,99` style tokens.
///
/// A token ending in `,dd` is comma-decimal: dots are grouping and the first
/// comma becomes the decimal point. Anything else is dot-decimal with commas
/// as grouping. The longest leading `digits[.digits]` run is the value, so
/// `1.200.50` reads as 1.2. Values too large for `Decimal` saturate at
/// `Decimal::MAX`.
fn parse_amount(token: &str) -> Option<Decimal> {
    let clean: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let comma_decimal = matches!(
        clean.as_bytes(),
        [.., b',', a, b] if a.is_ascii_digit() && b.is_ascii_digit()
    );
    let normalized = if comma_decimal {
        clean.replace('.', "").replacen(',', ".", 1)
    } else {
        clean.replace(',', "")
    };

    let number = re_number_prefix().find(&normalized)?.as_str();
    Some(to_decimal(number))
}

fn to_decimal(number: &str) -> Decimal {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    // Decimal carries 28 significant digits; drop fraction digits beyond that.
    let keep = 28usize.saturating_sub(whole.len()).min(fraction.len());
    let trimmed = if keep == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{}", &fraction[..keep])
    };
    Decimal::from_str(&trimmed).unwrap_or(Decimal::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
