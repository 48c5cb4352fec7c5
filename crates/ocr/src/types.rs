use outlay_core::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of reading a receipt: the best-guess total plus the OCR text it
/// came from, passed through untouched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptScan {
    /// `None` when the text holds no amount at all; the user enters it by hand.
    pub total: Option<Decimal>,
    pub raw_text: String,
}

impl ReceiptScan {
    /// The total as a pre-fill value for the expense form.
    pub fn suggested_amount(&self) -> Option<Money> {
        self.total.map(Money::from_decimal)
    }
}
