use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpenseError {
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Money),
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),
    #[error("Unknown payment method: '{0}'")]
    UnknownPaymentMethod(String),
}

/// Spending categories. The wire names are kept verbatim (`Mobile_Bill`, `EMI`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Groceries,
    #[serde(rename = "Mobile_Bill")]
    MobileBill,
    Travel,
    Shopping,
    Games,
    Subscription,
    #[serde(rename = "EMI")]
    Emi,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Groceries,
        Category::MobileBill,
        Category::Travel,
        Category::Shopping,
        Category::Games,
        Category::Subscription,
        Category::Emi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Groceries => "Groceries",
            Category::MobileBill => "Mobile_Bill",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Games => "Games",
            Category::Subscription => "Subscription",
            Category::Emi => "EMI",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ExpenseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ExpenseError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    DebitCard,
    Upi,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Upi => "UPI",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ExpenseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "DEBIT_CARD" => Ok(PaymentMethod::DebitCard),
            "UPI" => Ok(PaymentMethod::Upi),
            other => Err(ExpenseError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// A stored expense, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub category: Category,
    pub amount: Money,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub payment_method: PaymentMethod,
}

/// Client-supplied fields for creating or replacing an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub category: Category,
    pub amount: Money,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ExpenseError> {
        if !self.amount.is_positive() {
            return Err(ExpenseError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }

    /// Rounds the amount to cents and drops a blank description.
    pub fn normalized(mut self) -> Self {
        self.amount = Money::from_decimal(self.amount.as_decimal());
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    pub fn into_expense(self, id: ExpenseId, user_id: UserId) -> Expense {
        Expense {
            id,
            user_id,
            category: self.category,
            amount: self.amount,
            description: self.description,
            date: self.date,
            is_recurring: self.is_recurring,
            payment_method: self.payment_method,
        }
    }
}
