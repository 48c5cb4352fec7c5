use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::expense::{Category, Expense, PaymentMethod};
use crate::money::Money;

/// Criteria for narrowing an expense list. Unset fields match everything;
/// all bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseFilter {
    /// Case-insensitive substring of the description or category name.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub is_recurring: Option<bool>,
}

impl ExpenseFilter {
    pub fn is_active(&self) -> bool {
        self.search_query().is_some()
            || self.category.is_some()
            || self.payment_method.is_some()
            || self.start.is_some()
            || self.end.is_some()
            || self.min_amount.is_some()
            || self.max_amount.is_some()
            || self.is_recurring.is_some()
    }

    fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(query) = self.search_query() {
            let in_description = expense
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query));
            let in_category = expense.category.as_str().to_lowercase().contains(&query);
            if !in_description && !in_category {
                return false;
            }
        }

        if self.category.is_some_and(|c| c != expense.category) {
            return false;
        }
        if self.payment_method.is_some_and(|m| m != expense.payment_method) {
            return false;
        }
        if self.start.is_some_and(|s| expense.date < s) {
            return false;
        }
        if self.end.is_some_and(|e| expense.date > e) {
            return false;
        }
        if self.min_amount.is_some_and(|min| expense.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| expense.amount > max) {
            return false;
        }
        if self.is_recurring.is_some_and(|r| r != expense.is_recurring) {
            return false;
        }
        true
    }

    pub fn apply(&self, expenses: &[Expense]) -> Vec<Expense> {
        expenses.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}
