use serde::{Deserialize, Serialize};

use crate::expense::{Category, Expense};
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Money,
    pub count: usize,
}

pub fn total(expenses: &[Expense]) -> Money {
    expenses.iter().map(|e| e.amount).sum()
}

/// Per-category totals in order of each category's first appearance.
pub fn totals_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(t) => {
                t.total = t.total + expense.amount;
                t.count += 1;
            }
            None => totals.push(CategoryTotal {
                category: expense.category,
                total: expense.amount,
                count: 1,
            }),
        }
    }
    totals
}
