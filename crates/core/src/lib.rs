pub mod expense;
pub mod filter;
pub mod money;
pub mod period;
pub mod summary;

pub use expense::{Category, Expense, ExpenseError, ExpenseId, NewExpense, PaymentMethod, UserId};
pub use filter::ExpenseFilter;
pub use money::Money;
pub use period::{bucket_key, group_by, DatePreset, DateRange, ExpenseGroup, GroupMode};
pub use summary::{total, totals_by_category, CategoryTotal};
