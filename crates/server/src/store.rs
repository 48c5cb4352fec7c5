//! In-process user and expense store, shared behind the app state's lock.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use outlay_core::{Expense, ExpenseId, NewExpense, UserId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("User {0} not found")]
    UserNotFound(UserId),
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user; never carries credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    users: BTreeMap<UserId, User>,
    expenses: BTreeMap<ExpenseId, Expense>,
    last_user_id: i64,
    last_expense_id: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users ─────────────────────────────────────────────────────────────────

    pub fn insert_user(
        &mut self,
        username: &str,
        email: &str,
        password_hash: String,
    ) -> Result<&User, StoreError> {
        let email = normalize_email(email);
        if self.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        self.last_user_id += 1;
        let id = UserId(self.last_user_id);
        let user = User {
            id,
            username: username.to_string(),
            email,
            password_hash,
            refresh_token_hash: None,
            created_at: Utc::now(),
        };
        Ok(self.users.entry(id).or_insert(user))
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Case-insensitive lookup.
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users.values().find(|u| u.email == email)
    }

    pub fn set_refresh_hash(&mut self, id: UserId, hash: Option<String>) -> Result<(), StoreError> {
        let user = self.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;
        user.refresh_token_hash = hash;
        Ok(())
    }

    /// Swap the stored refresh digest for `next` only if it currently equals
    /// `presented`. Returns whether the swap happened.
    pub fn rotate_refresh_hash(&mut self, id: UserId, presented: &str, next: String) -> bool {
        match self.users.get_mut(&id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(presented) => {
                user.refresh_token_hash = Some(next);
                true
            }
            _ => false,
        }
    }

    // ── Expenses ──────────────────────────────────────────────────────────────

    /// A user's expenses, newest date first; ties broken by newest id.
    pub fn expenses_for(&self, user: UserId) -> Vec<Expense> {
        let mut list: Vec<Expense> = self
            .expenses
            .values()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        list
    }

    pub fn insert_expense(&mut self, user: UserId, new: NewExpense) -> Expense {
        self.last_expense_id += 1;
        let id = ExpenseId(self.last_expense_id);
        let expense = new.into_expense(id, user);
        self.expenses.insert(id, expense.clone());
        expense
    }

    /// Replace an expense the user owns. `None` when it does not exist or
    /// belongs to someone else.
    pub fn replace_expense(&mut self, user: UserId, id: ExpenseId, new: NewExpense) -> Option<Expense> {
        let slot = self.expenses.get_mut(&id).filter(|e| e.user_id == user)?;
        *slot = new.into_expense(id, user);
        Some(slot.clone())
    }

    pub fn remove_expense(&mut self, user: UserId, id: ExpenseId) -> Option<Expense> {
        if self.expenses.get(&id)?.user_id != user {
            return None;
        }
        self.expenses.remove(&id)
    }
}
