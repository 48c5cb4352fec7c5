//! Expense CRUD, listing and summary handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use outlay_core::{
    group_by, total, totals_by_category, CategoryTotal, DatePreset, Expense, ExpenseError,
    ExpenseFilter, ExpenseGroup, ExpenseId, GroupMode, Money, NewExpense, UserId,
};

use crate::auth::AuthUser;
use crate::validation::FieldErrors;
use crate::{ApiResponse, AppError, AppState};

/// Query parameters read alongside an [`ExpenseFilter`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub group: Option<GroupMode>,
    /// Fills `start`/`end` when neither is given explicitly.
    pub preset: Option<DatePreset>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExpenseListing {
    Flat(Vec<Expense>),
    Grouped(Vec<ExpenseGroup>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total: Money,
    pub count: usize,
    pub by_category: Vec<CategoryTotal>,
}

fn resolve_filter(mut filter: ExpenseFilter, preset: Option<DatePreset>) -> ExpenseFilter {
    if filter.start.is_none() && filter.end.is_none() {
        if let Some(range) = preset.and_then(|p| p.range(Utc::now().date_naive())) {
            filter.start = Some(range.start);
            filter.end = Some(range.end);
        }
    }
    filter
}

fn invalid_expense(err: ExpenseError) -> AppError {
    let field = match err {
        ExpenseError::NonPositiveAmount(_) => "amount",
        ExpenseError::UnknownCategory(_) => "category",
        ExpenseError::UnknownPaymentMethod(_) => "paymentMethod",
    };
    let mut errors = FieldErrors::new();
    errors.insert(field, vec![err.to_string()]);
    AppError::validation(errors)
}

fn parse_body(payload: Result<Json<NewExpense>, JsonRejection>) -> Result<NewExpense, AppError> {
    let Json(new) = payload.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let new = new.normalized();
    new.validate().map_err(invalid_expense)?;
    Ok(new)
}

async fn filtered(state: &AppState, user: UserId, filter: &ExpenseFilter) -> Vec<Expense> {
    let all = state.store.read().await.expenses_for(user);
    if filter.is_active() {
        filter.apply(&all)
    } else {
        all
    }
}

/// GET /api/expenses - List the caller's expenses, optionally grouped
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    filter: Result<Query<ExpenseFilter>, QueryRejection>,
    options: Result<Query<ListOptions>, QueryRejection>,
) -> Result<Json<ApiResponse<ExpenseListing>>, AppError> {
    let Query(filter) = filter.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let Query(options) = options.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let filter = resolve_filter(filter, options.preset);

    let expenses = filtered(&state, user_id, &filter).await;
    let listing = match options.group {
        Some(mode) => ExpenseListing::Grouped(group_by(&expenses, mode)),
        None => ExpenseListing::Flat(expenses),
    };
    Ok(ApiResponse::new("Expenses fetched", listing))
}

/// GET /api/expenses/summary - Totals over the filtered list
pub async fn expense_summary(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    filter: Result<Query<ExpenseFilter>, QueryRejection>,
    options: Result<Query<ListOptions>, QueryRejection>,
) -> Result<Json<ApiResponse<ExpenseSummary>>, AppError> {
    let Query(filter) = filter.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let Query(options) = options.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let filter = resolve_filter(filter, options.preset);

    let expenses = filtered(&state, user_id, &filter).await;
    Ok(ApiResponse::new(
        "Expense summary",
        ExpenseSummary {
            total: total(&expenses),
            count: expenses.len(),
            by_category: totals_by_category(&expenses),
        },
    ))
}

/// POST /api/expenses - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), AppError> {
    let new = parse_body(payload)?;
    let expense = state.store.write().await.insert_expense(user_id, new);

    info!(user_id = %user_id, expense_id = %expense.id, amount = %expense.amount, "Created expense");
    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Expense created", expense),
    ))
}

/// PUT /api/expenses/{id} - Replace one of the caller's expenses
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    let Path(id) = id.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let new = parse_body(payload)?;

    let expense = state
        .store
        .write()
        .await
        .replace_expense(user_id, ExpenseId(id), new)
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    info!(user_id = %user_id, expense_id = id, "Updated expense");
    Ok(ApiResponse::new("Expense updated", expense))
}

/// DELETE /api/expenses/{id} - Remove one of the caller's expenses
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Expense>>, AppError> {
    let Path(id) = id.map_err(|r| AppError::new(r.status(), r.body_text()))?;

    let expense = state
        .store
        .write()
        .await
        .remove_expense(user_id, ExpenseId(id))
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    info!(user_id = %user_id, expense_id = id, "Deleted expense");
    Ok(ApiResponse::new("Expense deleted", expense))
}
