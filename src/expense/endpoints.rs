//! Route handlers for recording expenses and paying for them.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    database_id::{ExpenseId, MemberId},
    endpoints::{self, format_endpoint},
    expense::{
        AllowanceDeduction, Expense, NewExpense, PoolPayment, create_expense, deduct_from_allowance,
        deduct_from_pool, get_expense,
    },
    period::Month,
    timezone::local_today,
};

/// The request body for recording an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The member who fronted the money.
    pub paid_by_id: MemberId,
    /// The amount spent.
    pub amount: f64,
    /// What the money was spent on.
    #[serde(default)]
    pub description: String,
    /// When the money was spent, defaults to today.
    pub date: Option<Date>,
}

/// The request body for paying an expense from the pool.
#[derive(Debug, Default, Deserialize)]
pub struct PoolPaymentForm {
    /// Defaults to the full expense amount.
    pub amount: Option<f64>,
}

/// The request body for paying from a personal allowance.
#[derive(Debug, Deserialize)]
pub struct AllowanceDeductionForm {
    /// The member whose allowance pays.
    pub member_id: MemberId,
    /// The amount to pay.
    pub amount: f64,
    /// The allowance month, defaults to the current month.
    pub month: Option<Month>,
}

/// A route handler for recording an expense.
///
/// Responds with `201 Created` and the location of the new expense.
pub async fn create_expense_endpoint(
    State(state): State<AppState>,
    Json(form): Json<ExpenseForm>,
) -> Result<impl IntoResponse, Error> {
    let date = match form.date {
        Some(date) => date,
        None => local_today(&state.local_timezone)?,
    };

    let connection = state.connection()?;

    let expense = create_expense(
        NewExpense {
            paid_by_id: form.paid_by_id,
            amount: form.amount,
            description: form.description,
            date,
        },
        &connection,
    )?;

    let location = format_endpoint(endpoints::EXPENSE, expense.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(expense)))
}

/// A route handler for getting a single expense.
pub async fn get_expense_endpoint(
    State(state): State<AppState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = state.connection()?;

    get_expense(expense_id, &connection).map(Json)
}

/// A route handler for paying an expense out of the pool.
pub async fn pay_from_pool_endpoint(
    State(state): State<AppState>,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<PoolPaymentForm>,
) -> Result<Json<PoolPayment>, Error> {
    let connection = state.connection()?;

    let amount = match form.amount {
        Some(amount) => amount,
        None => get_expense(expense_id, &connection)?.amount,
    };

    deduct_from_pool(expense_id, amount, &connection).map(Json)
}

/// A route handler for paying out of a personal allowance.
pub async fn deduct_from_allowance_endpoint(
    State(state): State<AppState>,
    Json(form): Json<AllowanceDeductionForm>,
) -> Result<Json<AllowanceDeduction>, Error> {
    let month = match form.month {
        Some(month) => month,
        None => state.current_month()?,
    };

    let connection = state.connection()?;

    deduct_from_allowance(form.member_id, form.amount, month, &connection).map(Json)
}
