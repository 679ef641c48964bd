//! Route handlers for reimbursements.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::{ExpenseId, MemberId, ReimbursementId},
    expense::get_expense,
    period::Month,
    reimbursement::{
        Reimbursement, create_reimbursement, get_reimbursement, settle_reimbursement,
        unsettle_reimbursement,
    },
    timezone::local_now,
};

/// The request body for creating a reimbursement.
///
/// Missing fields are taken from the expense.
#[derive(Debug, Default, Deserialize)]
pub struct ReimbursementForm {
    /// Defaults to the member who paid the expense.
    pub member_id: Option<MemberId>,
    /// Defaults to the expense amount.
    pub amount: Option<f64>,
    /// Defaults to the expense description.
    pub description: Option<String>,
    /// Defaults to the month of the expense date.
    pub month: Option<Month>,
}

/// A route handler for marking an expense as owed back to a member.
pub async fn create_reimbursement_endpoint(
    State(state): State<AppState>,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<ReimbursementForm>,
) -> Result<(StatusCode, Json<Reimbursement>), Error> {
    let connection = state.connection()?;
    let expense = get_expense(expense_id, &connection)?;

    let reimbursement = create_reimbursement(
        expense_id,
        form.member_id.unwrap_or(expense.paid_by_id),
        form.amount.unwrap_or(expense.amount),
        form.description.as_deref().unwrap_or(&expense.description),
        form.month.unwrap_or_else(|| Month::from_date(expense.date)),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(reimbursement)))
}

/// A route handler for getting a single reimbursement.
pub async fn get_reimbursement_endpoint(
    State(state): State<AppState>,
    Path(reimbursement_id): Path<ReimbursementId>,
) -> Result<Json<Reimbursement>, Error> {
    let connection = state.connection()?;

    get_reimbursement(reimbursement_id, &connection).map(Json)
}

/// A route handler for paying back a reimbursement from the pool.
pub async fn settle_reimbursement_endpoint(
    State(state): State<AppState>,
    Path(reimbursement_id): Path<ReimbursementId>,
) -> Result<Json<Reimbursement>, Error> {
    let now = local_now(&state.local_timezone)?;
    let connection = state.connection()?;

    settle_reimbursement(reimbursement_id, now, &connection).map(Json)
}

/// A route handler for reversing a reimbursement settlement.
pub async fn unsettle_reimbursement_endpoint(
    State(state): State<AppState>,
    Path(reimbursement_id): Path<ReimbursementId>,
) -> Result<Json<Reimbursement>, Error> {
    let connection = state.connection()?;

    unsettle_reimbursement(reimbursement_id, &connection).map(Json)
}
