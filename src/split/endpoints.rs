//! Route handlers for splitting expenses and settling debts between members.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::{ExpenseId, MemberId},
    expense::get_expense,
    split::{
        DebtSettlement, ExpenseSplit, MemberBalance, SplitConfig, SplitType,
        calculate_individual_balances, create_expense_splits, get_expense_splits, get_split_configs,
        set_split_config, settle_debts,
    },
};

/// The request body for splitting an expense.
#[derive(Debug, Deserialize)]
pub struct SplitForm {
    /// How to divide the expense.
    pub split_type: SplitType,
    /// The amount to divide, defaults to the full expense amount.
    pub amount: Option<f64>,
}

/// The request body for settling the debts between two members.
#[derive(Debug, Deserialize)]
pub struct DebtSettlementForm {
    /// One of the members.
    pub member_a: MemberId,
    /// The other member.
    pub member_b: MemberId,
}

/// Query parameters for endpoints scoped to a household.
#[derive(Debug, Deserialize)]
pub struct HouseholdQuery {
    /// The household.
    pub household_id: i64,
}

/// A route handler for listing the split configs of a household.
pub async fn get_split_configs_endpoint(
    State(state): State<AppState>,
    Query(query): Query<HouseholdQuery>,
) -> Result<Json<Vec<SplitConfig>>, Error> {
    let connection = state.connection()?;

    get_split_configs(query.household_id, &connection).map(Json)
}

/// A route handler for creating or replacing a member's split config.
pub async fn set_split_config_endpoint(
    State(state): State<AppState>,
    Json(config): Json<SplitConfig>,
) -> Result<Json<SplitConfig>, Error> {
    let connection = state.connection()?;

    set_split_config(config, &connection).map(Json)
}

/// A route handler for splitting an expense between the members of the payer's household.
pub async fn create_expense_splits_endpoint(
    State(state): State<AppState>,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<SplitForm>,
) -> Result<Json<Vec<ExpenseSplit>>, Error> {
    let connection = state.connection()?;

    let expense = get_expense(expense_id, &connection)?;
    let amount = form.amount.unwrap_or(expense.amount);

    create_expense_splits(
        expense_id,
        amount,
        form.split_type,
        expense.household_id,
        &connection,
    )
    .map(Json)
}

/// A route handler for listing the shares of an expense.
pub async fn get_expense_splits_endpoint(
    State(state): State<AppState>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Vec<ExpenseSplit>>, Error> {
    let connection = state.connection()?;

    get_expense(expense_id, &connection)?;

    get_expense_splits(expense_id, &connection).map(Json)
}

/// A route handler for the pairwise debts of a household.
pub async fn get_household_balances_endpoint(
    State(state): State<AppState>,
    Path(household_id): Path<i64>,
) -> Result<Json<Vec<MemberBalance>>, Error> {
    let connection = state.connection()?;

    calculate_individual_balances(household_id, &connection).map(Json)
}

/// A route handler for settling every debt between two members.
pub async fn settle_debts_endpoint(
    State(state): State<AppState>,
    Json(form): Json<DebtSettlementForm>,
) -> Result<Json<DebtSettlement>, Error> {
    let connection = state.connection()?;

    settle_debts(form.member_a, form.member_b, &connection).map(Json)
}
