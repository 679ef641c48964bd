//! Route handlers for allowance rules, income and monthly allowances.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    allowance::{
        AllowanceConfig, IncomeResult, PersonalAllowance, ensure_default_configs,
        get_allowance_configs, get_personal_allowances_for_month, process_income,
        set_allowance_config,
    },
    database_id::MemberId,
    period::Month,
    timezone::local_today,
};

/// The request body for processing income.
#[derive(Debug, Deserialize)]
pub struct IncomeForm {
    /// The member who received the income.
    pub member_id: MemberId,
    /// The amount received.
    pub amount: f64,
    /// When the income was received, defaults to today.
    pub date: Option<Date>,
    /// The month to allocate the income to, overriding the date rule.
    pub allocated_to_month: Option<Month>,
}

/// Query parameters for endpoints scoped to a month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Defaults to the current month.
    pub month: Option<Month>,
}

/// The response body for provisioning default rules.
#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultConfigsResponse {
    /// How many rules were created.
    pub created: usize,
    /// All rules after provisioning.
    pub configs: Vec<AllowanceConfig>,
}

/// A route handler for listing every allowance rule.
pub async fn get_allowance_configs_endpoint(
    State(state): State<AppState>,
) -> Result<Json<Vec<AllowanceConfig>>, Error> {
    let connection = state.connection()?;

    get_allowance_configs(&connection).map(Json)
}

/// A route handler for creating or replacing a member's allowance rule.
pub async fn set_allowance_config_endpoint(
    State(state): State<AppState>,
    Json(config): Json<AllowanceConfig>,
) -> Result<Json<AllowanceConfig>, Error> {
    let connection = state.connection()?;

    set_allowance_config(config, &connection).map(Json)
}

/// A route handler that gives every member the default rule if no active rule exists.
pub async fn ensure_default_configs_endpoint(
    State(state): State<AppState>,
) -> Result<Json<DefaultConfigsResponse>, Error> {
    let connection = state.connection()?;

    let created = ensure_default_configs(&connection)?;
    let configs = get_allowance_configs(&connection)?;

    Ok(Json(DefaultConfigsResponse { created, configs }))
}

/// A route handler for processing income into allowances and the pool.
pub async fn process_income_endpoint(
    State(state): State<AppState>,
    Json(form): Json<IncomeForm>,
) -> Result<Json<IncomeResult>, Error> {
    let date = match form.date {
        Some(date) => date,
        None => local_today(&state.local_timezone)?,
    };

    let connection = state.connection()?;

    process_income(
        form.member_id,
        form.amount,
        date,
        form.allocated_to_month,
        &connection,
    )
    .map(Json)
}

/// A route handler for listing every member's allowance for a month.
pub async fn get_allowances_endpoint(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<PersonalAllowance>>, Error> {
    let month = match query.month {
        Some(month) => month,
        None => state.current_month()?,
    };

    let connection = state.connection()?;

    get_personal_allowances_for_month(month, &connection).map(Json)
}
