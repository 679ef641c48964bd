//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    allowance::{
        ensure_default_configs_endpoint, get_allowance_configs_endpoint, get_allowances_endpoint,
        process_income_endpoint, set_allowance_config_endpoint,
    },
    endpoints,
    expense::{
        create_expense_endpoint, deduct_from_allowance_endpoint, get_expense_endpoint,
        pay_from_pool_endpoint,
    },
    member::{create_member_endpoint, get_members_endpoint},
    pool::get_pool_summary_endpoint,
    reimbursement::{
        create_reimbursement_endpoint, get_reimbursement_endpoint, settle_reimbursement_endpoint,
        unsettle_reimbursement_endpoint,
    },
    split::{
        create_expense_splits_endpoint, get_expense_splits_endpoint,
        get_household_balances_endpoint, get_split_configs_endpoint, set_split_config_endpoint,
        settle_debts_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let shared_pool_routes = Router::new()
        .route(
            endpoints::ALLOWANCE_CONFIGS,
            get(get_allowance_configs_endpoint).put(set_allowance_config_endpoint),
        )
        .route(
            endpoints::DEFAULT_ALLOWANCE_CONFIGS,
            post(ensure_default_configs_endpoint),
        )
        .route(endpoints::INCOMES, post(process_income_endpoint))
        .route(endpoints::ALLOWANCES, get(get_allowances_endpoint))
        .route(
            endpoints::ALLOWANCE_DEDUCTIONS,
            post(deduct_from_allowance_endpoint),
        )
        .route(endpoints::EXPENSE_POOL_PAYMENT, post(pay_from_pool_endpoint))
        .route(
            endpoints::EXPENSE_REIMBURSEMENT,
            post(create_reimbursement_endpoint),
        )
        .route(endpoints::REIMBURSEMENT, get(get_reimbursement_endpoint))
        .route(
            endpoints::SETTLE_REIMBURSEMENT,
            post(settle_reimbursement_endpoint),
        )
        .route(
            endpoints::UNSETTLE_REIMBURSEMENT,
            post(unsettle_reimbursement_endpoint),
        )
        .route(endpoints::POOL_SUMMARY, get(get_pool_summary_endpoint));

    let individual_account_routes = Router::new()
        .route(
            endpoints::SPLIT_CONFIGS,
            get(get_split_configs_endpoint).put(set_split_config_endpoint),
        )
        .route(
            endpoints::EXPENSE_SPLITS,
            get(get_expense_splits_endpoint).post(create_expense_splits_endpoint),
        )
        .route(
            endpoints::HOUSEHOLD_BALANCES,
            get(get_household_balances_endpoint),
        )
        .route(endpoints::DEBT_SETTLEMENTS, post(settle_debts_endpoint));

    Router::new()
        .route(
            endpoints::MEMBERS,
            get(get_members_endpoint).post(create_member_endpoint),
        )
        .route(endpoints::EXPENSES, post(create_expense_endpoint))
        .route(endpoints::EXPENSE, get(get_expense_endpoint))
        .merge(shared_pool_routes)
        .merge(individual_account_routes)
        .with_state(state)
}
