//! Household ledger is a web service for sharing money inside a household.
//!
//! Two bookkeeping models are supported:
//! - the *shared pool*, where household income funds a shared cash pool after
//!   monthly personal allowances are carved out for every member, and
//! - *individual accounts*, where each expense is split between members and
//!   the service tracks who owes whom.
//!
//! This library provides a JSON API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod allowance;
mod app_state;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod member;
mod period;
mod pool;
mod reimbursement;
mod routing;
mod split;
mod timezone;

pub use allowance::{
    AllowanceCalculation, AllowanceConfig, AllowanceType, IncomeResult, MemberAllowance,
    PersonalAllowance, calculate_allowances, ensure_default_configs, process_income,
    resolve_or_create_allowance, set_allowance_config,
};
pub use app_state::AppState;
pub use database_id::{DatabaseId, ExpenseId, MemberId, ReimbursementId, SplitId};
pub use db::initialize as initialize_db;
pub use expense::{
    AllowanceDeduction, Expense, NewExpense, PoolPayment, create_expense, deduct_from_allowance,
    deduct_from_pool, get_expense,
};
pub use member::{Member, MemberName, create_member, get_all_members};
pub use period::{Month, allocation_month_for_income_date, current_month};
pub use pool::{SharedPoolSummary, get_pool_balance, get_shared_pool_summary};
pub use reimbursement::{
    Reimbursement, create_reimbursement, get_reimbursement, settle_reimbursement,
    unsettle_reimbursement,
};
pub use routing::build_router;
pub use split::{
    Debt, DebtSettlement, ExpenseSplit, MemberBalance, SplitConfig, SplitType,
    calculate_individual_balances, create_expense_splits, get_expense_splits, set_split_config,
    settle_debts,
};
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every business rule violation is returned as one of these values. Only
/// [Error::SqlError] and [Error::DatabaseLockError] indicate that something
/// unexpected went wrong with the storage layer.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input was malformed, e.g. a negative amount or an invalid month.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An empty string was used to create a member name.
    #[error("member name cannot be empty")]
    EmptyMemberName,

    /// The pool does not hold enough money for the requested debit.
    ///
    /// Retrying will not help until more income has been processed.
    #[error("insufficient pool balance: €{available:.2} available, €{required:.2} required")]
    InsufficientBalance {
        /// The current pool balance.
        available: f64,
        /// The amount the operation tried to debit.
        required: f64,
    },

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The reimbursement or expense has already been settled.
    #[error("already settled")]
    AlreadySettled,

    /// No allowance configuration exists and there are no members to create
    /// a default configuration for.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested feature has not been implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// There are no members with an active split configuration in the household.
    #[error("no active members to split the expense between")]
    NoActiveMembers,

    /// The split ratios of the active members add up to zero.
    #[error("the total split ratio of the active members is zero")]
    ZeroRatio,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::EmptyMemberName
            | Error::Configuration(_)
            | Error::NoActiveMembers
            | Error::ZeroRatio => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InsufficientBalance { .. } | Error::AlreadySettled => StatusCode::CONFLICT,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Error::InvalidTimezoneError(_) | Error::SqlError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            // Storage errors are logged where they are converted, the client only gets a generic message.
            Error::SqlError(_) | Error::DatabaseLockError => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn insufficient_balance_message_shows_both_amounts() {
        let error = Error::InsufficientBalance {
            available: 100.0,
            required: 150.0,
        };

        assert_eq!(
            error.to_string(),
            "insufficient pool balance: €100.00 available, €150.00 required"
        );
    }

    #[test]
    fn business_errors_map_to_client_status_codes() {
        assert_eq!(
            Error::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::AlreadySettled.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::ZeroRatio.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotImplemented("custom splits".to_owned())
                .into_response()
                .status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn storage_errors_map_to_internal_server_error() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
