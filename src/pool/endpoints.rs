//! Route handler for the shared pool summary.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    period::Month,
    pool::{SharedPoolSummary, get_shared_pool_summary},
};

/// Query parameters for the pool summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Defaults to the current month.
    pub month: Option<Month>,
}

/// A route handler for the shared pool summary of a month.
pub async fn get_pool_summary_endpoint(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SharedPoolSummary>, Error> {
    let month = match query.month {
        Some(month) => month,
        None => state.current_month()?,
    };

    let connection = state.connection()?;

    get_shared_pool_summary(month, &connection).map(Json)
}
