//! Route handlers for household members.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    member::{Member, MemberName, create_member, get_all_members, get_members_in_household},
};

/// The request body for adding a member.
#[derive(Debug, Deserialize)]
pub struct CreateMemberForm {
    /// The member's display name.
    pub name: String,
    /// The household to add the member to.
    pub household_id: i64,
}

/// Query parameters for listing members.
#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    /// Only list the members of this household.
    pub household_id: Option<i64>,
}

/// A route handler for adding a member to a household.
pub async fn create_member_endpoint(
    State(state): State<AppState>,
    Json(form): Json<CreateMemberForm>,
) -> Result<(StatusCode, Json<Member>), Error> {
    let name = MemberName::new(&form.name)?;
    let connection = state.connection()?;

    let member = create_member(name, form.household_id, &connection)?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// A route handler for listing members, optionally filtered by household.
pub async fn get_members_endpoint(
    State(state): State<AppState>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<Vec<Member>>, Error> {
    let connection = state.connection()?;

    match query.household_id {
        Some(household_id) => get_members_in_household(household_id, &connection),
        None => get_all_members(&connection),
    }
    .map(Json)
}
