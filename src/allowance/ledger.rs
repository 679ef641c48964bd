//! The personal allowance ledger: one row per member per month.
//!
//! `remaining` is maintained incrementally as `allocated + carried_over - spent`.
//! When a member's row for a month is first created, whatever was left over
//! (or overspent) in the previous month is carried over into it.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{DatabaseId, MemberId},
    period::Month,
};

/// A member's allowance for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalAllowance {
    /// The row ID.
    pub id: DatabaseId,
    /// The member the allowance belongs to.
    pub member_id: MemberId,
    /// The month the allowance is for.
    pub month: Month,
    /// The total granted this month.
    pub allocated: f64,
    /// The total spent this month.
    pub spent: f64,
    /// What is left to spend. Negative when overspent.
    pub remaining: f64,
    /// The previous month's remaining amount at the time this row was created.
    pub carried_over: f64,
    /// The amount the following month pulled out of this one, once that month exists.
    pub carried_to: Option<f64>,
}

const SELECT_COLUMNS: &str =
    "id, member_id, month, allocated, spent, remaining, carried_over, carried_to";

/// Create the personal allowance table.
pub fn create_personal_allowance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS personal_allowance (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL,
            month TEXT NOT NULL,
            allocated REAL NOT NULL DEFAULT 0,
            spent REAL NOT NULL DEFAULT 0,
            remaining REAL NOT NULL DEFAULT 0,
            carried_over REAL NOT NULL DEFAULT 0,
            carried_to REAL,
            UNIQUE(member_id, month),
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_personal_allowance_month ON personal_allowance(month);",
    )?;

    Ok(())
}

/// Retrieve a member's allowance for `month`.
///
/// # Errors
/// Returns [Error::NotFound] if the member has no allowance for `month`.
pub fn get_personal_allowance(
    member_id: MemberId,
    month: Month,
    connection: &Connection,
) -> Result<PersonalAllowance, Error> {
    find_personal_allowance(member_id, month, connection)?.ok_or(Error::NotFound)
}

/// Retrieve every member's allowance for `month`, ordered by member.
pub fn get_personal_allowances_for_month(
    month: Month,
    connection: &Connection,
) -> Result<Vec<PersonalAllowance>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM personal_allowance WHERE month = ?1 ORDER BY member_id ASC"
        ))?
        .query_map([month], map_row)?
        .map(|maybe_allowance| maybe_allowance.map_err(|error| error.into()))
        .collect()
}

/// Get a member's allowance for `month`, creating it if it does not exist.
///
/// A new row starts with the previous month's `remaining` as both its
/// `carried_over` and `remaining` amounts (zero if the member has no row for
/// the previous month), and the previous month's row records the amount in
/// `carried_to`.
///
/// Should be called inside a transaction so the carry-over and the new row are
/// written together.
pub fn resolve_or_create_allowance(
    member_id: MemberId,
    month: Month,
    connection: &Connection,
) -> Result<PersonalAllowance, Error> {
    if let Some(allowance) = find_personal_allowance(member_id, month, connection)? {
        return Ok(allowance);
    }

    let previous = find_personal_allowance(member_id, month.previous(), connection)?;
    let carried_over = previous
        .as_ref()
        .map(|allowance| allowance.remaining)
        .unwrap_or(0.0);

    let allowance = connection.query_row(
        &format!(
            "INSERT INTO personal_allowance (member_id, month, allocated, spent, remaining, carried_over)
             VALUES (?1, ?2, 0, 0, ?3, ?3)
             RETURNING {SELECT_COLUMNS}"
        ),
        (member_id, month, carried_over),
        map_row,
    )?;

    if let Some(previous) = previous {
        connection.execute(
            "UPDATE personal_allowance SET carried_to = ?1 WHERE id = ?2",
            (carried_over, previous.id),
        )?;
    }

    tracing::debug!(
        "Created allowance for member {member_id} in {month} with €{carried_over:.2} carried over"
    );

    Ok(allowance)
}

/// Grant `amount` more to the allowance `allowance_id`.
pub(crate) fn add_allocation(
    allowance_id: DatabaseId,
    amount: f64,
    connection: &Connection,
) -> Result<PersonalAllowance, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE personal_allowance
                 SET allocated = allocated + ?1, remaining = remaining + ?1
                 WHERE id = ?2
                 RETURNING {SELECT_COLUMNS}"
            ),
            (amount, allowance_id),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Record `amount` spent from the allowance `allowance_id`.
///
/// `remaining` is allowed to go negative.
pub(crate) fn record_spend(
    allowance_id: DatabaseId,
    amount: f64,
    connection: &Connection,
) -> Result<PersonalAllowance, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE personal_allowance
                 SET spent = spent + ?1, remaining = remaining - ?1
                 WHERE id = ?2
                 RETURNING {SELECT_COLUMNS}"
            ),
            (amount, allowance_id),
            map_row,
        )
        .map_err(|error| error.into())
}

fn find_personal_allowance(
    member_id: MemberId,
    month: Month,
    connection: &Connection,
) -> Result<Option<PersonalAllowance>, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM personal_allowance WHERE member_id = ?1 AND month = ?2"
            ),
            (member_id, month),
            map_row,
        )
        .optional()
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<PersonalAllowance, rusqlite::Error> {
    Ok(PersonalAllowance {
        id: row.get(0)?,
        member_id: row.get(1)?,
        month: row.get(2)?,
        allocated: row.get(3)?,
        spent: row.get(4)?,
        remaining: row.get(5)?,
        carried_over: row.get(6)?,
        carried_to: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        member::{MemberName, create_member},
        period::Month,
    };

    use super::{
        add_allocation, get_personal_allowance, get_personal_allowances_for_month, record_spend,
        resolve_or_create_allowance,
    };

    /// A connection with two members, IDs 1 and 2.
    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_member(MemberName::new_unchecked("Alice"), 1, &connection).unwrap();
        create_member(MemberName::new_unchecked("Bob"), 1, &connection).unwrap();
        connection
    }

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn first_allowance_has_no_carry_over() {
        let connection = get_test_connection();

        let allowance = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();

        assert_eq!(allowance.allocated, 0.0);
        assert_eq!(allowance.spent, 0.0);
        assert_eq!(allowance.remaining, 0.0);
        assert_eq!(allowance.carried_over, 0.0);
        assert_eq!(allowance.carried_to, None);
    }

    #[test]
    fn resolve_returns_existing_row() {
        let connection = get_test_connection();
        let created = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();
        let updated = add_allocation(created.id, 50.0, &connection).unwrap();

        let resolved = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();

        assert_eq!(resolved, updated);
    }

    #[test]
    fn new_month_carries_over_previous_remaining() {
        let connection = get_test_connection();
        let january = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();
        add_allocation(january.id, 200.0, &connection).unwrap();
        record_spend(january.id, 75.0, &connection).unwrap();

        let february = resolve_or_create_allowance(1, month("2025-02"), &connection).unwrap();

        assert_eq!(february.carried_over, 125.0);
        assert_eq!(february.remaining, 125.0);
        assert_eq!(february.allocated, 0.0);
        let january = get_personal_allowance(1, month("2025-01"), &connection).unwrap();
        assert_eq!(january.carried_to, Some(125.0));
    }

    #[test]
    fn overspending_carries_over_as_debt() {
        let connection = get_test_connection();
        let december = resolve_or_create_allowance(1, month("2025-12"), &connection).unwrap();
        record_spend(december.id, 40.0, &connection).unwrap();

        let next = resolve_or_create_allowance(1, month("2026-01"), &connection).unwrap();

        assert_eq!(next.carried_over, -40.0);
        assert_eq!(next.remaining, -40.0);
    }

    #[test]
    fn carry_over_only_comes_from_the_immediately_preceding_month() {
        let connection = get_test_connection();
        let january = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();
        add_allocation(january.id, 100.0, &connection).unwrap();

        let march = resolve_or_create_allowance(1, month("2025-03"), &connection).unwrap();

        assert_eq!(march.carried_over, 0.0);
    }

    #[test]
    fn carry_over_is_per_member() {
        let connection = get_test_connection();
        let alice = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();
        add_allocation(alice.id, 100.0, &connection).unwrap();

        let bob = resolve_or_create_allowance(2, month("2025-02"), &connection).unwrap();

        assert_eq!(bob.carried_over, 0.0);
    }

    #[test]
    fn remaining_tracks_allocations_and_spending() {
        let connection = get_test_connection();
        let allowance = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();

        add_allocation(allowance.id, 100.0, &connection).unwrap();
        add_allocation(allowance.id, 50.0, &connection).unwrap();
        let allowance = record_spend(allowance.id, 30.0, &connection).unwrap();

        assert_eq!(allowance.allocated, 150.0);
        assert_eq!(allowance.spent, 30.0);
        assert_eq!(allowance.remaining, 120.0);
    }

    #[test]
    fn missing_allowance_is_not_found() {
        let connection = get_test_connection();

        let result = get_personal_allowance(1, month("2025-01"), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn allowances_for_month_are_filtered() {
        let connection = get_test_connection();
        let alice = resolve_or_create_allowance(1, month("2025-01"), &connection).unwrap();
        let bob = resolve_or_create_allowance(2, month("2025-01"), &connection).unwrap();
        resolve_or_create_allowance(1, month("2025-04"), &connection).unwrap();

        let allowances = get_personal_allowances_for_month(month("2025-01"), &connection);

        assert_eq!(allowances, Ok(vec![alice, bob]));
    }
}
