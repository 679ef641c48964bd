//! Money the pool owes a member who paid a shared expense out of their own pocket.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{ExpenseId, MemberId, ReimbursementId},
    db::begin_write,
    expense::{get_expense, mark_needs_reimbursement, validate_amount},
    member::get_member,
    period::Month,
    pool::{credit_pool, debit_pool},
};

/// A debt from the pool to a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reimbursement {
    /// The reimbursement ID.
    pub id: ReimbursementId,
    /// The member who is owed.
    pub member_id: MemberId,
    /// The month the expense belongs to.
    pub month: Month,
    /// The amount owed.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// Whether the pool has paid the member back.
    pub settled: bool,
    /// When the pool paid the member back.
    #[serde(with = "time::serde::rfc3339::option")]
    pub settled_at: Option<OffsetDateTime>,
    /// The expense being reimbursed.
    pub expense_id: ExpenseId,
}

const SELECT_COLUMNS: &str =
    "id, member_id, month, amount, description, settled, settled_at, expense_id";

/// Create the reimbursement table. Each expense has at most one reimbursement.
pub fn create_reimbursement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS reimbursement (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL,
            month TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            settled INTEGER NOT NULL DEFAULT 0,
            settled_at TEXT,
            expense_id INTEGER NOT NULL UNIQUE,
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(expense_id) REFERENCES expense(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_reimbursement_settled ON reimbursement(settled);",
    )?;

    Ok(())
}

/// Record that the pool owes `member_id` the `amount` they paid for `expense_id`.
///
/// The expense is flagged as needing a reimbursement. No balance changes
/// until the reimbursement is settled.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number, or the expense
///   was paid from the pool or already has a reimbursement,
/// - [Error::NotFound] if the expense or member does not exist,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_reimbursement(
    expense_id: ExpenseId,
    member_id: MemberId,
    amount: f64,
    description: &str,
    month: Month,
    connection: &Connection,
) -> Result<Reimbursement, Error> {
    validate_amount(amount)?;

    let transaction = begin_write(connection)?;

    let expense = get_expense(expense_id, &transaction)?;
    get_member(member_id, &transaction)?;

    if expense.paid_from_pool {
        return Err(Error::Validation(format!(
            "expense {expense_id} was already paid from the pool"
        )));
    }

    if expense.reimbursement_id.is_some() {
        return Err(Error::Validation(format!(
            "expense {expense_id} already has a reimbursement"
        )));
    }

    let reimbursement = transaction.query_row(
        &format!(
            "INSERT INTO reimbursement (member_id, month, amount, description, expense_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {SELECT_COLUMNS}"
        ),
        (member_id, month, amount, description, expense_id),
        map_row,
    )?;

    mark_needs_reimbursement(expense_id, reimbursement.id, &transaction)?;

    transaction.commit()?;

    tracing::info!(
        "Created reimbursement {} of €{amount:.2} to member {member_id} for expense {expense_id}",
        reimbursement.id
    );

    Ok(reimbursement)
}

/// Retrieve a reimbursement by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `reimbursement_id` does not refer to a reimbursement.
pub fn get_reimbursement(
    reimbursement_id: ReimbursementId,
    connection: &Connection,
) -> Result<Reimbursement, Error> {
    connection
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM reimbursement WHERE id = ?1"),
            [reimbursement_id],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve every reimbursement the pool has not paid yet, oldest first.
pub fn get_unsettled_reimbursements(connection: &Connection) -> Result<Vec<Reimbursement>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reimbursement WHERE settled = 0 ORDER BY id ASC"
        ))?
        .query_map([], map_row)?
        .map(|maybe_reimbursement| maybe_reimbursement.map_err(|error| error.into()))
        .collect()
}

/// Pay back the reimbursement `reimbursement_id` from the pool at `settled_at`.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the reimbursement does not exist,
/// - [Error::AlreadySettled] if it has already been paid back,
/// - [Error::InsufficientBalance] if the pool holds less than the amount owed,
/// - or [Error::SqlError] if there is an SQL error.
///
/// Nothing is changed when an error is returned.
pub fn settle_reimbursement(
    reimbursement_id: ReimbursementId,
    settled_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Reimbursement, Error> {
    let transaction = begin_write(connection)?;

    let reimbursement = get_reimbursement(reimbursement_id, &transaction)?;

    if reimbursement.settled {
        return Err(Error::AlreadySettled);
    }

    debit_pool(reimbursement.amount, &transaction)?;

    let reimbursement = transaction.query_row(
        &format!(
            "UPDATE reimbursement SET settled = 1, settled_at = ?1
             WHERE id = ?2
             RETURNING {SELECT_COLUMNS}"
        ),
        (settled_at, reimbursement_id),
        map_row,
    )?;

    transaction.commit()?;

    tracing::info!(
        "Settled reimbursement {reimbursement_id} of €{:.2} to member {}",
        reimbursement.amount,
        reimbursement.member_id
    );

    Ok(reimbursement)
}

/// Undo the settlement of `reimbursement_id`, returning its amount to the pool.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the reimbursement does not exist,
/// - [Error::Validation] if it has not been settled,
/// - or [Error::SqlError] if there is an SQL error.
pub fn unsettle_reimbursement(
    reimbursement_id: ReimbursementId,
    connection: &Connection,
) -> Result<Reimbursement, Error> {
    let transaction = begin_write(connection)?;

    let reimbursement = get_reimbursement(reimbursement_id, &transaction)?;

    if !reimbursement.settled {
        return Err(Error::Validation(format!(
            "reimbursement {reimbursement_id} has not been settled"
        )));
    }

    credit_pool(reimbursement.amount, &transaction)?;

    let reimbursement = transaction.query_row(
        &format!(
            "UPDATE reimbursement SET settled = 0, settled_at = NULL
             WHERE id = ?1
             RETURNING {SELECT_COLUMNS}"
        ),
        [reimbursement_id],
        map_row,
    )?;

    transaction.commit()?;

    tracing::info!("Reversed settlement of reimbursement {reimbursement_id}");

    Ok(reimbursement)
}

fn map_row(row: &Row) -> Result<Reimbursement, rusqlite::Error> {
    Ok(Reimbursement {
        id: row.get(0)?,
        member_id: row.get(1)?,
        month: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        settled: row.get(5)?,
        settled_at: row.get(6)?,
        expense_id: row.get(7)?,
    })
}
