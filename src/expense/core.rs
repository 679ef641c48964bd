use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{ExpenseId, MemberId, ReimbursementId},
    member::get_member,
};

/// Money spent on behalf of the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The expense ID.
    pub id: ExpenseId,
    /// The member who fronted the money.
    pub paid_by_id: MemberId,
    /// The amount spent.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// When the money was spent.
    pub date: Date,
    /// The household that shares the expense.
    pub household_id: i64,
    /// Whether the expense was paid out of the shared pool.
    pub paid_from_pool: bool,
    /// The amount the pool paid, which may be less than `amount`.
    pub pool_paid_amount: Option<f64>,
    /// Whether the pool owes the payer for this expense.
    pub needs_reimbursement: bool,
    /// The reimbursement created for this expense, if any.
    pub reimbursement_id: Option<ReimbursementId>,
}

/// The data needed to record an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    /// The member who fronted the money.
    pub paid_by_id: MemberId,
    /// The amount spent.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// When the money was spent.
    pub date: Date,
}

const SELECT_COLUMNS: &str = "id, paid_by_id, amount, description, date, household_id, \
    paid_from_pool, pool_paid_amount, needs_reimbursement, reimbursement_id";

/// Create the expense table.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            paid_by_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            household_id INTEGER NOT NULL,
            paid_from_pool INTEGER NOT NULL DEFAULT 0,
            pool_paid_amount REAL,
            needs_reimbursement INTEGER NOT NULL DEFAULT 0,
            reimbursement_id INTEGER,
            FOREIGN KEY(paid_by_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_household_id ON expense(household_id);",
    )?;

    Ok(())
}

/// Record an expense in the payer's household.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number,
/// - [Error::NotFound] if the payer does not exist,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_expense(expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(Error::Validation(format!(
            "expense amount {} must be a positive number",
            expense.amount
        )));
    }

    let payer = get_member(expense.paid_by_id, connection)?;

    connection
        .query_row(
            &format!(
                "INSERT INTO expense (paid_by_id, amount, description, date, household_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {SELECT_COLUMNS}"
            ),
            (
                expense.paid_by_id,
                expense.amount,
                expense.description,
                expense.date,
                payer.household_id,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve an expense by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `expense_id` does not refer to an expense.
pub fn get_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM expense WHERE id = ?1"),
            [expense_id],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Flag an expense as paid out of the pool with `amount`.
pub(crate) fn mark_paid_from_pool(
    expense_id: ExpenseId,
    amount: f64,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE expense SET paid_from_pool = 1, pool_paid_amount = ?1, needs_reimbursement = 0
                 WHERE id = ?2
                 RETURNING {SELECT_COLUMNS}"
            ),
            (amount, expense_id),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Flag an expense as owed back to its payer through `reimbursement_id`.
pub(crate) fn mark_needs_reimbursement(
    expense_id: ExpenseId,
    reimbursement_id: ReimbursementId,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE expense
                 SET paid_from_pool = 0, pool_paid_amount = NULL, needs_reimbursement = 1, reimbursement_id = ?1
                 WHERE id = ?2
                 RETURNING {SELECT_COLUMNS}"
            ),
            (reimbursement_id, expense_id),
            map_row,
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        paid_by_id: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        household_id: row.get(5)?,
        paid_from_pool: row.get(6)?,
        pool_paid_amount: row.get(7)?,
        needs_reimbursement: row.get(8)?,
        reimbursement_id: row.get(9)?,
    })
}
