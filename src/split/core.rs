//! Splitting an expense into one share per member.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{ExpenseId, MemberId, SplitId},
    db::begin_write,
    expense::{get_expense, validate_amount},
    split::get_active_split_configs,
};

/// How an expense is divided between members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// Every active member pays the same share.
    Equal,
    /// Every active member pays in proportion to their configured ratio.
    Ratio,
    /// Per-member amounts chosen by the user.
    Custom,
}

/// One member's share of an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    /// The split ID.
    pub id: SplitId,
    /// The expense being shared.
    pub expense_id: ExpenseId,
    /// The member whose share this is.
    pub member_id: MemberId,
    /// The member's share.
    pub amount: f64,
    /// Whether the member has settled their share with the payer.
    pub paid: bool,
}

pub(crate) const SELECT_COLUMNS: &str = "id, expense_id, member_id, amount, paid";

/// Create the expense split table. Each member has at most one share per expense.
pub fn create_expense_split_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense_split (
            id INTEGER PRIMARY KEY,
            expense_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            UNIQUE(expense_id, member_id),
            FOREIGN KEY(expense_id) REFERENCES expense(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_split_member_id ON expense_split(member_id);",
    )?;

    Ok(())
}

/// Divide `amount` of the expense `expense_id` between the active members of `household_id`.
///
/// Any existing shares of the expense are replaced. The payer's own share is
/// marked as paid since they already fronted the money.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number,
/// - [Error::NotFound] if the expense does not exist,
/// - [Error::NotImplemented] for [SplitType::Custom],
/// - [Error::NoActiveMembers] for an equal split without active members,
/// - [Error::ZeroRatio] for a ratio split whose ratios add up to zero,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_expense_splits(
    expense_id: ExpenseId,
    amount: f64,
    split_type: SplitType,
    household_id: i64,
    connection: &Connection,
) -> Result<Vec<ExpenseSplit>, Error> {
    validate_amount(amount)?;

    let transaction = begin_write(connection)?;

    let expense = get_expense(expense_id, &transaction)?;
    let configs = get_active_split_configs(household_id, &transaction)?;

    let shares: Vec<(MemberId, f64)> = match split_type {
        SplitType::Equal => {
            if configs.is_empty() {
                return Err(Error::NoActiveMembers);
            }

            let share = amount / configs.len() as f64;
            configs
                .iter()
                .map(|config| (config.member_id, share))
                .collect()
        }
        SplitType::Ratio => {
            let total_ratio: f64 = configs.iter().map(|config| config.ratio).sum();

            if total_ratio == 0.0 {
                return Err(Error::ZeroRatio);
            }

            configs
                .iter()
                .map(|config| (config.member_id, amount * config.ratio / total_ratio))
                .collect()
        }
        SplitType::Custom => {
            return Err(Error::NotImplemented("custom expense splits".to_owned()));
        }
    };

    transaction.execute(
        "DELETE FROM expense_split WHERE expense_id = ?1",
        [expense_id],
    )?;

    let splits = {
        let mut statement = transaction.prepare(&format!(
            "INSERT INTO expense_split (expense_id, member_id, amount, paid)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {SELECT_COLUMNS}"
        ))?;

        shares
            .into_iter()
            .map(|(member_id, share)| {
                let paid = member_id == expense.paid_by_id;
                statement
                    .query_row((expense_id, member_id, share, paid), map_split_row)
                    .map_err(Error::from)
            })
            .collect::<Result<Vec<_>, Error>>()?
    };

    transaction.commit()?;

    tracing::info!(
        "Split expense {expense_id} of €{amount:.2} between {} members",
        splits.len()
    );

    Ok(splits)
}

/// Retrieve the shares of `expense_id`, ordered by member.
pub fn get_expense_splits(
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Vec<ExpenseSplit>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM expense_split WHERE expense_id = ?1 ORDER BY member_id ASC"
        ))?
        .query_map([expense_id], map_split_row)?
        .map(|maybe_split| maybe_split.map_err(|error| error.into()))
        .collect()
}

pub(crate) fn map_split_row(row: &Row) -> Result<ExpenseSplit, rusqlite::Error> {
    Ok(ExpenseSplit {
        id: row.get(0)?,
        expense_id: row.get(1)?,
        member_id: row.get(2)?,
        amount: row.get(3)?,
        paid: row.get(4)?,
    })
}
