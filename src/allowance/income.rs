//! Processing household income into allowances and the pool.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    allowance::{
        AllowanceCalculation, PersonalAllowance, add_allocation, calculate_allowances,
        ensure_default_configs, get_active_allowance_configs, resolve_or_create_allowance,
    },
    database_id::{DatabaseId, MemberId},
    db::begin_write,
    member::{count_members, get_member},
    period::{Month, allocation_month_for_income_date},
    pool::credit_pool,
};

/// The outcome of processing an income event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeResult {
    /// The ID of the recorded income.
    pub income_id: DatabaseId,
    /// The month the income was allocated to.
    pub month: Month,
    /// How the income was distributed.
    pub calculation: AllowanceCalculation,
    /// The updated allowance of every member that received a share.
    pub allowances: Vec<PersonalAllowance>,
    /// The pool balance after the credit.
    pub pool_balance: f64,
}

/// Create the income table.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS income (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            allocated_to_month TEXT NOT NULL,
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_income_allocated_to_month ON income(allocated_to_month);",
    )?;

    Ok(())
}

/// Distribute `amount` received by `member_id` on `date` between every
/// member's allowance and the pool.
///
/// The income is allocated to the month given by `allocated_to_month`, or
/// otherwise by [allocation_month_for_income_date]. One member's income funds
/// the allowances of every member with an active rule. If no member has an
/// active rule, every member first gets the default rule.
///
/// The pool credit, the allowance updates and the income record are written
/// in one transaction: either all of them are applied or none are.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number or the income
///   would fund a month after 9999-12,
/// - [Error::Configuration] if there are no allowance rules and no members,
/// - [Error::NotFound] if `member_id` does not refer to a member,
/// - or [Error::SqlError] if there is an SQL error.
pub fn process_income(
    member_id: MemberId,
    amount: f64,
    date: Date,
    allocated_to_month: Option<Month>,
    connection: &Connection,
) -> Result<IncomeResult, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation(format!(
            "income amount {amount} must be a positive number"
        )));
    }

    let month = allocation_month_for_income_date(date, allocated_to_month)?;

    let transaction = begin_write(connection)?;

    ensure_default_configs(&transaction)?;
    let configs = get_active_allowance_configs(&transaction)?;

    if configs.is_empty() && count_members(&transaction)? == 0 {
        return Err(Error::Configuration(
            "there are no allowance rules and no members to create default rules for".to_owned(),
        ));
    }

    get_member(member_id, &transaction)?;

    let calculation = calculate_allowances(amount, &configs);
    let pool_balance = credit_pool(calculation.remaining_for_pool, &transaction)?;

    let allowances = calculation
        .allowances
        .iter()
        .map(|allowance| {
            let ledger_row = resolve_or_create_allowance(allowance.member_id, month, &transaction)?;
            add_allocation(ledger_row.id, allowance.amount, &transaction)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    transaction.execute(
        "INSERT INTO income (member_id, amount, date, allocated_to_month) VALUES (?1, ?2, ?3, ?4)",
        (member_id, amount, date, month),
    )?;
    let income_id = transaction.last_insert_rowid();

    transaction.commit()?;

    tracing::info!(
        "Processed income of €{amount:.2} from member {member_id} for {month}: \
        €{:.2} to allowances, €{:.2} to the pool",
        calculation.total_allocated,
        calculation.remaining_for_pool
    );

    Ok(IncomeResult {
        income_id,
        month,
        calculation,
        allowances,
        pool_balance,
    })
}
