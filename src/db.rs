//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    allowance::{create_allowance_config_table, create_income_table, create_personal_allowance_table},
    expense::create_expense_table,
    member::create_member_table,
    pool::create_pool_balance_table,
    reimbursement::create_reimbursement_table,
    split::{create_expense_split_table, create_split_config_table},
};

/// Create the tables for all domain models if they do not exist yet.
///
/// All tables are created in one exclusive transaction.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_member_table(&transaction)?;
    create_pool_balance_table(&transaction)?;
    create_allowance_config_table(&transaction)?;
    create_personal_allowance_table(&transaction)?;
    create_income_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_reimbursement_table(&transaction)?;
    create_split_config_table(&transaction)?;
    create_expense_split_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Begin a transaction that takes the database write lock immediately.
///
/// Every operation that reads a balance and then writes it back runs inside
/// one of these, so concurrent writers are serialized on the check-then-act.
pub(crate) fn begin_write(connection: &Connection) -> Result<Transaction<'_>, Error> {
    Transaction::new_unchecked(connection, TransactionBehavior::Immediate).map_err(Error::from)
}
