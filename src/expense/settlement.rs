//! Paying for expenses out of the pool or out of a personal allowance.
//!
//! The two paths treat running out of money differently. The pool is shared,
//! so a payment that would take it below zero is refused. A personal
//! allowance may be overspent; the debt carries over into the next month.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    allowance::{PersonalAllowance, record_spend, resolve_or_create_allowance},
    database_id::{ExpenseId, MemberId},
    db::begin_write,
    expense::{Expense, get_expense, mark_paid_from_pool},
    member::get_member,
    period::Month,
    pool::debit_pool,
};

/// The outcome of paying an expense from the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolPayment {
    /// The expense with its updated flags.
    pub expense: Expense,
    /// The pool balance after the payment.
    pub pool_balance: f64,
}

/// The outcome of paying an expense from a personal allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceDeduction {
    /// The allowance after the deduction.
    pub allowance: PersonalAllowance,
    /// Set when the deduction overspent the allowance. The deduction still happened.
    pub warning: Option<String>,
}

/// Pay `amount` for the expense `expense_id` out of the pool.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number or the expense
///   is already waiting for a reimbursement,
/// - [Error::NotFound] if the expense does not exist,
/// - [Error::AlreadySettled] if the expense was already paid from the pool,
/// - [Error::InsufficientBalance] if the pool holds less than `amount`,
/// - or [Error::SqlError] if there is an SQL error.
///
/// Nothing is changed when an error is returned.
pub fn deduct_from_pool(
    expense_id: ExpenseId,
    amount: f64,
    connection: &Connection,
) -> Result<PoolPayment, Error> {
    validate_amount(amount)?;

    let transaction = begin_write(connection)?;

    let expense = get_expense(expense_id, &transaction)?;

    if expense.paid_from_pool {
        return Err(Error::AlreadySettled);
    }

    if expense.needs_reimbursement {
        return Err(Error::Validation(format!(
            "expense {expense_id} is already waiting for a reimbursement"
        )));
    }

    let pool_balance = debit_pool(amount, &transaction)?;
    let expense = mark_paid_from_pool(expense_id, amount, &transaction)?;

    transaction.commit()?;

    tracing::info!("Paid €{amount:.2} for expense {expense_id} from the pool");

    Ok(PoolPayment {
        expense,
        pool_balance,
    })
}

/// Pay `amount` out of the allowance of `member_id` for `month`.
///
/// The allowance is created with its carry-over if this is the member's first
/// allowance activity in `month`. Overspending is allowed and reported in
/// [AllowanceDeduction::warning].
///
/// # Errors
/// Returns:
/// - [Error::Validation] if `amount` is not a positive number,
/// - [Error::NotFound] if the member does not exist,
/// - or [Error::SqlError] if there is an SQL error.
pub fn deduct_from_allowance(
    member_id: MemberId,
    amount: f64,
    month: Month,
    connection: &Connection,
) -> Result<AllowanceDeduction, Error> {
    validate_amount(amount)?;

    let transaction = begin_write(connection)?;

    get_member(member_id, &transaction)?;
    let allowance = resolve_or_create_allowance(member_id, month, &transaction)?;
    let allowance = record_spend(allowance.id, amount, &transaction)?;

    transaction.commit()?;

    let warning = if allowance.remaining < 0.0 {
        let message = format!(
            "Personal allowance exceeded by €{:.2}",
            -allowance.remaining
        );
        tracing::warn!("Member {member_id} in {month}: {message}");
        Some(message)
    } else {
        None
    };

    tracing::info!("Paid €{amount:.2} from the allowance of member {member_id} for {month}");

    Ok(AllowanceDeduction { allowance, warning })
}

pub(crate) fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "amount {amount} must be a positive number"
        )))
    }
}

#[cfg(test)]
mod pool_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        expense::{Expense, NewExpense, create_expense, get_expense},
        member::{MemberName, create_member},
        pool::{credit_pool, get_pool_balance},
    };

    use super::deduct_from_pool;

    fn get_test_connection_and_expense(pool_balance: f64) -> (Connection, Expense) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        credit_pool(pool_balance, &connection).unwrap();
        let payer = create_member(MemberName::new_unchecked("Alice"), 1, &connection).unwrap();
        let expense = create_expense(
            NewExpense {
                paid_by_id: payer.id,
                amount: 150.0,
                description: "Power bill".to_owned(),
                date: date!(2025 - 03 - 14),
            },
            &connection,
        )
        .unwrap();

        (connection, expense)
    }

    #[test]
    fn pool_payment_debits_pool_and_flags_expense() {
        let (connection, expense) = get_test_connection_and_expense(200.0);

        let payment = deduct_from_pool(expense.id, 150.0, &connection).unwrap();

        assert_eq!(payment.pool_balance, 50.0);
        assert!(payment.expense.paid_from_pool);
        assert_eq!(payment.expense.pool_paid_amount, Some(150.0));
        assert!(!payment.expense.needs_reimbursement);
        assert_eq!(get_pool_balance(&connection), Ok(50.0));
    }

    #[test]
    fn insufficient_pool_leaves_balance_and_expense_unchanged() {
        let (connection, expense) = get_test_connection_and_expense(100.0);

        let result = deduct_from_pool(expense.id, 150.0, &connection);

        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                available: 100.0,
                required: 150.0
            })
        );
        assert_eq!(get_pool_balance(&connection), Ok(100.0));
        assert_eq!(get_expense(expense.id, &connection), Ok(expense));
    }

    #[test]
    fn paying_twice_is_already_settled() {
        let (connection, expense) = get_test_connection_and_expense(500.0);
        deduct_from_pool(expense.id, 150.0, &connection).unwrap();

        let result = deduct_from_pool(expense.id, 150.0, &connection);

        assert_eq!(result, Err(Error::AlreadySettled));
        assert_eq!(get_pool_balance(&connection), Ok(350.0));
    }

    #[test]
    fn missing_expense_is_not_found() {
        let (connection, expense) = get_test_connection_and_expense(500.0);

        let result = deduct_from_pool(expense.id + 1, 10.0, &connection);

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(get_pool_balance(&connection), Ok(500.0));
    }

    #[test]
    fn pool_never_goes_negative_over_a_sequence_of_payments() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        credit_pool(100.0, &connection).unwrap();
        let payer = create_member(MemberName::new_unchecked("Alice"), 1, &connection).unwrap();

        for amount in [30.0, 50.0, 40.0, 20.0, 5.0] {
            let expense = create_expense(
                NewExpense {
                    paid_by_id: payer.id,
                    amount,
                    description: String::new(),
                    date: date!(2025 - 03 - 14),
                },
                &connection,
            )
            .unwrap();
            let before = get_pool_balance(&connection).unwrap();

            let result = deduct_from_pool(expense.id, amount, &connection);

            let after = get_pool_balance(&connection).unwrap();
            assert!(after >= 0.0, "pool went negative: {after}");
            match result {
                Ok(_) => assert_eq!(after, before - amount),
                Err(error) => {
                    assert!(matches!(error, Error::InsufficientBalance { .. }));
                    assert_eq!(after, before);
                }
            }
        }

        assert_eq!(get_pool_balance(&connection), Ok(0.0));
    }
}
