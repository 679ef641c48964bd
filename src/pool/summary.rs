//! A read-only overview of the shared pool for a month.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    period::Month,
    pool::get_pool_balance,
    reimbursement::{Reimbursement, get_unsettled_reimbursements},
};

/// The state of the shared pool.
///
/// `total_income` and `total_allowances` cover only `month`. The
/// reimbursement and pool spending figures cover all time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedPoolSummary {
    /// The month the income and allowance totals are for.
    pub month: Month,
    /// Income allocated to `month`.
    pub total_income: f64,
    /// Personal allowances granted for `month`.
    pub total_allowances: f64,
    /// Every reimbursement the pool has not paid yet, regardless of month.
    pub unsettled_reimbursements: Vec<Reimbursement>,
    /// The sum of `unsettled_reimbursements`.
    pub total_unsettled: f64,
    /// Amounts paid from the pool for expenses plus settled reimbursements, all time.
    pub total_pool_spend: f64,
    /// The current pool balance.
    pub pool_balance: f64,
}

/// Summarize the shared pool for `month`.
///
/// This only reads from the database; it never creates the pool.
pub fn get_shared_pool_summary(
    month: Month,
    connection: &Connection,
) -> Result<SharedPoolSummary, Error> {
    let total_income: f64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM income WHERE allocated_to_month = ?1",
        [month],
        |row| row.get(0),
    )?;

    let total_allowances: f64 = connection.query_row(
        "SELECT COALESCE(SUM(allocated), 0) FROM personal_allowance WHERE month = ?1",
        [month],
        |row| row.get(0),
    )?;

    let unsettled_reimbursements = get_unsettled_reimbursements(connection)?;
    let total_unsettled = unsettled_reimbursements
        .iter()
        .map(|reimbursement| reimbursement.amount)
        .sum();

    let total_pool_spend: f64 = connection.query_row(
        "SELECT
            (SELECT COALESCE(SUM(pool_paid_amount), 0) FROM expense WHERE paid_from_pool = 1)
            + (SELECT COALESCE(SUM(amount), 0) FROM reimbursement WHERE settled = 1)",
        [],
        |row| row.get(0),
    )?;

    Ok(SharedPoolSummary {
        month,
        total_income,
        total_allowances,
        unsettled_reimbursements,
        total_unsettled,
        total_pool_spend,
        pool_balance: get_pool_balance(connection)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        allowance::process_income,
        db::initialize,
        expense::{NewExpense, create_expense, deduct_from_pool},
        member::{Member, MemberName, create_member},
        period::Month,
        reimbursement::{create_reimbursement, settle_reimbursement},
    };

    use super::get_shared_pool_summary;

    fn get_test_connection_and_member() -> (Connection, Member) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let member = create_member(MemberName::new_unchecked("Alice"), 1, &connection).unwrap();
        (connection, member)
    }

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn create_test_expense(member: &Member, amount: f64, connection: &Connection) -> i64 {
        create_expense(
            NewExpense {
                paid_by_id: member.id,
                amount,
                description: "Shared".to_owned(),
                date: date!(2025 - 02 - 10),
            },
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn empty_database_has_zero_summary() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let summary = get_shared_pool_summary(month("2025-03"), &connection).unwrap();

        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_allowances, 0.0);
        assert!(summary.unsettled_reimbursements.is_empty());
        assert_eq!(summary.total_unsettled, 0.0);
        assert_eq!(summary.total_pool_spend, 0.0);
        assert_eq!(summary.pool_balance, 0.0);
    }

    #[test]
    fn income_and_allowances_are_month_scoped() {
        let (connection, member) = get_test_connection_and_member();
        process_income(member.id, 1000.0, date!(2025 - 02 - 05), None, &connection).unwrap();
        process_income(member.id, 500.0, date!(2025 - 02 - 25), None, &connection).unwrap();

        let february = get_shared_pool_summary(month("2025-02"), &connection).unwrap();
        let march = get_shared_pool_summary(month("2025-03"), &connection).unwrap();

        assert_eq!(february.total_income, 1000.0);
        assert_eq!(february.total_allowances, 200.0);
        assert_eq!(march.total_income, 500.0);
        assert_eq!(march.total_allowances, 100.0);
        assert_eq!(march.pool_balance, 1200.0);
    }

    #[test]
    fn reimbursements_and_pool_spend_are_cumulative() {
        let (connection, member) = get_test_connection_and_member();
        process_income(member.id, 1000.0, date!(2025 - 01 - 05), None, &connection).unwrap();

        let pool_paid = create_test_expense(&member, 100.0, &connection);
        deduct_from_pool(pool_paid, 100.0, &connection).unwrap();

        let settled = create_test_expense(&member, 50.0, &connection);
        let settled = create_reimbursement(settled, member.id, 50.0, "", month("2025-01"), &connection)
            .unwrap();
        settle_reimbursement(settled.id, datetime!(2025-01-20 9:00 UTC), &connection).unwrap();

        let unsettled = create_test_expense(&member, 30.0, &connection);
        let unsettled =
            create_reimbursement(unsettled, member.id, 30.0, "", month("2024-11"), &connection)
                .unwrap();

        let summary = get_shared_pool_summary(month("2025-06"), &connection).unwrap();

        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_allowances, 0.0);
        assert_eq!(summary.unsettled_reimbursements, vec![unsettled]);
        assert_eq!(summary.total_unsettled, 30.0);
        assert_eq!(summary.total_pool_spend, 150.0);
        assert_eq!(summary.pool_balance, 650.0);
    }

    #[test]
    fn partial_pool_payment_counts_only_the_debited_amount() {
        let (connection, member) = get_test_connection_and_member();
        process_income(member.id, 1000.0, date!(2025 - 01 - 05), None, &connection).unwrap();

        let expense = create_test_expense(&member, 100.0, &connection);
        deduct_from_pool(expense, 40.0, &connection).unwrap();

        let summary = get_shared_pool_summary(month("2025-06"), &connection).unwrap();

        assert_eq!(summary.total_pool_spend, 40.0);
        assert_eq!(summary.pool_balance, 710.0);
    }
}
