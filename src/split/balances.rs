//! Who owes whom under the individual-accounts model.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::MemberId,
    db::begin_write,
    member::{MemberName, get_member, get_members_in_household},
};

/// An amount owed to or by another member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// The other member.
    pub member_id: MemberId,
    /// The total of the unpaid splits between the two members in this direction.
    pub amount: f64,
}

/// A member's position against the rest of the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    /// The member.
    pub member_id: MemberId,
    /// The member's display name.
    pub name: MemberName,
    /// What others owe the member minus what the member owes others.
    ///
    /// Positive when the member is owed money.
    pub net_balance: f64,
    /// What the member owes, per payer.
    pub owes: Vec<Debt>,
    /// What the member is owed, per debtor.
    pub owed_by: Vec<Debt>,
}

/// The outcome of settling all debts between two members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSettlement {
    /// The gross amount of the splits marked as paid, counting both directions.
    pub amount_settled: f64,
    /// How many splits were marked as paid.
    pub splits_settled: usize,
}

/// Calculate the pairwise debts of every member of `household_id`.
///
/// A member owes the payer of an expense their share until the split is marked
/// as paid. Opposing debts between two members are reported separately.
/// Members without any debts are included with a zero balance.
pub fn calculate_individual_balances(
    household_id: i64,
    connection: &Connection,
) -> Result<Vec<MemberBalance>, Error> {
    let members = get_members_in_household(household_id, connection)?;

    // (debtor, creditor) -> amount
    let mut debts: BTreeMap<(MemberId, MemberId), f64> = BTreeMap::new();

    let mut statement = connection.prepare(
        "SELECT s.member_id, e.paid_by_id, s.amount FROM expense_split s
         INNER JOIN expense e ON e.id = s.expense_id
         INNER JOIN member m ON m.id = s.member_id
         WHERE s.paid = 0 AND s.member_id != e.paid_by_id AND m.household_id = ?1",
    )?;

    let rows = statement.query_map([household_id], |row| {
        Ok((
            row.get::<_, MemberId>(0)?,
            row.get::<_, MemberId>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    for row in rows {
        let (debtor, creditor, amount) = row?;
        *debts.entry((debtor, creditor)).or_default() += amount;
    }

    let balances = members
        .into_iter()
        .map(|member| {
            let owes: Vec<Debt> = debts
                .iter()
                .filter(|((debtor, _), _)| *debtor == member.id)
                .map(|(&(_, creditor), &amount)| Debt {
                    member_id: creditor,
                    amount,
                })
                .collect();

            let owed_by: Vec<Debt> = debts
                .iter()
                .filter(|((_, creditor), _)| *creditor == member.id)
                .map(|(&(debtor, _), &amount)| Debt {
                    member_id: debtor,
                    amount,
                })
                .collect();

            let net_balance = owed_by.iter().map(|debt| debt.amount).sum::<f64>()
                - owes.iter().map(|debt| debt.amount).sum::<f64>();

            MemberBalance {
                member_id: member.id,
                name: member.name,
                net_balance,
                owes,
                owed_by,
            }
        })
        .collect();

    Ok(balances)
}

/// Mark every unpaid split between `member_a` and `member_b` as paid, in both directions.
///
/// Opposing debts are not netted: if A owes B €10 and B owes A €5 the
/// settlement reports €15.
///
/// # Errors
/// Returns an [Error::Validation] if both IDs refer to the same member,
/// [Error::NotFound] if either member does not exist, or [Error::SqlError]
/// if there is an SQL error.
pub fn settle_debts(
    member_a: MemberId,
    member_b: MemberId,
    connection: &Connection,
) -> Result<DebtSettlement, Error> {
    if member_a == member_b {
        return Err(Error::Validation(
            "cannot settle debts between a member and themselves".to_owned(),
        ));
    }

    let transaction = begin_write(connection)?;

    get_member(member_a, &transaction)?;
    get_member(member_b, &transaction)?;

    let settled: Vec<f64> = transaction
        .prepare(
            "UPDATE expense_split SET paid = 1
             WHERE paid = 0 AND id IN (
                SELECT s.id FROM expense_split s
                INNER JOIN expense e ON e.id = s.expense_id
                WHERE (s.member_id = ?1 AND e.paid_by_id = ?2)
                   OR (s.member_id = ?2 AND e.paid_by_id = ?1)
             )
             RETURNING amount",
        )?
        .query_map((member_a, member_b), |row| row.get(0))?
        .collect::<Result<_, rusqlite::Error>>()?;

    transaction.commit()?;

    let settlement = DebtSettlement {
        amount_settled: settled.iter().sum(),
        splits_settled: settled.len(),
    };

    tracing::info!(
        "Settled {} splits worth €{:.2} between members {member_a} and {member_b}",
        settlement.splits_settled,
        settlement.amount_settled
    );

    Ok(settlement)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        expense::{NewExpense, create_expense},
        member::{Member, MemberName, create_member},
        split::{SplitConfig, SplitType, create_expense_splits, get_expense_splits, set_split_config},
    };

    use super::{Debt, calculate_individual_balances, settle_debts};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_split_member(name: &str, connection: &Connection) -> Member {
        let member = create_member(MemberName::new_unchecked(name), 1, connection).unwrap();
        set_split_config(
            SplitConfig {
                member_id: member.id,
                ratio: 1.0,
                is_active: true,
            },
            connection,
        )
        .unwrap();
        member
    }

    /// Record an expense paid by `payer` and split it equally.
    fn split_expense(payer: &Member, amount: f64, connection: &Connection) -> i64 {
        let expense = create_expense(
            NewExpense {
                paid_by_id: payer.id,
                amount,
                description: String::new(),
                date: date!(2025 - 03 - 14),
            },
            connection,
        )
        .unwrap();
        create_expense_splits(expense.id, amount, SplitType::Equal, 1, connection).unwrap();
        expense.id
    }

    #[test]
    fn balances_list_debts_per_counterparty() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);
        let bob = create_split_member("Bob", &connection);
        split_expense(&bob, 20.0, &connection);
        split_expense(&alice, 10.0, &connection);

        let balances = calculate_individual_balances(1, &connection).unwrap();

        assert_eq!(balances.len(), 2);
        let alice_balance = &balances[0];
        assert_eq!(alice_balance.member_id, alice.id);
        assert_eq!(
            alice_balance.owes,
            vec![Debt {
                member_id: bob.id,
                amount: 10.0
            }]
        );
        assert_eq!(
            alice_balance.owed_by,
            vec![Debt {
                member_id: bob.id,
                amount: 5.0
            }]
        );
        assert_eq!(alice_balance.net_balance, -5.0);
        assert_eq!(balances[1].net_balance, 5.0);
    }

    #[test]
    fn net_balances_sum_to_zero() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);
        let bob = create_split_member("Bob", &connection);
        let carol = create_split_member("Carol", &connection);
        split_expense(&alice, 90.0, &connection);
        split_expense(&bob, 30.0, &connection);
        split_expense(&carol, 12.0, &connection);

        let balances = calculate_individual_balances(1, &connection).unwrap();
        let total: f64 = balances.iter().map(|balance| balance.net_balance).sum();

        assert!(total.abs() < 1e-9, "net balances add up to {total}");
    }

    #[test]
    fn member_without_splits_has_zero_balance() {
        let connection = get_test_connection();
        create_split_member("Alice", &connection);

        let balances = calculate_individual_balances(1, &connection).unwrap();

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].net_balance, 0.0);
        assert!(balances[0].owes.is_empty());
        assert!(balances[0].owed_by.is_empty());
    }

    #[test]
    fn settle_debts_does_not_net_opposing_debts() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);
        let bob = create_split_member("Bob", &connection);
        // Alice owes Bob €10, Bob owes Alice €5.
        let first = split_expense(&bob, 20.0, &connection);
        let second = split_expense(&alice, 10.0, &connection);

        let settlement = settle_debts(alice.id, bob.id, &connection).unwrap();

        assert_eq!(settlement.amount_settled, 15.0);
        assert_eq!(settlement.splits_settled, 2);
        for expense_id in [first, second] {
            let splits = get_expense_splits(expense_id, &connection).unwrap();
            assert!(splits.iter().all(|split| split.paid));
        }
        let balances = calculate_individual_balances(1, &connection).unwrap();
        assert!(balances.iter().all(|balance| balance.net_balance == 0.0));
    }

    #[test]
    fn settle_debts_leaves_other_members_alone() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);
        let bob = create_split_member("Bob", &connection);
        let carol = create_split_member("Carol", &connection);
        split_expense(&carol, 30.0, &connection);

        let settlement = settle_debts(alice.id, bob.id, &connection).unwrap();

        assert_eq!(settlement.amount_settled, 0.0);
        let balances = calculate_individual_balances(1, &connection).unwrap();
        assert_eq!(balances[2].net_balance, 20.0);
    }

    #[test]
    fn settling_twice_settles_nothing_the_second_time() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);
        let bob = create_split_member("Bob", &connection);
        split_expense(&bob, 20.0, &connection);
        settle_debts(alice.id, bob.id, &connection).unwrap();

        let settlement = settle_debts(bob.id, alice.id, &connection).unwrap();

        assert_eq!(settlement.amount_settled, 0.0);
        assert_eq!(settlement.splits_settled, 0);
    }

    #[test]
    fn settle_debts_with_self_is_rejected() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);

        let result = settle_debts(alice.id, alice.id, &connection);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn settle_debts_with_unknown_member_is_not_found() {
        let connection = get_test_connection();
        let alice = create_split_member("Alice", &connection);

        let result = settle_debts(alice.id, 42, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }
}
