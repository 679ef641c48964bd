//! The pool balance aggregate.
//!
//! There is exactly one pool per database. The row is keyed by the fixed ID
//! [POOL_BALANCE_ID] and created with an upsert, so concurrent first reads
//! cannot create a second pool.

use rusqlite::Connection;

use crate::Error;

/// The primary key of the single pool balance row.
pub const POOL_BALANCE_ID: i64 = 1;

/// Create the pool balance table.
pub fn create_pool_balance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS pool_balance (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            balance REAL NOT NULL DEFAULT 0
        )",
        (),
    )?;

    Ok(())
}

/// Get the pool balance, creating the pool with a balance of zero if it does not exist yet.
pub fn get_or_create_pool_balance(connection: &Connection) -> Result<f64, Error> {
    connection.execute(
        "INSERT INTO pool_balance (id, balance) VALUES (?1, 0) ON CONFLICT(id) DO NOTHING",
        [POOL_BALANCE_ID],
    )?;

    connection
        .query_row(
            "SELECT balance FROM pool_balance WHERE id = ?1",
            [POOL_BALANCE_ID],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the pool balance without creating the pool. A missing pool has a balance of zero.
pub fn get_pool_balance(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE((SELECT balance FROM pool_balance WHERE id = ?1), 0)",
            [POOL_BALANCE_ID],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Add `amount` to the pool and return the new balance.
///
/// `amount` may be negative when fixed allowances exceed the income that
/// funds them.
pub fn credit_pool(amount: f64, connection: &Connection) -> Result<f64, Error> {
    get_or_create_pool_balance(connection)?;

    let balance = connection.query_row(
        "UPDATE pool_balance SET balance = balance + ?1 WHERE id = ?2 RETURNING balance",
        (amount, POOL_BALANCE_ID),
        |row| row.get(0),
    )?;

    tracing::debug!("Credited pool with €{amount:.2}, new balance €{balance:.2}");

    Ok(balance)
}

/// Take `amount` out of the pool and return the new balance.
///
/// # Errors
/// Returns [Error::InsufficientBalance] and leaves the pool untouched if the
/// balance is less than `amount`. Amounts are compared in whole cents, and
/// the pool never goes negative through a debit.
pub fn debit_pool(amount: f64, connection: &Connection) -> Result<f64, Error> {
    let available = get_or_create_pool_balance(connection)?;

    if to_cents(available) < to_cents(amount) {
        return Err(Error::InsufficientBalance {
            available,
            required: amount,
        });
    }

    let balance = connection.query_row(
        "UPDATE pool_balance SET balance = MAX(balance - ?1, 0) WHERE id = ?2 RETURNING balance",
        (amount, POOL_BALANCE_ID),
        |row| row.get(0),
    )?;

    tracing::debug!("Debited pool by €{amount:.2}, new balance €{balance:.2}");

    Ok(balance)
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        create_pool_balance_table, credit_pool, debit_pool, get_or_create_pool_balance,
        get_pool_balance,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_pool_balance_table(&connection).unwrap();
        connection
    }

    fn count_pool_rows(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COUNT(*) FROM pool_balance", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn pool_is_created_lazily_with_zero_balance() {
        let connection = get_test_connection();
        assert_eq!(count_pool_rows(&connection), 0);

        let balance = get_or_create_pool_balance(&connection);

        assert_eq!(balance, Ok(0.0));
        assert_eq!(count_pool_rows(&connection), 1);
    }

    #[test]
    fn repeated_reads_never_create_a_second_pool() {
        let connection = get_test_connection();

        get_or_create_pool_balance(&connection).unwrap();
        get_or_create_pool_balance(&connection).unwrap();

        assert_eq!(count_pool_rows(&connection), 1);
    }

    #[test]
    fn second_pool_row_is_rejected() {
        let connection = get_test_connection();

        let result = connection.execute("INSERT INTO pool_balance (id, balance) VALUES (2, 0)", ());

        assert!(result.is_err());
    }

    #[test]
    fn get_pool_balance_does_not_create_pool() {
        let connection = get_test_connection();

        assert_eq!(get_pool_balance(&connection), Ok(0.0));
        assert_eq!(count_pool_rows(&connection), 0);
    }

    #[test]
    fn credit_then_debit() {
        let connection = get_test_connection();

        assert_eq!(credit_pool(100.0, &connection), Ok(100.0));
        assert_eq!(debit_pool(40.0, &connection), Ok(60.0));
        assert_eq!(get_pool_balance(&connection), Ok(60.0));
    }

    #[test]
    fn debit_exactly_the_balance_leaves_zero() {
        let connection = get_test_connection();
        credit_pool(25.0, &connection).unwrap();

        assert_eq!(debit_pool(25.0, &connection), Ok(0.0));
    }

    #[test]
    fn debit_more_than_balance_fails_and_leaves_balance_unchanged() {
        let connection = get_test_connection();
        credit_pool(100.0, &connection).unwrap();

        let result = debit_pool(150.0, &connection);

        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                available: 100.0,
                required: 150.0
            })
        );
        assert_eq!(get_pool_balance(&connection), Ok(100.0));
    }

    #[test]
    fn negative_credit_is_accepted() {
        let connection = get_test_connection();

        assert_eq!(credit_pool(-50.0, &connection), Ok(-50.0));
    }

    #[test]
    fn debit_of_balance_built_from_cent_amounts_succeeds() {
        let connection = get_test_connection();
        credit_pool(0.7, &connection).unwrap();
        debit_pool(0.4, &connection).unwrap();

        let result = debit_pool(0.3, &connection);

        assert_eq!(result, Ok(0.0));
        assert_eq!(get_pool_balance(&connection), Ok(0.0));
    }

    #[test]
    fn debit_one_cent_over_balance_fails() {
        let connection = get_test_connection();
        credit_pool(0.3, &connection).unwrap();

        let result = debit_pool(0.31, &connection);

        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
    }
}
