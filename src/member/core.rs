use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::MemberId};

/// A validated, non-empty member name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct MemberName(String);

impl MemberName {
    /// Create a member name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyMemberName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyMemberName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a member name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for MemberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MemberName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MemberName::new(&value)
    }
}

impl From<MemberName> for String {
    fn from(value: MemberName) -> Self {
        value.0
    }
}

/// A person in a household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Member {
    /// The member's ID.
    pub id: MemberId,
    /// The member's display name.
    pub name: MemberName,
    /// The household the member belongs to.
    pub household_id: i64,
}

/// Create a member and return it with its generated ID.
pub fn create_member(
    name: MemberName,
    household_id: i64,
    connection: &Connection,
) -> Result<Member, Error> {
    connection.execute(
        "INSERT INTO member (name, household_id) VALUES (?1, ?2);",
        (name.as_ref(), household_id),
    )?;

    let id = connection.last_insert_rowid();

    tracing::debug!("Created member {id} ({name}) in household {household_id}");

    Ok(Member {
        id,
        name,
        household_id,
    })
}

/// Retrieve a single member by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `member_id` does not refer to a member.
pub fn get_member(member_id: MemberId, connection: &Connection) -> Result<Member, Error> {
    connection
        .prepare("SELECT id, name, household_id FROM member WHERE id = :id;")?
        .query_row(&[(":id", &member_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve every member known to the system, ordered by ID.
pub fn get_all_members(connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare("SELECT id, name, household_id FROM member ORDER BY id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the members of `household_id`, ordered by ID.
pub fn get_members_in_household(
    household_id: i64,
    connection: &Connection,
) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT id, name, household_id FROM member WHERE household_id = :household_id ORDER BY id ASC;",
        )?
        .query_map(&[(":household_id", &household_id)], map_row)?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// The number of members known to the system.
pub fn count_members(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(*) FROM member;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Initialize the member table and indexes.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS member (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            household_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_member_household_id ON member(household_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Member, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let household_id = row.get(2)?;

    Ok(Member {
        id,
        name: MemberName::new_unchecked(&raw_name),
        household_id,
    })
}


#[cfg(test)]
mod member_query_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        MemberName, count_members, create_member, create_member_table, get_all_members,
        get_member, get_members_in_household,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_member_table(&connection).expect("Could not create member table");
        connection
    }

    #[test]
    fn create_member_succeeds() {
        let connection = get_test_connection();
        let name = MemberName::new_unchecked("Alice");

        let member = create_member(name.clone(), 1, &connection).expect("Could not create member");

        assert!(member.id > 0);
        assert_eq!(member.name, name);
        assert_eq!(member.household_id, 1);
    }

    #[test]
    fn get_member_succeeds() {
        let connection = get_test_connection();
        let inserted = create_member(MemberName::new_unchecked("Bob"), 1, &connection).unwrap();

        let selected = get_member(inserted.id, &connection);

        assert_eq!(selected, Ok(inserted));
    }

    #[test]
    fn get_member_with_invalid_id_returns_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_member(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn members_are_filtered_by_household() {
        let connection = get_test_connection();
        let alice = create_member(MemberName::new_unchecked("Alice"), 1, &connection).unwrap();
        let bob = create_member(MemberName::new_unchecked("Bob"), 2, &connection).unwrap();

        let household_one = get_members_in_household(1, &connection).unwrap();
        let everyone = get_all_members(&connection).unwrap();

        assert_eq!(household_one, vec![alice.clone()]);
        assert_eq!(everyone, vec![alice, bob]);
        assert_eq!(count_members(&connection), Ok(2));
    }
}
