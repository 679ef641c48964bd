//! Which members take part in splitting expenses, and with what weight.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::MemberId, member::get_member};

/// A member's share weight for ratio splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// The member the weight applies to.
    pub member_id: MemberId,
    /// The member's weight relative to the other active members.
    pub ratio: f64,
    /// Inactive members are left out of new splits.
    pub is_active: bool,
}

/// Create the split config table.
pub fn create_split_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS split_config (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL UNIQUE,
            ratio REAL NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create or replace the split config for `config.member_id`.
///
/// # Errors
/// Returns an [Error::Validation] if the ratio is negative or not a number,
/// or [Error::NotFound] if the member does not exist.
pub fn set_split_config(config: SplitConfig, connection: &Connection) -> Result<SplitConfig, Error> {
    if !config.ratio.is_finite() || config.ratio < 0.0 {
        return Err(Error::Validation(format!(
            "split ratio {} must be a non-negative number",
            config.ratio
        )));
    }

    get_member(config.member_id, connection)?;

    connection.execute(
        "INSERT INTO split_config (member_id, ratio, is_active) VALUES (?1, ?2, ?3)
         ON CONFLICT(member_id) DO UPDATE SET ratio = excluded.ratio, is_active = excluded.is_active",
        (config.member_id, config.ratio, config.is_active),
    )?;

    Ok(config)
}

/// Retrieve the split configs of the members of `household_id`, ordered by member.
pub fn get_split_configs(
    household_id: i64,
    connection: &Connection,
) -> Result<Vec<SplitConfig>, Error> {
    connection
        .prepare(
            "SELECT c.member_id, c.ratio, c.is_active FROM split_config c
             INNER JOIN member m ON m.id = c.member_id
             WHERE m.household_id = ?1
             ORDER BY c.member_id ASC",
        )?
        .query_map([household_id], map_row)?
        .map(|maybe_config| maybe_config.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the active split configs of the members of `household_id`, ordered by member.
pub(crate) fn get_active_split_configs(
    household_id: i64,
    connection: &Connection,
) -> Result<Vec<SplitConfig>, Error> {
    get_split_configs(household_id, connection)
        .map(|configs| configs.into_iter().filter(|config| config.is_active).collect())
}

fn map_row(row: &Row) -> Result<SplitConfig, rusqlite::Error> {
    Ok(SplitConfig {
        member_id: row.get(0)?,
        ratio: row.get(1)?,
        is_active: row.get(2)?,
    })
}
