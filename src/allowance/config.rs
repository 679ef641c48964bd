//! Per-member rules for carving personal allowances out of household income.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::MemberId, member::get_member};

/// The share of income given to every member when no rule has been configured.
pub const DEFAULT_ALLOWANCE_PERCENTAGE: f64 = 0.2;

/// How an allowance is derived from income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowanceType {
    /// A fraction between 0 and 1 of the income left after fixed allowances.
    Percentage,
    /// A fixed currency amount per income event.
    Fixed,
}

impl AllowanceType {
    fn as_str(&self) -> &'static str {
        match self {
            AllowanceType::Percentage => "percentage",
            AllowanceType::Fixed => "fixed",
        }
    }
}

impl Display for AllowanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for AllowanceType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AllowanceType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "percentage" => Ok(AllowanceType::Percentage),
            "fixed" => Ok(AllowanceType::Fixed),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A member's allowance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceConfig {
    /// The member the rule applies to.
    pub member_id: MemberId,
    /// Whether `value` is a fraction or an amount.
    pub allowance_type: AllowanceType,
    /// A fraction in `0..=1` for percentage rules, a currency amount for fixed rules.
    pub value: f64,
    /// Inactive rules are ignored when income is processed.
    pub is_active: bool,
}

impl AllowanceConfig {
    /// Check that `value` makes sense for the rule's type.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if a percentage is outside `0..=1` or a
    /// fixed amount is negative.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.value.is_finite() {
            return Err(Error::Validation(format!(
                "allowance value {} is not a number",
                self.value
            )));
        }

        match self.allowance_type {
            AllowanceType::Percentage if !(0.0..=1.0).contains(&self.value) => {
                Err(Error::Validation(format!(
                    "percentage allowance {} must be between 0 and 1",
                    self.value
                )))
            }
            AllowanceType::Fixed if self.value < 0.0 => Err(Error::Validation(format!(
                "fixed allowance {} cannot be negative",
                self.value
            ))),
            _ => Ok(()),
        }
    }
}

/// Create the allowance config table. Each member has at most one rule.
pub fn create_allowance_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS allowance_config (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL UNIQUE,
            allowance_type TEXT NOT NULL CHECK (allowance_type IN ('percentage', 'fixed')),
            value REAL NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(member_id) REFERENCES member(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create or replace the allowance rule for `config.member_id`.
///
/// # Errors
/// Returns an [Error::Validation] if the rule is invalid, or
/// [Error::NotFound] if the member does not exist.
pub fn set_allowance_config(
    config: AllowanceConfig,
    connection: &Connection,
) -> Result<AllowanceConfig, Error> {
    config.validate()?;
    get_member(config.member_id, connection)?;

    connection.execute(
        "INSERT INTO allowance_config (member_id, allowance_type, value, is_active)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(member_id) DO UPDATE SET
            allowance_type = excluded.allowance_type,
            value = excluded.value,
            is_active = excluded.is_active",
        (
            config.member_id,
            config.allowance_type,
            config.value,
            config.is_active,
        ),
    )?;

    tracing::info!(
        "Set {} allowance of {} for member {}",
        config.allowance_type,
        config.value,
        config.member_id
    );

    Ok(config)
}

/// Retrieve every allowance rule, active or not, ordered by member.
pub fn get_allowance_configs(connection: &Connection) -> Result<Vec<AllowanceConfig>, Error> {
    connection
        .prepare(
            "SELECT member_id, allowance_type, value, is_active FROM allowance_config
             ORDER BY member_id ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_config| maybe_config.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the active allowance rules, ordered by member.
pub fn get_active_allowance_configs(
    connection: &Connection,
) -> Result<Vec<AllowanceConfig>, Error> {
    connection
        .prepare(
            "SELECT member_id, allowance_type, value, is_active FROM allowance_config
             WHERE is_active = 1
             ORDER BY member_id ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_config| maybe_config.map_err(|error| error.into()))
        .collect()
}

/// Give every member without a rule the default rule, but only when no active rule exists at all.
///
/// Members that have a deactivated rule keep it. Calling this more than once
/// has no further effect. Returns the number of rules created.
pub fn ensure_default_configs(connection: &Connection) -> Result<usize, Error> {
    let created = connection.execute(
        "INSERT INTO allowance_config (member_id, allowance_type, value, is_active)
         SELECT id, 'percentage', ?1, 1 FROM member
         WHERE NOT EXISTS (SELECT 1 FROM allowance_config WHERE is_active = 1)
         ON CONFLICT(member_id) DO NOTHING",
        [DEFAULT_ALLOWANCE_PERCENTAGE],
    )?;

    if created > 0 {
        tracing::info!(
            "No active allowance rules, created {created} default rules of {}%",
            DEFAULT_ALLOWANCE_PERCENTAGE * 100.0
        );
    }

    Ok(created)
}

fn map_row(row: &Row) -> Result<AllowanceConfig, rusqlite::Error> {
    Ok(AllowanceConfig {
        member_id: row.get(0)?,
        allowance_type: row.get(1)?,
        value: row.get(2)?,
        is_active: row.get(3)?,
    })
}
