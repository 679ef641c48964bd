//! Splits an income amount into personal allowances and the pool's share.

use serde::{Deserialize, Serialize};

use crate::{
    allowance::{AllowanceConfig, AllowanceType},
    database_id::MemberId,
};

/// The allowance a member receives from one income event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAllowance {
    /// The member receiving the allowance.
    pub member_id: MemberId,
    /// The amount added to the member's allowance.
    pub amount: f64,
}

/// How an income amount is distributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceCalculation {
    /// One entry per active rule.
    pub allowances: Vec<MemberAllowance>,
    /// The sum of `allowances`.
    pub total_allocated: f64,
    /// The income left for the pool. Negative when fixed allowances exceed the income.
    pub remaining_for_pool: f64,
}

/// Distribute `total_income` between the members with an active rule in `configs`.
///
/// Fixed rules are applied first and always grant their full amount, even if
/// that is more than `total_income`. Percentage rules then take their share of
/// what is left after the fixed amounts. Whatever has not been allocated goes
/// to the pool, so `total_allocated + remaining_for_pool == total_income`.
///
/// With no active rules the whole income goes to the pool.
pub fn calculate_allowances(total_income: f64, configs: &[AllowanceConfig]) -> AllowanceCalculation {
    let active = configs.iter().filter(|config| config.is_active);

    let fixed_total: f64 = active
        .clone()
        .filter(|config| config.allowance_type == AllowanceType::Fixed)
        .map(|config| config.value)
        .sum();
    let remainder = total_income - fixed_total;

    let allowances: Vec<MemberAllowance> = active
        .map(|config| MemberAllowance {
            member_id: config.member_id,
            amount: match config.allowance_type {
                AllowanceType::Fixed => config.value,
                AllowanceType::Percentage => remainder * config.value,
            },
        })
        .collect();

    let total_allocated: f64 = allowances.iter().map(|allowance| allowance.amount).sum();

    AllowanceCalculation {
        allowances,
        total_allocated,
        remaining_for_pool: total_income - total_allocated,
    }
}
