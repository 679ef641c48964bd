//! Individual accounts: expenses split between members and the debts that follow.

mod balances;
mod config;
mod core;
mod endpoints;

pub use balances::{Debt, DebtSettlement, MemberBalance, calculate_individual_balances, settle_debts};
pub(crate) use config::get_active_split_configs;
pub use config::{SplitConfig, create_split_config_table, get_split_configs, set_split_config};
pub use core::{
    ExpenseSplit, SplitType, create_expense_split_table, create_expense_splits, get_expense_splits,
};
pub use endpoints::{
    create_expense_splits_endpoint, get_expense_splits_endpoint, get_household_balances_endpoint,
    get_split_configs_endpoint, set_split_config_endpoint, settle_debts_endpoint,
};
