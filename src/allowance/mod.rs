//! Personal allowances: the part of household income each member may spend as they like.

mod calculator;
mod config;
mod endpoints;
mod income;
mod ledger;

pub use calculator::{AllowanceCalculation, MemberAllowance, calculate_allowances};
pub use config::{
    AllowanceConfig, AllowanceType, create_allowance_config_table, ensure_default_configs,
    get_active_allowance_configs, get_allowance_configs, set_allowance_config,
};
pub use endpoints::{
    ensure_default_configs_endpoint, get_allowance_configs_endpoint, get_allowances_endpoint,
    process_income_endpoint, set_allowance_config_endpoint,
};
pub use income::{IncomeResult, create_income_table, process_income};
pub(crate) use ledger::{add_allocation, record_spend};
pub use ledger::{
    PersonalAllowance, create_personal_allowance_table, get_personal_allowance,
    get_personal_allowances_for_month, resolve_or_create_allowance,
};
