//! The shared pool: the household's common cash funded by income left over
//! after personal allowances.

mod balance;
mod endpoints;
mod summary;

pub use balance::{
    POOL_BALANCE_ID, create_pool_balance_table, credit_pool, debit_pool, get_or_create_pool_balance,
    get_pool_balance,
};
pub use endpoints::get_pool_summary_endpoint;
pub use summary::{SharedPoolSummary, get_shared_pool_summary};
