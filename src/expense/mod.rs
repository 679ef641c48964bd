//! Shared expenses and how they are paid for.

mod core;
mod endpoints;
mod settlement;

pub(crate) use core::{mark_needs_reimbursement, mark_paid_from_pool};
pub use core::{Expense, NewExpense, create_expense, create_expense_table, get_expense};
pub use endpoints::{
    create_expense_endpoint, deduct_from_allowance_endpoint, get_expense_endpoint,
    pay_from_pool_endpoint,
};
pub(crate) use settlement::validate_amount;
pub use settlement::{AllowanceDeduction, PoolPayment, deduct_from_allowance, deduct_from_pool};
