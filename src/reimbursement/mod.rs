//! Reimbursements owed by the pool to members who fronted shared expenses.

mod core;
mod endpoints;

pub use core::{
    Reimbursement, create_reimbursement, create_reimbursement_table, get_reimbursement,
    get_unsettled_reimbursements, settle_reimbursement, unsettle_reimbursement,
};
pub use endpoints::{
    create_reimbursement_endpoint, get_reimbursement_endpoint, settle_reimbursement_endpoint,
    unsettle_reimbursement_endpoint,
};
