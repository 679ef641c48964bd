//! Household members who earn income, spend allowances and share expenses.

mod core;
mod endpoints;

pub use core::{
    Member, MemberName, count_members, create_member, create_member_table, get_all_members,
    get_member, get_members_in_household,
};
pub use endpoints::{create_member_endpoint, get_members_endpoint};
