//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The route for listing and creating household members.
pub const MEMBERS: &str = "/api/members";
/// The route for listing and setting allowance rules.
pub const ALLOWANCE_CONFIGS: &str = "/api/allowance_configs";
/// The route for giving every member the default allowance rule.
pub const DEFAULT_ALLOWANCE_CONFIGS: &str = "/api/allowance_configs/defaults";
/// The route for processing income.
pub const INCOMES: &str = "/api/incomes";
/// The route for listing the personal allowances of a month.
pub const ALLOWANCES: &str = "/api/allowances";
/// The route for paying an expense out of a personal allowance.
pub const ALLOWANCE_DEDUCTIONS: &str = "/api/allowances/deductions";
/// The route for creating expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for paying an expense out of the pool.
pub const EXPENSE_POOL_PAYMENT: &str = "/api/expenses/{expense_id}/pool_payment";
/// The route for marking an expense as owed back to the member who paid it.
pub const EXPENSE_REIMBURSEMENT: &str = "/api/expenses/{expense_id}/reimbursement";
/// The route for splitting an expense between household members.
pub const EXPENSE_SPLITS: &str = "/api/expenses/{expense_id}/splits";
/// The route to access a single reimbursement.
pub const REIMBURSEMENT: &str = "/api/reimbursements/{reimbursement_id}";
/// The route for paying back a reimbursement from the pool.
pub const SETTLE_REIMBURSEMENT: &str = "/api/reimbursements/{reimbursement_id}/settle";
/// The route for reversing a reimbursement settlement.
pub const UNSETTLE_REIMBURSEMENT: &str = "/api/reimbursements/{reimbursement_id}/unsettle";
/// The route for the shared pool summary of a month.
pub const POOL_SUMMARY: &str = "/api/pool/summary";
/// The route for setting a member's split ratio.
pub const SPLIT_CONFIGS: &str = "/api/split_configs";
/// The route for the pairwise balances of a household.
pub const HOUSEHOLD_BALANCES: &str = "/api/households/{household_id}/balances";
/// The route for settling the debts between two members.
pub const DEBT_SETTLEMENTS: &str = "/api/debt_settlements";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
