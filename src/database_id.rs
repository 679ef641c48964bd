//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a household member.
pub type MemberId = DatabaseId;

/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;

/// Database identifier for a reimbursement.
pub type ReimbursementId = DatabaseId;

/// Database identifier for one member's share of an expense.
pub type SplitId = DatabaseId;
