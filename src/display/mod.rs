//! Display formatting for terminal output
//!
//! Turns service responses into tables and short summaries. Every amount is
//! printed with the configured currency symbol.

pub mod expense;
pub mod month;
pub mod report;

pub use expense::{format_expense_change, format_expense_table};
pub use month::{format_month_data, format_month_list, format_month_summary};
pub use report::format_consistency_report;
