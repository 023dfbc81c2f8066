//! Core data models for Passbook
//!
//! Balance is a bare `Money` total; everything else that the ledger and the
//! access-control layer persist is modelled here.

pub mod credential;
pub mod expense;
pub mod ids;
pub mod money;
pub mod month;
pub mod period;
pub mod rate_limit;
pub mod session;

pub use credential::Credential;
pub use expense::{Expense, DEFAULT_DESCRIPTION, MAX_DESCRIPTION_LEN};
pub use ids::{ExpenseId, SessionToken};
pub use money::{Money, MoneyParseError};
pub use month::MonthLedger;
pub use period::Period;
pub use rate_limit::{RateLimitEntry, RateLimitState};
pub use session::Session;
