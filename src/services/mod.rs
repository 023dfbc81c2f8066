//! Service layer for Passbook
//!
//! The service layer provides business logic on top of the storage layer:
//! PIN authentication with rate limiting and sessions, and the ledger that
//! keeps balance, month and expense records in step.

pub mod auth;
pub mod consistency;
pub mod ledger;
pub mod rate_limit;
pub mod session;

pub use auth::{AuthService, AuthStatus, VerifyOutcome};
pub use consistency::{ConsistencyChecker, ConsistencyReport, MonthDrift};
pub use ledger::{
    ExpenseChanges, ExpenseResponse, LedgerService, MonthData, MonthListItem, MonthPage,
    MonthResponse,
};
pub use rate_limit::{FailureOutcome, RateLimitPolicy, RateLimitStatus, RateLimiter};
pub use session::SessionService;
