//! Passbook - a single-user allowance ledger with PIN-guarded access
//!
//! Passbook keeps a running balance, one ledger per calendar month and the
//! expenses recorded against each month. Access goes through a numeric PIN
//! with progressive lockout and short-lived sessions.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and settings
//! - `error`: Error types and exit codes
//! - `models`: Money, periods, ledger entities
//! - `crypto`: PIN hashing and in-memory PIN handling
//! - `storage`: Key-value store, its implementations and typed repositories
//! - `services`: Authentication, rate limiting, sessions and the ledger
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust
//! use passbook::models::Money;
//! use passbook::services::LedgerService;
//! use passbook::storage::Storage;
//!
//! let storage = Storage::in_memory();
//! let ledger = LedgerService::new(&storage, Money::from_cents(10000));
//! let created = ledger.create_month("2026-03").unwrap();
//! assert_eq!(created.total_balance, Money::from_cents(10000));
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{PassbookError, PassbookResult};
