//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the service layer. It also plays the role of
//! the transport boundary: it finds the caller's session token and checks
//! it before any ledger command runs.

pub mod auth;
pub mod expense;
pub mod month;

pub use auth::{handle_auth_command, AuthCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use month::{handle_month_command, MonthCommands};

use std::io::{BufRead, IsTerminal};

use crate::config::{PassbookPaths, Settings};
use crate::crypto::SecurePin;
use crate::error::{PassbookError, PassbookResult, ValidationError};
use crate::models::{Money, SessionToken};
use crate::services::AuthService;
use crate::storage::Storage;

/// Everything a command handler needs
pub struct CliContext {
    pub paths: PassbookPaths,
    pub settings: Settings,
    pub storage: Storage,
    /// Token given with `--token` or `PASSBOOK_TOKEN`
    pub token: Option<String>,
}

impl CliContext {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.storage, &self.settings.auth)
    }

    /// The caller's token: explicit flag or env var first, then the saved session
    pub fn session_token(&self) -> PassbookResult<Option<SessionToken>> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(Some(SessionToken::from_raw(token)));
        }
        match std::fs::read_to_string(self.paths.session_file()) {
            Ok(saved) if !saved.trim().is_empty() => Ok(Some(SessionToken::from_raw(saved))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PassbookError::Io(format!(
                "Failed to read session file: {}",
                e
            ))),
        }
    }

    /// Fail with `InvalidSession` unless the caller holds a live session
    pub fn require_session(&self) -> PassbookResult<()> {
        let token = self
            .session_token()?
            .ok_or(PassbookError::InvalidSession)?;
        self.auth().require_session(&token)
    }

    pub fn symbol(&self) -> &str {
        &self.settings.currency_symbol
    }
}

/// Parse a user-entered amount
pub fn parse_amount(raw: &str) -> PassbookResult<Money> {
    Ok(Money::parse(raw).map_err(ValidationError::from)?)
}

/// Read a PIN: hidden prompt on a terminal, one line of stdin otherwise
pub fn read_pin(prompt: &str) -> PassbookResult<SecurePin> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let pin = rpassword::prompt_password(prompt)
            .map_err(|e| PassbookError::Io(format!("Failed to read PIN: {}", e)))?;
        return Ok(SecurePin::new(pin));
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| PassbookError::Io(format!("Failed to read PIN: {}", e)))?;
    let pin = SecurePin::new(line.trim());
    zeroize::Zeroize::zeroize(&mut line);
    Ok(pin)
}
