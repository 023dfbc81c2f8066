//! Auth CLI commands
//!
//! PIN setup, login/logout and PIN changes. A successful login saves the
//! session token in the data directory so later commands pick it up.

use std::fs::OpenOptions;
use std::io::Write;

use clap::Subcommand;

use super::{read_pin, CliContext};
use crate::error::{PassbookError, PassbookResult, ValidationError};
use crate::models::RateLimitState;
use crate::storage::file_io::remove_if_exists;

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Show whether a PIN is set, lockout state and session state
    Status,
    /// Set the PIN for the first time
    Setup,
    /// Verify the PIN and start a session
    Login {
        /// Also print the session token (for PASSBOOK_TOKEN)
        #[arg(long)]
        print_token: bool,
    },
    /// End the current session
    Logout,
    /// Change the PIN
    ChangePin,
}

/// Handle an auth command
pub fn handle_auth_command(ctx: &CliContext, cmd: AuthCommands) -> PassbookResult<()> {
    let auth = ctx.auth();

    match cmd {
        AuthCommands::Status => {
            let status = auth.status()?;
            println!("PIN set:  {}", if status.pin_set { "yes" } else { "no" });

            let limit = status.rate_limit;
            match (limit.state, limit.locked_until) {
                (RateLimitState::Locked, Some(until)) => {
                    println!("Lockout:  locked until {}", until.format("%Y-%m-%d %H:%M:%S UTC"))
                }
                _ if limit.attempts == 0 => println!("Lockout:  none"),
                _ => println!("Lockout:  {} failed attempts", limit.attempts),
            }

            let session = match ctx.session_token()? {
                Some(token) if auth.validate_session(&token)? => "active",
                Some(_) => "expired",
                None => "none",
            };
            println!("Session:  {}", session);
        }

        AuthCommands::Setup => {
            if auth.is_setup()? {
                return Err(PassbookError::PinAlreadySet);
            }
            let pin = read_pin("New PIN (4-6 digits): ")?;
            pin.validate()?;
            if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
                let confirm = read_pin("Confirm PIN: ")?;
                if confirm.as_str() != pin.as_str() {
                    return Err(ValidationError::PinMismatch.into());
                }
            }
            auth.setup_pin(&pin)?;
            println!("PIN set. Run 'passbook auth login' to start a session.");
        }

        AuthCommands::Login { print_token } => {
            let pin = read_pin("PIN: ")?;
            let token = auth.verify_pin(&pin)?.into_result()?;
            save_session(ctx, token.as_str())?;
            println!(
                "Logged in. Session valid for {} hours.",
                ctx.settings.auth.session_ttl_hours
            );
            if print_token {
                println!("{}", token.as_str());
            }
        }

        AuthCommands::Logout => {
            if let Some(token) = ctx.session_token()? {
                auth.logout(&token)?;
            }
            remove_if_exists(ctx.paths.session_file())?;
            println!("Logged out.");
        }

        AuthCommands::ChangePin => {
            let current = read_pin("Current PIN: ")?;
            let new = read_pin("New PIN (4-6 digits): ")?;
            auth.change_pin(&current, &new)?;
            println!("PIN changed.");
        }
    }

    Ok(())
}

fn save_session(ctx: &CliContext, token: &str) -> PassbookResult<()> {
    let path = ctx.paths.session_file();
    ctx.paths.ensure_directories()?;

    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&path)
        .map_err(|e| PassbookError::Io(format!("Failed to save session: {}", e)))?;

    // An older file keeps its mode on open; tighten it before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| PassbookError::Io(format!("Failed to protect session file: {}", e)))?;
    }

    file.write_all(token.as_bytes())
        .map_err(|e| PassbookError::Io(format!("Failed to save session: {}", e)))?;
    Ok(())
}
