//! Expense CLI commands

use clap::Subcommand;

use super::{parse_amount, CliContext};
use crate::display::format_expense_change;
use crate::error::PassbookResult;
use crate::services::{ExpenseChanges, LedgerService};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense in the current month
    Add {
        /// Amount (e.g., "4.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// What it was for (defaults to "Expense")
        #[arg(trailing_var_arg = true)]
        description: Vec<String>,
    },
    /// Change an expense's amount or description
    Update {
        /// Month the expense belongs to (YYYY-MM)
        period: String,
        /// Expense ID as shown by `month show`
        id: String,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an expense and refund its amount
    Delete {
        /// Month the expense belongs to (YYYY-MM)
        period: String,
        /// Expense ID as shown by `month show`
        id: String,
    },
}

/// Handle an expense command; the caller must already hold a session
pub fn handle_expense_command(ctx: &CliContext, cmd: ExpenseCommands) -> PassbookResult<()> {
    let ledger = LedgerService::new(&ctx.storage, ctx.settings.monthly_allowance);
    let symbol = ctx.symbol();

    match cmd {
        ExpenseCommands::Add {
            amount,
            description,
        } => {
            let amount = parse_amount(&amount)?;
            let added = ledger.add_expense(amount, &description.join(" "))?;
            print!("{}", format_expense_change("Added", &added, symbol));
        }

        ExpenseCommands::Update {
            period,
            id,
            amount,
            description,
        } => {
            let changes = ExpenseChanges {
                amount: amount.as_deref().map(parse_amount).transpose()?,
                description,
            };
            let updated = ledger.update_expense(&period, &id, changes)?;
            print!("{}", format_expense_change("Updated", &updated, symbol));
        }

        ExpenseCommands::Delete { period, id } => {
            let deleted = ledger.delete_expense(&period, &id)?;
            print!("{}", format_expense_change("Deleted", &deleted, symbol));
        }
    }

    Ok(())
}
