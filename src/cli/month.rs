//! Month CLI commands

use clap::Subcommand;

use super::{parse_amount, CliContext};
use crate::display::{format_month_data, format_month_list, format_month_summary};
use crate::error::PassbookResult;
use crate::models::Period;
use crate::services::LedgerService;

/// Month subcommands
#[derive(Subcommand)]
pub enum MonthCommands {
    /// Open a month with the configured allowance
    Create {
        /// Month (YYYY-MM), defaults to the current month
        period: Option<String>,
    },
    /// List months, newest first
    List {
        /// Months per page (1-100)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Cursor printed by the previous page
        #[arg(short, long)]
        cursor: Option<String>,
    },
    /// Show a month's summary and expenses
    Show {
        /// Month (YYYY-MM), defaults to the current month
        period: Option<String>,
        /// Expenses per page (1-100)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Cursor printed by the previous page
        #[arg(short, long)]
        cursor: Option<String>,
    },
    /// Add extra funds to a month
    AddFunds {
        /// Month (YYYY-MM)
        period: String,
        /// Amount (e.g., "20" or "12.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

/// Handle a month command; the caller must already hold a session
pub fn handle_month_command(ctx: &CliContext, cmd: MonthCommands) -> PassbookResult<()> {
    let ledger = LedgerService::new(&ctx.storage, ctx.settings.monthly_allowance);
    let symbol = ctx.symbol();

    match cmd {
        MonthCommands::Create { period } => {
            let period = period.unwrap_or_else(|| Period::current().to_string());
            let created = ledger.create_month(&period)?;
            println!("Opened month {}.", created.month.period);
            print!("{}", format_month_summary(&created.month, symbol));
            println!(
                "Total balance: {}",
                created.total_balance.format_with_symbol(symbol)
            );
        }

        MonthCommands::List { limit, cursor } => {
            let page = ledger.list_months(Some(ctx.settings.page_size(limit)), cursor.as_deref())?;
            print!("{}", format_month_list(&page, symbol));
        }

        MonthCommands::Show {
            period,
            limit,
            cursor,
        } => {
            let period = period.unwrap_or_else(|| Period::current().to_string());
            let data = ledger.get_month_data(
                &period,
                Some(ctx.settings.page_size(limit)),
                cursor.as_deref(),
            )?;
            print!("{}", format_month_data(&data, symbol));
        }

        MonthCommands::AddFunds { period, amount } => {
            let amount = parse_amount(&amount)?;
            let updated = ledger.add_funds(&period, amount)?;
            println!(
                "Added {} to {}.",
                amount.format_with_symbol(symbol),
                updated.month.period
            );
            print!("{}", format_month_summary(&updated.month, symbol));
            println!(
                "Total balance: {}",
                updated.total_balance.format_with_symbol(symbol)
            );
        }
    }

    Ok(())
}
