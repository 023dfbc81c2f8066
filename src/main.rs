use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use passbook::cli::{
    handle_auth_command, handle_expense_command, handle_month_command, AuthCommands, CliContext,
    ExpenseCommands, MonthCommands,
};
use passbook::config::{PassbookPaths, Settings};
use passbook::display::format_consistency_report;
use passbook::services::{ConsistencyChecker, LedgerService};
use passbook::storage::Storage;
use passbook::PassbookError;

#[derive(Parser)]
#[command(
    name = "passbook",
    version,
    about = "Allowance ledger with PIN-guarded access",
    long_about = "Passbook tracks a running balance, a monthly allowance and the \
                  expenses paid out of it. Ledger commands need a session from \
                  'passbook auth login'."
)]
struct Cli {
    /// Session token (defaults to the one saved by 'auth login')
    #[arg(long, global = true, env = "PASSBOOK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// PIN and session commands
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Show the total balance
    Balance,

    /// Month management commands
    #[command(subcommand)]
    Month(MonthCommands),

    /// Expense management commands
    #[command(subcommand, alias = "exp")]
    Expense(ExpenseCommands),

    /// Recompute all totals from the expense records and report drift
    Check,

    /// Show current configuration and paths
    Config,
}

fn main() -> ExitCode {
    passbook::logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<PassbookError>()
                .map(PassbookError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        println!("Passbook - allowance ledger");
        println!();
        println!("Run 'passbook --help' for usage information.");
        println!("Run 'passbook auth setup' to choose a PIN.");
        return Ok(());
    };

    // Initialize paths and settings
    let paths = PassbookPaths::new()?;
    let settings = Settings::load(&paths)?;

    let storage = Storage::open(&paths)?;
    let ctx = CliContext {
        paths,
        settings,
        storage,
        token: cli.token,
    };

    match command {
        Commands::Auth(cmd) => handle_auth_command(&ctx, cmd)?,
        Commands::Balance => {
            ctx.require_session()?;
            let ledger = LedgerService::new(&ctx.storage, ctx.settings.monthly_allowance);
            println!(
                "Total balance: {}",
                ledger.get_balance()?.format_with_symbol(ctx.symbol())
            );
        }
        Commands::Month(cmd) => {
            ctx.require_session()?;
            handle_month_command(&ctx, cmd)?;
        }
        Commands::Expense(cmd) => {
            ctx.require_session()?;
            handle_expense_command(&ctx, cmd)?;
        }
        Commands::Check => {
            ctx.require_session()?;
            let report = ConsistencyChecker::new(&ctx.storage).check()?;
            print!("{}", format_consistency_report(&report, ctx.symbol()));
        }
        Commands::Config => show_config(&ctx.paths, &ctx.settings),
    }

    Ok(())
}

fn show_config(paths: &PassbookPaths, settings: &Settings) {
    println!("Passbook Configuration");
    println!("======================");
    println!("Base directory:   {}", paths.base_dir().display());
    println!("Store file:       {}", paths.store_file().display());
    println!("Settings file:    {}", paths.settings_file().display());
    println!();
    println!("Settings:");
    println!(
        "  Monthly allowance: {}",
        settings
            .monthly_allowance
            .format_with_symbol(&settings.currency_symbol)
    );
    println!("  Page size:         {}", settings.default_page_size);
    println!(
        "  Lockout:           {} attempts, {} minutes",
        settings.auth.lockout_attempts, settings.auth.lockout_minutes
    );
    println!("  Session length:    {} hours", settings.auth.session_ttl_hours);
}
