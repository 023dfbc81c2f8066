//! Month display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::expense::format_expense_table;
use crate::models::MonthLedger;
use crate::services::{MonthData, MonthPage};

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Saved")]
    saved: String,
}

/// Format a page of the month list
pub fn format_month_list(page: &MonthPage, symbol: &str) -> String {
    if page.months.is_empty() {
        return "No months found.\n".to_string();
    }

    let rows: Vec<MonthRow> = page
        .months
        .iter()
        .map(|item| MonthRow {
            month: item.period.to_string(),
            saved: item.monthly_saved.format_with_symbol(symbol),
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    if let Some(cursor) = &page.next_cursor {
        output.push_str(&format!("\nMore months: --cursor {}\n", cursor));
    }
    output
}

/// Format the counters of one month
pub fn format_month_summary(month: &MonthLedger, symbol: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Month: {}\n", month.period));
    output.push_str(&format!(
        "  Starting balance: {:>12}\n",
        month.starting_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Allowance added:  {:>12}\n",
        month.allowance_added.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Expenses:         {:>12}\n",
        month.total_expenses.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Ending balance:   {:>12}\n",
        month.ending_balance.format_with_symbol(symbol)
    ));
    output
}

/// Format a month's detail page: summary, expenses and balance
pub fn format_month_data(data: &MonthData, symbol: &str) -> String {
    let mut output = format_month_summary(&data.month, symbol);
    output.push('\n');
    output.push_str(&format_expense_table(&data.expenses, symbol));
    if let Some(cursor) = &data.next_cursor {
        output.push_str(&format!("\nMore expenses: --cursor {}\n", cursor));
    }
    output.push_str(&format!(
        "\nTotal balance: {}\n",
        data.total_balance.format_with_symbol(symbol)
    ));
    output
}
