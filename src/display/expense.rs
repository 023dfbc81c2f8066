//! Expense display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Expense;
use crate::services::ExpenseResponse;

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Format expenses as a table, in the order given
pub fn format_expense_table(expenses: &[Expense], symbol: &str) -> String {
    if expenses.is_empty() {
        return "No expenses.\n".to_string();
    }

    let rows: Vec<ExpenseRow> = expenses
        .iter()
        .map(|e| ExpenseRow {
            id: e.id.to_string(),
            date: e.created_at.format("%Y-%m-%d %H:%M").to_string(),
            amount: e.amount.format_with_symbol(symbol),
            description: e.description.clone(),
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format the result of adding, updating or deleting an expense
pub fn format_expense_change(verb: &str, response: &ExpenseResponse, symbol: &str) -> String {
    let expense = &response.expense;
    format!(
        "{} expense {} ({}): {}\n  Month {} balance: {}\n  Total balance: {}\n",
        verb,
        expense.id,
        expense.description,
        expense.amount.format_with_symbol(symbol),
        expense.period,
        response.month_balance.format_with_symbol(symbol),
        response.total_balance.format_with_symbol(symbol),
    )
}
