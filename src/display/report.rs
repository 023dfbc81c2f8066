//! Consistency report formatting

use crate::models::Money;
use crate::services::ConsistencyReport;

pub fn format_consistency_report(report: &ConsistencyReport, symbol: &str) -> String {
    let mut output = format!(
        "Checked {} months and {} expenses.\n",
        report.months_checked, report.expenses_checked
    );

    for drift in &report.month_drift {
        output.push_str(&format!(
            "  {}: expenses recorded {} vs actual {}; ending recorded {} vs expected {}\n",
            drift.period,
            drift.recorded_expenses.format_with_symbol(symbol),
            drift.actual_expenses.format_with_symbol(symbol),
            drift.recorded_ending.format_with_symbol(symbol),
            drift.expected_ending.format_with_symbol(symbol),
        ));
    }
    for period in &report.orphaned_periods {
        output.push_str(&format!("  {}: expenses without a month summary\n", period));
    }
    if report.balance_drift() != Some(Money::zero()) {
        output.push_str(&format!(
            "  Balance: recorded {} vs expected {}\n",
            report.recorded_balance.format_with_symbol(symbol),
            report.expected_balance.format_with_symbol(symbol),
        ));
    }

    if report.is_consistent() {
        output.push_str("Ledger is consistent.\n");
    } else {
        output.push_str("Ledger has drifted; the figures above need manual repair.\n");
    }
    output
}
