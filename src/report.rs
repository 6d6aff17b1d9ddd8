use std::fmt::Write;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::FinancialSummary;

pub fn build_report(
    org_id: Uuid,
    generated_at: DateTime<Utc>,
    summary: &FinancialSummary,
) -> String {
    let mut output = String::new();
    let overview = &summary.overview;

    let _ = writeln!(output, "# Transport Finance Report");
    let _ = writeln!(
        output,
        "Organization {} (generated {})",
        org_id,
        generated_at.format("%Y-%m-%d")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total revenue: {:.2}", overview.total_revenue);
    let _ = writeln!(output, "- Revenue this month: {:.2}", overview.monthly_revenue);
    let _ = writeln!(output, "- Total expenses: {:.2}", overview.total_expenses);
    let _ = writeln!(output, "- Expenses this month: {:.2}", overview.monthly_expenses);
    let _ = writeln!(
        output,
        "- Net profit: {:.2} (margin {:.2}%)",
        overview.net_profit, overview.profit_margin
    );
    let _ = writeln!(
        output,
        "- Pending: {:.2} across {} payments",
        overview.pending_payments, overview.total_pending
    );
    let _ = writeln!(
        output,
        "- Overdue: {:.2} across {} invoices",
        overview.overdue_payments, overview.total_overdue
    );
    let _ = writeln!(output, "- Collection rate: {:.2}%", overview.collection_rate);
    let _ = writeln!(
        output,
        "- Active students: {} ({} with an open balance)",
        overview.active_students, overview.students_with_balance
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Financial Health");
    let _ = writeln!(
        output,
        "Score {}/100 ({}, {})",
        summary.financial_health.score,
        summary.financial_health.status.label(),
        summary.financial_health.color
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Budget ({})", summary.budget_status.year);
    if summary.budget_status.allocated > 0.0 {
        let _ = writeln!(
            output,
            "- Allocated {:.2}, spent {:.2} this month ({:.2}% utilized, {:.2} remaining)",
            summary.budget_status.allocated,
            summary.budget_status.utilized,
            summary.budget_status.utilization,
            summary.budget_status.remaining
        );
    } else {
        let _ = writeln!(output, "No budget allocated for this year.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Expense Breakdown");
    if summary.expense_breakdown.is_empty() {
        let _ = writeln!(output, "No expenses recorded.");
    } else {
        for category in summary.expense_breakdown.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.2} ({:.2}%)",
                category.category, category.amount, category.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Revenue Trend");
    if summary.revenue_trends.is_empty() {
        let _ = writeln!(output, "No monthly history available.");
    } else {
        for trend in summary.revenue_trends.iter() {
            let _ = writeln!(
                output,
                "- {}: revenue {:.2}, expenses {:.2}",
                trend.month, trend.revenue, trend.expenses
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Next Month Outlook");
    let _ = writeln!(
        output,
        "Projected revenue {:.0}, projected expenses {:.0} (growth rate {:.2}%)",
        summary.predictions.next_month_revenue,
        summary.predictions.next_month_expenses,
        summary.predictions.growth_rate
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts");
    if summary.alerts.is_empty() {
        let _ = writeln!(output, "No active alerts.");
    } else {
        for alert in summary.alerts.iter() {
            let _ = writeln!(
                output,
                "- [{:?}/{:?}] {}: {}",
                alert.kind, alert.priority, alert.title, alert.message
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Transactions");
    if summary.transactions.is_empty() {
        let _ = writeln!(output, "No payments recorded.");
    } else {
        for payment in summary.transactions.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} paid {:.2} ({}, {}) on {}",
                payment.student_name.as_deref().unwrap_or("Unknown student"),
                payment.amount,
                payment.payment_type,
                payment.status.as_str(),
                payment.created_at.format("%Y-%m-%d")
            );
        }
    }

    output
}
