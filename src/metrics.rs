use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::alerts;
use crate::forecast;
use crate::health;
use crate::models::{
    BudgetStatus, CategoryBreakdown, ExpenseRecord, FinancialData, FinancialSummary,
    InvoiceStatus, MonthlyHistoryRecord, MonthlyTrend, OverviewMetrics, PaymentRecord,
    PaymentStatus,
};

const RECENT_TRANSACTION_LIMIT: usize = 10;

/// Transform the six fetched collections into a full dashboard summary.
///
/// Pure over its inputs: the caller supplies `now`, and identical inputs
/// always produce an identical summary. Missing optional data (absent budget
/// row, empty history) degrades to zero-valued metrics rather than erroring.
pub fn compute_financial_summary(data: &FinancialData, now: DateTime<Utc>) -> FinancialSummary {
    let overview = overview_metrics(data, now);
    let financial_health = health::score_health(&overview);
    let predictions = forecast::project_next_month(&overview, &data.history);
    let alerts = alerts::generate_alerts(&overview, &financial_health);

    let budget_status = BudgetStatus {
        year: data
            .budget
            .as_ref()
            .map(|b| b.year)
            .unwrap_or_else(|| now.year()),
        allocated: overview.budget_allocated,
        utilized: overview.budget_utilized,
        utilization: overview.budget_utilization,
        remaining: overview.budget_remaining,
    };

    FinancialSummary {
        transactions: recent_transactions(&data.payments),
        revenue_trends: revenue_trends(&data.history),
        expense_breakdown: expense_breakdown(&data.expenses),
        budget_status,
        overview,
        financial_health,
        predictions,
        alerts,
    }
}

fn overview_metrics(data: &FinancialData, now: DateTime<Utc>) -> OverviewMetrics {
    let today = now.date_naive();

    let mut total_revenue = 0.0;
    let mut monthly_revenue = 0.0;
    let mut pending_payments = 0.0;
    let mut completed_payments = 0usize;
    let mut total_pending = 0usize;

    for payment in data.payments.iter() {
        match payment.status {
            PaymentStatus::Completed => {
                total_revenue += payment.amount;
                completed_payments += 1;
                if same_month(payment.created_at.date_naive(), today) {
                    monthly_revenue += payment.amount;
                }
            }
            PaymentStatus::Pending => {
                pending_payments += payment.amount;
                total_pending += 1;
            }
            _ => {}
        }
    }

    let mut overdue_payments = 0.0;
    let mut total_overdue = 0usize;
    let mut students_with_balance = 0usize;
    for invoice in data.invoices.iter() {
        if invoice.status == InvoiceStatus::Overdue {
            overdue_payments += invoice.amount;
            total_overdue += 1;
        }
        if invoice.status != InvoiceStatus::Paid {
            students_with_balance += 1;
        }
    }

    let total_expenses: f64 = data.expenses.iter().map(|e| e.amount).sum();
    let monthly_expenses: f64 = data
        .expenses
        .iter()
        .filter(|e| same_month(e.date, today))
        .map(|e| e.amount)
        .sum();

    let budget_allocated = data
        .budget
        .as_ref()
        .map(|b| b.allocated_amount)
        .unwrap_or(0.0);
    let budget_utilized = monthly_expenses;
    let budget_utilization = if budget_allocated > 0.0 {
        round2(budget_utilized / budget_allocated * 100.0)
    } else {
        0.0
    };
    let budget_remaining = budget_allocated - budget_utilized;

    let active_students = data.students.iter().filter(|s| s.is_active).count();

    // Count-based ratio gated on a currency-based revenue total; callers
    // depend on this exact shape.
    let attempted = completed_payments + total_pending + total_overdue;
    let collection_rate = if total_revenue > 0.0 && attempted > 0 {
        round2(completed_payments as f64 / attempted as f64 * 100.0)
    } else {
        0.0
    };

    let net_profit = total_revenue - total_expenses;
    let profit_margin = if total_revenue > 0.0 {
        round2(net_profit / total_revenue * 100.0)
    } else {
        0.0
    };

    OverviewMetrics {
        total_revenue,
        monthly_revenue,
        pending_payments,
        overdue_payments,
        completed_payments,
        total_pending,
        total_overdue,
        total_expenses,
        monthly_expenses,
        budget_allocated,
        budget_utilized,
        budget_utilization,
        budget_remaining,
        active_students,
        students_with_balance,
        collection_rate,
        net_profit,
        profit_margin,
    }
}

pub fn expense_breakdown(expenses: &[ExpenseRecord]) -> Vec<CategoryBreakdown> {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let mut by_category: std::collections::HashMap<String, f64> =
        std::collections::HashMap::new();

    for expense in expenses {
        *by_category.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    let mut breakdown: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryBreakdown {
            category,
            amount,
            percentage: if total > 0.0 {
                round2(amount / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

pub fn revenue_trends(history: &[MonthlyHistoryRecord]) -> Vec<MonthlyTrend> {
    history
        .iter()
        .map(|record| MonthlyTrend {
            month: record.month.format("%Y-%m").to_string(),
            revenue: record.revenue,
            expenses: record.expenses,
        })
        .collect()
}

fn recent_transactions(payments: &[PaymentRecord]) -> Vec<PaymentRecord> {
    let mut recent = payments.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    recent.truncate(RECENT_TRANSACTION_LIMIT);
    recent
}

fn same_month(date: NaiveDate, reference: NaiveDate) -> bool {
    date.year() == reference.year() && date.month() == reference.month()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
