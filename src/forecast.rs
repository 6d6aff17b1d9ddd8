use crate::metrics::round2;
use crate::models::{MonthlyHistoryRecord, OverviewMetrics, Predictions};

/// Months of history required before extrapolating at all.
const MIN_HISTORY_MONTHS: usize = 3;
/// Trailing window the revenue average is taken over.
const TRAILING_WINDOW_MONTHS: usize = 6;
/// Flat assumed month-over-month expense inflation.
const EXPENSE_INFLATION: f64 = 1.02;

/// Naive next-month projection from trailing monthly history.
///
/// Deliberately a linear extrapolation and a fixed inflation constant, not a
/// time-series model; the rendered dashboard figures depend on these exact
/// formulas.
pub fn project_next_month(
    overview: &OverviewMetrics,
    history: &[MonthlyHistoryRecord],
) -> Predictions {
    let current_revenue = overview.monthly_revenue;
    let current_expenses = overview.monthly_expenses;

    if history.len() < MIN_HISTORY_MONTHS {
        return Predictions {
            next_month_revenue: current_revenue,
            next_month_expenses: current_expenses,
            growth_rate: 0.0,
        };
    }

    let start = history.len().saturating_sub(TRAILING_WINDOW_MONTHS);
    let window = &history[start..];
    let avg_revenue = window.iter().map(|m| m.revenue).sum::<f64>() / window.len() as f64;

    let growth_rate = if avg_revenue > 0.0 {
        round2((current_revenue - avg_revenue) / avg_revenue * 100.0)
    } else {
        0.0
    };

    Predictions {
        next_month_revenue: (current_revenue * (1.0 + growth_rate / 100.0)).round(),
        next_month_expenses: (current_expenses * EXPENSE_INFLATION).round(),
        growth_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn month_record(month: u32, revenue: f64) -> MonthlyHistoryRecord {
        MonthlyHistoryRecord {
            month: NaiveDate::from_ymd_opt(2025, month, 1).unwrap(),
            revenue,
            expenses: revenue * 0.4,
        }
    }

    fn overview(monthly_revenue: f64, monthly_expenses: f64) -> OverviewMetrics {
        OverviewMetrics {
            total_revenue: monthly_revenue * 12.0,
            monthly_revenue,
            pending_payments: 0.0,
            overdue_payments: 0.0,
            completed_payments: 10,
            total_pending: 0,
            total_overdue: 0,
            total_expenses: monthly_expenses * 12.0,
            monthly_expenses,
            budget_allocated: 0.0,
            budget_utilized: monthly_expenses,
            budget_utilization: 0.0,
            budget_remaining: 0.0,
            active_students: 0,
            students_with_balance: 0,
            collection_rate: 100.0,
            net_profit: 0.0,
            profit_margin: 0.0,
        }
    }

    #[test]
    fn short_history_falls_back_to_current_values() {
        let history = vec![month_record(1, 900.0), month_record(2, 1100.0)];
        let predictions = project_next_month(&overview(1200.0, 500.0), &history);

        assert_eq!(predictions.next_month_revenue, 1200.0);
        assert_eq!(predictions.next_month_expenses, 500.0);
        assert_eq!(predictions.growth_rate, 0.0);
    }

    #[test]
    fn growth_rate_measured_against_trailing_average() {
        let history = vec![
            month_record(1, 1000.0),
            month_record(2, 1000.0),
            month_record(3, 1000.0),
        ];
        let predictions = project_next_month(&overview(1100.0, 500.0), &history);

        // avg 1000, current 1100 -> +10%
        assert_eq!(predictions.growth_rate, 10.0);
        assert_eq!(predictions.next_month_revenue, 1210.0);
    }

    #[test]
    fn only_last_six_months_feed_the_average() {
        let mut history = vec![
            month_record(1, 1_000_000.0),
            month_record(2, 1_000_000.0),
        ];
        for month in 3..=8 {
            history.push(month_record(month, 1000.0));
        }

        let predictions = project_next_month(&overview(1000.0, 0.0), &history);
        // The two million-revenue months fall outside the window.
        assert_eq!(predictions.growth_rate, 0.0);
        assert_eq!(predictions.next_month_revenue, 1000.0);
    }

    #[test]
    fn zero_trailing_average_yields_zero_growth() {
        let history = vec![
            month_record(1, 0.0),
            month_record(2, 0.0),
            month_record(3, 0.0),
        ];
        let predictions = project_next_month(&overview(1000.0, 200.0), &history);

        assert_eq!(predictions.growth_rate, 0.0);
        assert_eq!(predictions.next_month_revenue, 1000.0);
    }

    #[test]
    fn expenses_projected_at_flat_two_percent() {
        let history = vec![
            month_record(1, 1000.0),
            month_record(2, 1000.0),
            month_record(3, 1000.0),
        ];
        let predictions = project_next_month(&overview(1000.0, 850.0), &history);

        assert_eq!(predictions.next_month_expenses, 867.0);
    }

    #[test]
    fn projections_round_to_whole_amounts() {
        let history = vec![
            month_record(1, 1000.0),
            month_record(2, 1000.0),
            month_record(3, 1030.0),
        ];
        let predictions = project_next_month(&overview(1005.0, 333.0), &history);

        assert_eq!(predictions.next_month_revenue, predictions.next_month_revenue.round());
        assert_eq!(predictions.next_month_expenses, predictions.next_month_expenses.round());
    }
}
