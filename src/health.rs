use crate::models::{FinancialHealth, HealthStatus, OverviewMetrics};

/// Additive penalty score starting from 100.
///
/// The thresholds and penalty sizes are part of the dashboard's contract;
/// downstream alerting and the rendered status labels assume them exactly.
pub fn score_health(overview: &OverviewMetrics) -> FinancialHealth {
    let mut score = 100.0;

    if overview.collection_rate < 80.0 {
        score -= 80.0 - overview.collection_rate;
    }
    if overview.budget_utilization > 90.0 {
        score -= overview.budget_utilization - 90.0;
    }
    if overview.overdue_payments > 0.10 * overview.total_revenue {
        score -= 20.0;
    }
    if overview.total_revenue < overview.total_expenses {
        score -= 30.0;
    }

    let score = score.clamp(0.0, 100.0).round() as u8;
    let status = status_for(score);

    FinancialHealth {
        score,
        status,
        color: status.color().to_string(),
    }
}

pub fn status_for(score: u8) -> HealthStatus {
    match score {
        80..=u8::MAX => HealthStatus::Excellent,
        60..=79 => HealthStatus::Good,
        40..=59 => HealthStatus::Fair,
        _ => HealthStatus::Poor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_overview() -> OverviewMetrics {
        OverviewMetrics {
            total_revenue: 100_000.0,
            monthly_revenue: 10_000.0,
            pending_payments: 0.0,
            overdue_payments: 0.0,
            completed_payments: 50,
            total_pending: 0,
            total_overdue: 0,
            total_expenses: 60_000.0,
            monthly_expenses: 5_000.0,
            budget_allocated: 10_000.0,
            budget_utilized: 5_000.0,
            budget_utilization: 50.0,
            budget_remaining: 5_000.0,
            active_students: 120,
            students_with_balance: 4,
            collection_rate: 100.0,
            net_profit: 40_000.0,
            profit_margin: 40.0,
        }
    }

    #[test]
    fn no_penalties_scores_100() {
        let health = score_health(&healthy_overview());
        assert_eq!(health.score, 100);
        assert_eq!(health.status, HealthStatus::Excellent);
        assert_eq!(health.color, "green");
    }

    #[test]
    fn low_collection_rate_subtracts_shortfall() {
        let mut overview = healthy_overview();
        overview.collection_rate = 65.0;
        let health = score_health(&overview);
        assert_eq!(health.score, 85);
    }

    #[test]
    fn high_utilization_subtracts_excess_over_90() {
        let mut overview = healthy_overview();
        overview.budget_utilization = 95.0;
        let health = score_health(&overview);
        assert_eq!(health.score, 95);
        assert_eq!(health.status, HealthStatus::Excellent);
    }

    #[test]
    fn overdue_above_tenth_of_revenue_costs_flat_20() {
        let mut overview = healthy_overview();
        overview.overdue_payments = 15_000.0;
        let health = score_health(&overview);
        assert_eq!(health.score, 80);

        // At exactly 10% the penalty does not fire.
        overview.overdue_payments = 10_000.0;
        assert_eq!(score_health(&overview).score, 100);
    }

    #[test]
    fn spending_beyond_revenue_costs_flat_30() {
        let mut overview = healthy_overview();
        overview.total_expenses = 150_000.0;
        let health = score_health(&overview);
        assert_eq!(health.score, 70);
        assert_eq!(health.status, HealthStatus::Good);
        assert_eq!(health.color, "blue");
    }

    #[test]
    fn zero_activity_scores_20() {
        // With no data at all the collection-rate fallback of 0 draws the
        // full 80-point shortfall and nothing else fires.
        let overview = OverviewMetrics {
            total_revenue: 0.0,
            monthly_revenue: 0.0,
            pending_payments: 0.0,
            overdue_payments: 0.0,
            completed_payments: 0,
            total_pending: 0,
            total_overdue: 0,
            total_expenses: 0.0,
            monthly_expenses: 0.0,
            budget_allocated: 0.0,
            budget_utilized: 0.0,
            budget_utilization: 0.0,
            budget_remaining: 0.0,
            active_students: 0,
            students_with_balance: 0,
            collection_rate: 0.0,
            net_profit: 0.0,
            profit_margin: 0.0,
        };

        let health = score_health(&overview);
        assert_eq!(health.score, 20);
        assert_eq!(health.status, HealthStatus::Poor);
        assert_eq!(health.color, "red");
    }

    #[test]
    fn pathological_inputs_stay_clamped() {
        let mut overview = healthy_overview();
        overview.collection_rate = 0.0;
        overview.budget_utilization = 400.0;
        overview.overdue_payments = overview.total_revenue;
        overview.total_expenses = overview.total_revenue * 10.0;
        let health = score_health(&overview);
        assert_eq!(health.score, 0);
        assert_eq!(health.status, HealthStatus::Poor);
    }

    #[test]
    fn status_tiers() {
        assert_eq!(status_for(100), HealthStatus::Excellent);
        assert_eq!(status_for(80), HealthStatus::Excellent);
        assert_eq!(status_for(79), HealthStatus::Good);
        assert_eq!(status_for(60), HealthStatus::Good);
        assert_eq!(status_for(59), HealthStatus::Fair);
        assert_eq!(status_for(40), HealthStatus::Fair);
        assert_eq!(status_for(39), HealthStatus::Poor);
        assert_eq!(status_for(0), HealthStatus::Poor);
    }
}
