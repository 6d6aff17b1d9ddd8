use crate::models::{Alert, AlertKind, AlertPriority, FinancialHealth, OverviewMetrics};

const OVERDUE_ALERT_THRESHOLD: f64 = 10_000.0;
const BUDGET_ALERT_THRESHOLD: f64 = 90.0;
const HEALTH_ALERT_THRESHOLD: u8 = 50;
const PENDING_ALERT_THRESHOLD: f64 = 5_000.0;

/// Map the computed overview to a prioritized alert list.
///
/// Every rule is evaluated independently and all matches fire, in the order
/// listed. An empty list means all clear.
pub fn generate_alerts(overview: &OverviewMetrics, health: &FinancialHealth) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if overview.overdue_payments > OVERDUE_ALERT_THRESHOLD {
        alerts.push(Alert {
            id: "high-overdue".to_string(),
            kind: AlertKind::Error,
            title: "High Overdue Amount".to_string(),
            message: format!(
                "{:.2} is overdue across {} invoices",
                overview.overdue_payments, overview.total_overdue
            ),
            priority: AlertPriority::High,
        });
    }

    if overview.budget_utilization > BUDGET_ALERT_THRESHOLD {
        alerts.push(Alert {
            id: "budget-exhausted".to_string(),
            kind: AlertKind::Warning,
            title: "Budget Nearly Exhausted".to_string(),
            message: format!(
                "{:.2}% of the {:.2} allocated budget is already spent this month",
                overview.budget_utilization, overview.budget_allocated
            ),
            priority: AlertPriority::Medium,
        });
    }

    if health.score < HEALTH_ALERT_THRESHOLD {
        alerts.push(Alert {
            id: "poor-health".to_string(),
            kind: AlertKind::Error,
            title: "Poor Financial Health".to_string(),
            message: format!(
                "Financial health score dropped to {} ({})",
                health.score,
                health.status.label()
            ),
            priority: AlertPriority::High,
        });
    }

    if overview.pending_payments > PENDING_ALERT_THRESHOLD {
        alerts.push(Alert {
            id: "pending-backlog".to_string(),
            kind: AlertKind::Info,
            title: "Pending Payments".to_string(),
            message: format!(
                "{:.2} across {} payments is awaiting collection",
                overview.pending_payments, overview.total_pending
            ),
            priority: AlertPriority::Medium,
        });
    }

    alerts
}
