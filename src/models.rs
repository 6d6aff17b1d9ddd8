use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
}

impl InvoiceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "paid" => Some(Self::Paid),
            "pending" => Some(Self::Pending),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub payment_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    pub id: Uuid,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub grade_level: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRecord {
    pub allocated_amount: f64,
    pub year: i32,
}

/// One month of rolled-up revenue and expenses, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyHistoryRecord {
    pub month: NaiveDate,
    pub revenue: f64,
    pub expenses: f64,
}

/// The six collections the calculator runs over, fetched together.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialData {
    pub payments: Vec<PaymentRecord>,
    pub invoices: Vec<InvoiceRecord>,
    pub expenses: Vec<ExpenseRecord>,
    pub students: Vec<StudentRecord>,
    pub budget: Option<BudgetRecord>,
    pub history: Vec<MonthlyHistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewMetrics {
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub pending_payments: f64,
    pub overdue_payments: f64,
    pub completed_payments: usize,
    pub total_pending: usize,
    pub total_overdue: usize,
    pub total_expenses: f64,
    pub monthly_expenses: f64,
    pub budget_allocated: f64,
    pub budget_utilized: f64,
    pub budget_utilization: f64,
    pub budget_remaining: f64,
    pub active_students: usize,
    pub students_with_balance: usize,
    pub collection_rate: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub year: i32,
    pub allocated: f64,
    pub utilized: f64,
    pub utilization: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "green",
            Self::Good => "blue",
            Self::Fair => "yellow",
            Self::Poor => "red",
        }
    }
}

/// Heuristic 0-100 composite indicator, not an audit-grade metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialHealth {
    pub score: u8,
    pub status: HealthStatus,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub next_month_revenue: f64,
    pub next_month_expenses: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub priority: AlertPriority,
}

/// Derived dashboard value, recomputed in full on every fetch and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub overview: OverviewMetrics,
    pub transactions: Vec<PaymentRecord>,
    pub revenue_trends: Vec<MonthlyTrend>,
    pub expense_breakdown: Vec<CategoryBreakdown>,
    pub budget_status: BudgetStatus,
    pub financial_health: FinancialHealth,
    pub predictions: Predictions,
    pub alerts: Vec<Alert>,
}
