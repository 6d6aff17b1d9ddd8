use anyhow::Context;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    BudgetRecord, ExpenseRecord, FinancialData, InvoiceRecord, InvoiceStatus,
    MonthlyHistoryRecord, PaymentRecord, PaymentStatus, StudentRecord,
};

/// Demo organization inserted by `seed`.
pub const DEMO_ORG_ID: &str = "7c1a4f2e-6b7d-4f3a-9c2d-5e8b1a0d4c6f";

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS transport_finance",
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.students (
        id uuid PRIMARY KEY,
        org_id uuid NOT NULL,
        full_name text NOT NULL,
        grade_level text NOT NULL,
        is_active boolean NOT NULL DEFAULT true,
        UNIQUE (org_id, full_name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.payments (
        id uuid PRIMARY KEY,
        org_id uuid NOT NULL,
        student_id uuid NOT NULL REFERENCES transport_finance.students (id),
        amount double precision NOT NULL,
        status text NOT NULL,
        payment_type text NOT NULL,
        created_at timestamptz NOT NULL,
        source_key text UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.invoices (
        id uuid PRIMARY KEY,
        org_id uuid NOT NULL,
        student_id uuid REFERENCES transport_finance.students (id),
        amount double precision NOT NULL,
        status text NOT NULL,
        due_date date NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.expenses (
        id uuid PRIMARY KEY,
        org_id uuid NOT NULL,
        amount double precision NOT NULL,
        category text NOT NULL,
        date date NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.budgets (
        org_id uuid NOT NULL,
        year int NOT NULL,
        allocated_amount double precision NOT NULL,
        PRIMARY KEY (org_id, year)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transport_finance.monthly_history (
        org_id uuid NOT NULL,
        month date NOT NULL,
        revenue double precision NOT NULL,
        expenses double precision NOT NULL,
        PRIMARY KEY (org_id, month)
    )
    "#,
];

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to apply schema statement")?;
    }
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<Uuid> {
    let org_id = Uuid::parse_str(DEMO_ORG_ID)?;

    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            "4",
            true,
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            "6",
            true,
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara Patel",
            "5",
            false,
        ),
    ];

    for &(id, name, grade, active) in &students {
        sqlx::query(
            r#"
            INSERT INTO transport_finance.students (id, org_id, full_name, grade_level, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (org_id, full_name) DO UPDATE
            SET grade_level = EXCLUDED.grade_level, is_active = EXCLUDED.is_active
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(name)
        .bind(grade)
        .bind(active)
        .execute(pool)
        .await?;
    }

    let avery = students[0].0;
    let jules = students[1].0;
    let kiara = students[2].0;

    let payments = vec![
        ("seed-pay-001", avery, 450.0, PaymentStatus::Completed, "bus_fee", ts(2026, 2, 3)?),
        ("seed-pay-002", jules, 450.0, PaymentStatus::Completed, "bus_fee", ts(2026, 2, 5)?),
        ("seed-pay-003", kiara, 120.0, PaymentStatus::Completed, "activity_fee", ts(2026, 1, 22)?),
        ("seed-pay-004", avery, 450.0, PaymentStatus::Pending, "bus_fee", ts(2026, 2, 10)?),
        ("seed-pay-005", jules, 120.0, PaymentStatus::Failed, "activity_fee", ts(2026, 1, 15)?),
    ];

    for (source_key, student_id, amount, status, payment_type, created_at) in payments {
        sqlx::query(
            r#"
            INSERT INTO transport_finance.payments
            (id, org_id, student_id, amount, status, payment_type, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(student_id)
        .bind(amount)
        .bind(status.as_str())
        .bind(payment_type)
        .bind(created_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let invoices = vec![
        (avery, 450.0, InvoiceStatus::Paid, date(2026, 1, 31)?),
        (jules, 450.0, InvoiceStatus::Pending, date(2026, 2, 28)?),
        (kiara, 570.0, InvoiceStatus::Overdue, date(2026, 1, 15)?),
    ];

    for (student_id, amount, status, due_date) in invoices {
        sqlx::query(
            r#"
            INSERT INTO transport_finance.invoices (id, org_id, student_id, amount, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(student_id)
        .bind(amount)
        .bind(status.as_str())
        .bind(due_date)
        .execute(pool)
        .await?;
    }

    let expenses = vec![
        (820.0, "Fuel", date(2026, 2, 4)?),
        (340.0, "Maintenance", date(2026, 2, 8)?),
        (2600.0, "Salaries", date(2026, 2, 1)?),
        (95.0, "Supplies", date(2026, 1, 27)?),
    ];

    for (amount, category, spent_on) in expenses {
        sqlx::query(
            r#"
            INSERT INTO transport_finance.expenses (id, org_id, amount, category, date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(amount)
        .bind(category)
        .bind(spent_on)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO transport_finance.budgets (org_id, year, allocated_amount)
        VALUES ($1, $2, $3)
        ON CONFLICT (org_id, year) DO UPDATE
        SET allocated_amount = EXCLUDED.allocated_amount
        "#,
    )
    .bind(org_id)
    .bind(2026_i32)
    .bind(48_000.0_f64)
    .execute(pool)
    .await?;

    let history = vec![
        (date(2025, 9, 1)?, 3_900.0, 3_100.0),
        (date(2025, 10, 1)?, 4_150.0, 3_300.0),
        (date(2025, 11, 1)?, 4_000.0, 3_450.0),
        (date(2025, 12, 1)?, 3_700.0, 3_900.0),
        (date(2026, 1, 1)?, 4_300.0, 3_500.0),
        (date(2026, 2, 1)?, 4_450.0, 3_855.0),
    ];

    for (month, revenue, monthly_expenses) in history {
        sqlx::query(
            r#"
            INSERT INTO transport_finance.monthly_history (org_id, month, revenue, expenses)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (org_id, month) DO UPDATE
            SET revenue = EXCLUDED.revenue, expenses = EXCLUDED.expenses
            "#,
        )
        .bind(org_id)
        .bind(month)
        .bind(revenue)
        .bind(monthly_expenses)
        .execute(pool)
        .await?;
    }

    log::info!("seeded demo data for org {org_id}");
    Ok(org_id)
}

pub async fn fetch_payments(
    pool: &PgPool,
    org_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<PaymentRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.amount, p.status, p.created_at, p.student_id, p.payment_type,
               s.full_name
        FROM transport_finance.payments p
        LEFT JOIN transport_finance.students s ON s.id = p.student_id
        WHERE p.org_id = $1
        ORDER BY p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(org_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to fetch payments")?;

    let mut payments = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_status: String = row.get("status");
        let status = PaymentStatus::parse(&raw_status)
            .with_context(|| format!("unknown payment status {raw_status:?}"))?;
        payments.push(PaymentRecord {
            id: row.get("id"),
            amount: row.get("amount"),
            status,
            created_at: row.get("created_at"),
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            payment_type: row.get("payment_type"),
        });
    }

    Ok(payments)
}

pub async fn fetch_invoices(
    pool: &PgPool,
    org_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<InvoiceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, amount, status, due_date
        FROM transport_finance.invoices
        WHERE org_id = $1
        ORDER BY due_date DESC
        LIMIT $2
        "#,
    )
    .bind(org_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to fetch invoices")?;

    let mut invoices = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_status: String = row.get("status");
        let status = InvoiceStatus::parse(&raw_status)
            .with_context(|| format!("unknown invoice status {raw_status:?}"))?;
        invoices.push(InvoiceRecord {
            id: row.get("id"),
            amount: row.get("amount"),
            status,
            due_date: row.get("due_date"),
        });
    }

    Ok(invoices)
}

pub async fn fetch_expenses(
    pool: &PgPool,
    org_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<ExpenseRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, amount, category, date
        FROM transport_finance.expenses
        WHERE org_id = $1
        ORDER BY date DESC
        LIMIT $2
        "#,
    )
    .bind(org_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to fetch expenses")?;

    let expenses = rows
        .into_iter()
        .map(|row| ExpenseRecord {
            id: row.get("id"),
            amount: row.get("amount"),
            category: row.get("category"),
            date: row.get("date"),
        })
        .collect();

    Ok(expenses)
}

pub async fn fetch_students(pool: &PgPool, org_id: Uuid) -> anyhow::Result<Vec<StudentRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, full_name, grade_level, is_active
        FROM transport_finance.students
        WHERE org_id = $1
        ORDER BY full_name
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch students")?;

    let students = rows
        .into_iter()
        .map(|row| StudentRecord {
            id: row.get("id"),
            name: row.get("full_name"),
            grade_level: row.get("grade_level"),
            is_active: row.get("is_active"),
        })
        .collect();

    Ok(students)
}

pub async fn fetch_budget(
    pool: &PgPool,
    org_id: Uuid,
    year: i32,
) -> anyhow::Result<Option<BudgetRecord>> {
    let row = sqlx::query(
        r#"
        SELECT allocated_amount, year
        FROM transport_finance.budgets
        WHERE org_id = $1 AND year = $2
        "#,
    )
    .bind(org_id)
    .bind(year)
    .fetch_optional(pool)
    .await
    .context("failed to fetch budget")?;

    Ok(row.map(|row| BudgetRecord {
        allocated_amount: row.get("allocated_amount"),
        year: row.get("year"),
    }))
}

pub async fn fetch_history(
    pool: &PgPool,
    org_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<MonthlyHistoryRecord>> {
    // Latest `limit` months, returned oldest first.
    let rows = sqlx::query(
        r#"
        SELECT month, revenue, expenses FROM (
            SELECT month, revenue, expenses
            FROM transport_finance.monthly_history
            WHERE org_id = $1
            ORDER BY month DESC
            LIMIT $2
        ) latest
        ORDER BY month ASC
        "#,
    )
    .bind(org_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to fetch monthly history")?;

    let history = rows
        .into_iter()
        .map(|row| MonthlyHistoryRecord {
            month: row.get("month"),
            revenue: row.get("revenue"),
            expenses: row.get("expenses"),
        })
        .collect();

    Ok(history)
}

/// Fan out all six fetches and fail closed on the first error; the
/// calculator never runs over a partial snapshot.
pub async fn fetch_financial_data(
    pool: &PgPool,
    org_id: Uuid,
    year: i32,
    limit: i64,
) -> anyhow::Result<FinancialData> {
    let (payments, invoices, expenses, students, budget, history) = tokio::try_join!(
        fetch_payments(pool, org_id, limit),
        fetch_invoices(pool, org_id, limit),
        fetch_expenses(pool, org_id, limit),
        fetch_students(pool, org_id),
        fetch_budget(pool, org_id, year),
        fetch_history(pool, org_id, 12),
    )?;

    log::debug!(
        "fetched {} payments, {} invoices, {} expenses, {} students, {} history months",
        payments.len(),
        invoices.len(),
        expenses.len(),
        students.len(),
        history.len()
    );

    Ok(FinancialData {
        payments,
        invoices,
        expenses,
        students,
        budget,
        history,
    })
}

#[derive(Debug, serde::Deserialize)]
struct PaymentCsvRow {
    student_name: String,
    grade_level: String,
    amount: f64,
    status: String,
    payment_type: String,
    paid_at: NaiveDate,
    source_key: Option<String>,
}

pub async fn import_payments_csv(
    pool: &PgPool,
    org_id: Uuid,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<PaymentCsvRow>() {
        let row = result?;
        let status = PaymentStatus::parse(&row.status)
            .with_context(|| format!("unknown payment status {:?}", row.status))?;

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO transport_finance.students
            (id, org_id, full_name, grade_level, is_active)
            VALUES ($1, $2, $3, $4, true)
            ON CONFLICT (org_id, full_name) DO UPDATE
            SET grade_level = EXCLUDED.grade_level
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(&row.student_name)
        .bind(&row.grade_level)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let created_at = row
            .paid_at
            .and_hms_opt(0, 0, 0)
            .context("invalid payment date")?
            .and_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO transport_finance.payments
            (id, org_id, student_id, amount, status, payment_type, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(student_id)
        .bind(row.amount)
        .bind(status.as_str())
        .bind(&row.payment_type)
        .bind(created_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    log::info!("imported {inserted} payments for org {org_id}");
    Ok(inserted)
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

fn ts(year: i32, month: u32, day: u32) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .context("invalid timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_csv_rows_deserialize() {
        let data = "\
student_name,grade_level,amount,status,payment_type,paid_at,source_key
Avery Lee,4,450.00,completed,bus_fee,2026-02-03,bank-2291
Jules Moreno,6,120.50,pending,activity_fee,2026-02-10,
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<PaymentCsvRow> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("rows should deserialize");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_name, "Avery Lee");
        assert_eq!(rows[0].amount, 450.0);
        assert_eq!(rows[0].source_key.as_deref(), Some("bank-2291"));
        assert_eq!(
            PaymentStatus::parse(&rows[1].status),
            Some(PaymentStatus::Pending)
        );
        assert_eq!(
            rows[1].paid_at,
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
        );
        assert!(rows[1].source_key.is_none());
    }
}

