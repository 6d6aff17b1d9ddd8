use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod alerts;
mod db;
mod forecast;
mod health;
mod metrics;
mod models;
mod report;

use models::FinancialSummary;

#[derive(Parser)]
#[command(name = "transport-finance")]
#[command(about = "Financial dashboard for a school transport administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic demo data
    Seed,
    /// Import payments from a CSV file
    Import {
        #[arg(long)]
        org: Uuid,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute and print the financial summary
    Summary {
        #[arg(long)]
        org: Uuid,
        /// Budget year; defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value_t = 500)]
        limit: i64,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        org: Uuid,
        /// Budget year; defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value_t = 500)]
        limit: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let org = db::seed(&pool).await?;
            println!("Seed data inserted for org {org}.");
        }
        Commands::Import { org, csv } => {
            let inserted = db::import_payments_csv(&pool, org, &csv).await?;
            println!("Inserted {inserted} payments from {}.", csv.display());
        }
        Commands::Summary {
            org,
            year,
            limit,
            json,
        } => {
            let now = Utc::now();
            let year = year.unwrap_or_else(|| now.year());
            let data = db::fetch_financial_data(&pool, org, year, limit).await?;
            let summary = metrics::compute_financial_summary(&data, now);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Report {
            org,
            year,
            limit,
            out,
        } => {
            let now = Utc::now();
            let year = year.unwrap_or_else(|| now.year());
            let data = db::fetch_financial_data(&pool, org, year, limit).await?;
            let summary = metrics::compute_financial_summary(&data, now);
            let report = report::build_report(org, now, &summary);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_summary(summary: &FinancialSummary) {
    let overview = &summary.overview;

    println!(
        "Revenue {:.2} total / {:.2} this month, expenses {:.2} total / {:.2} this month",
        overview.total_revenue,
        overview.monthly_revenue,
        overview.total_expenses,
        overview.monthly_expenses
    );
    println!(
        "Net profit {:.2} (margin {:.2}%), collection rate {:.2}%",
        overview.net_profit, overview.profit_margin, overview.collection_rate
    );
    println!(
        "Budget {:.2} allocated, {:.2} spent ({:.2}% utilized)",
        overview.budget_allocated, overview.budget_utilized, overview.budget_utilization
    );
    println!(
        "Financial health: {}/100 ({})",
        summary.financial_health.score,
        summary.financial_health.status.label()
    );
    println!(
        "Next month: revenue {:.0}, expenses {:.0} (growth {:.2}%)",
        summary.predictions.next_month_revenue,
        summary.predictions.next_month_expenses,
        summary.predictions.growth_rate
    );

    if !summary.expense_breakdown.is_empty() {
        println!("Top expense categories:");
        for category in summary.expense_breakdown.iter().take(5) {
            println!(
                "- {}: {:.2} ({:.2}%)",
                category.category, category.amount, category.percentage
            );
        }
    }

    if summary.alerts.is_empty() {
        println!("No active alerts.");
    } else {
        println!("Alerts:");
        for alert in summary.alerts.iter() {
            println!("- {}: {}", alert.title, alert.message);
        }
    }
}
