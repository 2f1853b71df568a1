use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

mod aggregate;
mod calendar;
mod db;
mod error;
mod export;
mod models;
mod report;
mod weights;

use aggregate::Aggregator;
use models::{DealType, EddMeasure, EscalationType, NewReviewEvent, ReviewType};
use weights::SeverityWeights;

#[derive(Parser)]
#[command(name = "onboarding-sla-tracker")]
#[command(about = "Compliance onboarding review log with reviewer SLA reporting", long_about = None)]
struct Cli {
    /// JSON file overriding the default severity weights
    #[arg(long, global = true)]
    weights: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Period {
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
    /// Dates to leave out of the working calendar (repeatable)
    #[arg(long = "skip")]
    skip: Vec<NaiveDate>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo review events
    Seed,
    /// Import review events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record a single review event
    Record {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        partner: String,
        #[arg(long)]
        reviewer: String,
        #[arg(long, default_value = "")]
        deal_type: String,
        #[arg(long, default_value = "")]
        review_type: String,
        #[arg(long, default_value = "")]
        escalation: String,
        #[arg(long, default_value = "")]
        measure: String,
    },
    /// Print the reviewer SLA summary for a period
    Summary {
        #[command(flatten)]
        period: Period,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
    /// Summaries for each week of a month
    Month {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long = "skip")]
        skip: Vec<NaiveDate>,
        /// Directory receiving one summary file per week
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        period: Period,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the raw review log
    Export {
        #[arg(long, default_value = "review_events.csv")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Directory receiving the monthly and per-reviewer activity CSVs
        #[arg(long)]
        activity_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let weights = match &cli.weights {
        Some(path) => SeverityWeights::load(path)
            .with_context(|| format!("failed to load weights from {}", path.display()))?,
        None => SeverityWeights::default(),
    };
    let aggregator = Aggregator::new(weights);
    log::debug!("using severity weights {:?}", aggregator.weights());

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

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
            let inserted = db::seed(&pool).await?;
            println!("Inserted {inserted} demo review events.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} review events from {}.", csv.display());
        }
        Commands::Record {
            date,
            partner,
            reviewer,
            deal_type,
            review_type,
            escalation,
            measure,
        } => {
            let event = db::insert_event(
                &pool,
                NewReviewEvent {
                    completion_date: date,
                    partner_name: partner,
                    deal_type: DealType::parse(&deal_type),
                    review_type: ReviewType::parse(&review_type),
                    escalation_type: EscalationType::parse(&escalation),
                    reviewer,
                    edd_measure: EddMeasure::parse(&measure),
                },
            )
            .await?;
            println!("Entry {} submitted at {}.", event.id, event.created_at);
        }
        Commands::Summary { period, csv, xlsx } => {
            let days = period.working_days();
            let events = db::fetch_events_between(&pool, period.start, period.end).await?;
            let table = aggregator.aggregate(&events, &days);
            print_summary(&table, &days);

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                export::write_summary_csv(&table, file)?;
                println!("Summary written to {}.", path.display());
            }
            if let Some(path) = xlsx {
                export::write_summary_xlsx(&table, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Summary written to {}.", path.display());
            }
        }
        Commands::Month {
            year,
            month,
            skip,
            out_dir,
            format,
        } => {
            let (first, last) = calendar::month_bounds(year, month)
                .with_context(|| format!("invalid month {year}-{month}"))?;
            let skipped: BTreeSet<NaiveDate> = skip.into_iter().collect();
            let events = db::fetch_events_between(&pool, first, last).await?;

            for (index, (start, end)) in calendar::month_weeks(year, month).into_iter().enumerate() {
                let week = index + 1;
                let days = calendar::working_days(start, end, &skipped);
                let table = aggregator.aggregate(&events, &days);
                println!("Week {week} ({start} to {end}):");
                print_summary(&table, &days);

                if let Some(dir) = &out_dir {
                    let path = dir.join(format!(
                        "summary-{year}-{month:02}-week{week}.{}",
                        format.extension()
                    ));
                    match format {
                        ExportFormat::Csv => {
                            let file = std::fs::File::create(&path)
                                .with_context(|| format!("failed to create {}", path.display()))?;
                            export::write_summary_csv(&table, file)?;
                        }
                        ExportFormat::Xlsx => export::write_summary_xlsx(&table, &path)?,
                    }
                }
            }
        }
        Commands::Report { period, out } => {
            let days = period.working_days();
            let events = db::fetch_events_between(&pool, period.start, period.end).await?;
            let table = aggregator.aggregate(&events, &days);
            let kpis = aggregate::reviewer_kpis(&table);
            let label = format!("{} to {}", period.start, period.end);
            let report = report::build_report(
                &label,
                period.start,
                period.end,
                &days,
                &table,
                &kpis,
                aggregator.weights(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            out,
            format,
            activity_dir,
        } => {
            let events = db::fetch_events(&pool).await?;
            match format {
                ExportFormat::Csv => {
                    let file = std::fs::File::create(&out)
                        .with_context(|| format!("failed to create {}", out.display()))?;
                    export::write_events_csv(&events, file)?;
                }
                ExportFormat::Xlsx => export::write_events_xlsx(&events, &out)?,
            }
            println!("Exported {} review events to {}.", events.len(), out.display());

            let monthly = aggregate::monthly_activity(&events);
            let by_reviewer = aggregate::reviewer_activity(&events);
            for count in monthly.iter().chain(by_reviewer.iter()) {
                println!(
                    "- {}: {} escalations, {} EDD measures",
                    count.key, count.escalations, count.measures
                );
            }

            if let Some(dir) = activity_dir {
                for (name, key_header, counts) in [
                    ("agg_data_monthly.csv", "completion_month", &monthly),
                    ("agg_data_edd_reviewer.csv", "edd_reviewer", &by_reviewer),
                ] {
                    let path = dir.join(name);
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    export::write_activity_csv(key_header, counts, file)?;
                    println!("Activity written to {}.", path.display());
                }
            }
        }
    }

    Ok(())
}

impl Period {
    fn working_days(&self) -> BTreeSet<NaiveDate> {
        let skipped: BTreeSet<NaiveDate> = self.skip.iter().copied().collect();
        calendar::working_days(self.start, self.end, &skipped)
    }
}

fn print_summary(table: &models::SummaryTable, days: &BTreeSet<NaiveDate>) {
    println!("Total Working Hours: {}", calendar::working_hours(days));

    if table.is_empty() {
        println!("No data available for the selected dates.");
        return;
    }

    let kpis = aggregate::reviewer_kpis(table);
    println!(
        "Total count {} | highest {} | lowest {}",
        kpis.total_count, kpis.highest, kpis.lowest
    );
    for row in table.rows.iter() {
        println!(
            "- {}: {} reviews, SLA {}h of {}h, difference {}",
            row.reviewer,
            row.total,
            row.total_sla_period,
            row.total_working_hours,
            row.difference
        );
    }
}
