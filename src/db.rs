use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{DealType, EddMeasure, EscalationType, NewReviewEvent, ReviewEvent, ReviewType};

const SELECT_EVENTS: &str = "SELECT id, completion_date, partner_name, deal_type, review_type, \
     escalation_type, edd_reviewer, edd_measure, created_at \
     FROM onboarding_tracker.review_events";

pub async fn init_db(pool: &PgPool) -> TrackerResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Appends one event. Rows are never updated after this.
pub async fn insert_event(pool: &PgPool, input: NewReviewEvent) -> TrackerResult<ReviewEvent> {
    input.validate()?;
    let event = input.into_event(Uuid::new_v4(), Utc::now());

    sqlx::query(
        r#"
        INSERT INTO onboarding_tracker.review_events
        (id, completion_date, partner_name, deal_type, review_type,
         escalation_type, edd_reviewer, edd_measure, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(event.id)
    .bind(event.completion_date)
    .bind(&event.partner_name)
    .bind(event.deal_type.as_ref().map(|v| v.as_str()))
    .bind(event.review_type.as_ref().map(|v| v.as_str()))
    .bind(event.escalation_type.as_ref().map(|v| v.as_str()))
    .bind(&event.reviewer)
    .bind(event.edd_measure.as_ref().map(|v| v.as_str()))
    .bind(event.created_at)
    .execute(pool)
    .await?;

    log::debug!("inserted review event {} for {}", event.id, event.reviewer);
    Ok(event)
}

pub async fn fetch_events(pool: &PgPool) -> TrackerResult<Vec<ReviewEvent>> {
    let query = format!("{SELECT_EVENTS} ORDER BY created_at, id");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    Ok(rows.iter().map(event_from_row).collect())
}

/// Range pushdown only narrows the fetch; callers still filter by exact date.
pub async fn fetch_events_between(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> TrackerResult<Vec<ReviewEvent>> {
    let query = format!(
        "{SELECT_EVENTS} WHERE completion_date BETWEEN $1 AND $2 ORDER BY created_at, id"
    );
    let rows = sqlx::query(&query)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(event_from_row).collect())
}

fn event_from_row(row: &PgRow) -> ReviewEvent {
    let text = |column: &str| -> String {
        row.get::<Option<String>, _>(column).unwrap_or_default()
    };

    ReviewEvent {
        id: row.get("id"),
        completion_date: row.get("completion_date"),
        partner_name: row.get("partner_name"),
        deal_type: DealType::parse(&text("deal_type")),
        review_type: ReviewType::parse(&text("review_type")),
        escalation_type: EscalationType::parse(&text("escalation_type")),
        reviewer: row.get("edd_reviewer"),
        edd_measure: EddMeasure::parse(&text("edd_measure")),
        created_at: row.get("created_at"),
    }
}

pub async fn seed(pool: &PgPool) -> TrackerResult<usize> {
    let rows = [
        ("2024-01-02", "Acme Remit", "imt", "fresh_onboarding", "high_risk", "neelima_routhu", ""),
        ("2024-01-02", "Acme Remit", "imt", "fresh_onboarding", "", "neelima_routhu", "document_review"),
        ("2024-01-03", "Northwind Pay", "payments", "periodic_review", "adverse_media", "francis_xavier", "aml_review"),
        ("2024-01-04", "Blue Harbor Cards", "issuance", "fresh_onboarding", "pep_association", "rohan_vazapully", ""),
        ("2024-01-04", "Kestrel Systems", "vendor", "periodic_review", "medium_risk", "francis_xavier", "audit_review"),
        ("2024-01-05", "Lumen Wallet", "payments", "fresh_onboarding", "young_company", "laura_castillo", "feedback_review"),
        ("2024-01-08", "Orchid Transfers", "imt", "periodic_review", "country_risk", "neelima_routhu", ""),
        ("2024-01-09", "Tidal Issuing", "issuance", "fresh_onboarding", "complex_ownership", "rohan_vazapully", "document_review"),
    ];

    let mut inserted = 0usize;
    for (date, partner, deal, review, escalation, reviewer, measure) in rows {
        let completion_date = parse_date(date)?;
        insert_event(
            pool,
            NewReviewEvent {
                completion_date,
                partner_name: partner.to_string(),
                deal_type: DealType::parse(deal),
                review_type: ReviewType::parse(review),
                escalation_type: EscalationType::parse(escalation),
                reviewer: reviewer.to_string(),
                edd_measure: EddMeasure::parse(measure),
            },
        )
        .await?;
        inserted += 1;
    }

    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> TrackerResult<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        insert_event(pool, row.into_form()).await?;
        inserted += 1;
    }

    Ok(inserted)
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    completion_date: NaiveDate,
    partner_name: String,
    #[serde(default)]
    deal_type: String,
    #[serde(default)]
    review_type: String,
    #[serde(default)]
    escalation_type: String,
    edd_reviewer: String,
    #[serde(default)]
    edd_measure: String,
}

impl CsvRow {
    fn into_form(self) -> NewReviewEvent {
        NewReviewEvent {
            completion_date: self.completion_date,
            partner_name: self.partner_name,
            deal_type: DealType::parse(&self.deal_type),
            review_type: ReviewType::parse(&self.review_type),
            escalation_type: EscalationType::parse(&self.escalation_type),
            reviewer: self.edd_reviewer,
            edd_measure: EddMeasure::parse(&self.edd_measure),
        }
    }
}

pub fn parse_date(raw: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| crate::error::TrackerError::InvalidDate(format!("{raw}: {err}")))
}
