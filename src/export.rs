use std::io::Write;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{
    summary_headers, ActivityCount, ReviewEvent, ReviewerSummaryRow, SummaryTable,
};

const SHEET_NAME: &str = "Sheet1";

/// Numeric columns of a summary row, in export order after the reviewer.
fn summary_values(row: &ReviewerSummaryRow) -> Vec<i64> {
    let mut values = Vec::with_capacity(17);
    values.extend(row.escalations.iter().map(|count| i64::from(*count)));
    values.extend(row.measures.iter().map(|count| i64::from(*count)));
    values.push(i64::from(row.total));
    values.push(row.total_working_hours);
    values.push(row.total_sla_period);
    values.push(row.difference);
    values
}

pub fn write_summary_csv<W: Write>(table: &SummaryTable, writer: W) -> TrackerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(summary_headers())?;

    for row in table.rows.iter() {
        let mut record = vec![row.reviewer.clone()];
        record.extend(summary_values(row).iter().map(|value| value.to_string()));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn summary_xlsx_bytes(table: &SummaryTable) -> TrackerResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    write_header(sheet, &summary_headers())?;

    for (index, row) in table.rows.iter().enumerate() {
        let line = index as u32 + 1;
        sheet.write_string(line, 0, row.reviewer.as_str())?;
        for (col, value) in summary_values(row).into_iter().enumerate() {
            sheet.write_number(line, col as u16 + 1, value as f64)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn write_summary_xlsx(table: &SummaryTable, path: &Path) -> TrackerResult<()> {
    std::fs::write(path, summary_xlsx_bytes(table)?)?;
    Ok(())
}

#[derive(Serialize)]
struct EventRow<'a> {
    id: Uuid,
    completion_date: NaiveDate,
    partner_name: &'a str,
    deal_type: Option<&'a str>,
    review_type: Option<&'a str>,
    escalation_type: Option<&'a str>,
    edd_reviewer: &'a str,
    edd_measure: Option<&'a str>,
    created_at: DateTime<Utc>,
}

const EVENT_HEADERS: [&str; 9] = [
    "id",
    "completion_date",
    "partner_name",
    "deal_type",
    "review_type",
    "escalation_type",
    "edd_reviewer",
    "edd_measure",
    "created_at",
];

impl<'a> EventRow<'a> {
    fn from_event(event: &'a ReviewEvent) -> Self {
        Self {
            id: event.id,
            completion_date: event.completion_date,
            partner_name: &event.partner_name,
            deal_type: event.deal_type.as_ref().map(|v| v.as_str()),
            review_type: event.review_type.as_ref().map(|v| v.as_str()),
            escalation_type: event.escalation_type.as_ref().map(|v| v.as_str()),
            edd_reviewer: &event.reviewer,
            edd_measure: event.edd_measure.as_ref().map(|v| v.as_str()),
            created_at: event.created_at,
        }
    }

    fn cells(&self) -> [String; 9] {
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();
        [
            self.id.to_string(),
            self.completion_date.to_string(),
            self.partner_name.to_string(),
            text(self.deal_type),
            text(self.review_type),
            text(self.escalation_type),
            self.edd_reviewer.to_string(),
            text(self.edd_measure),
            self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

pub fn write_events_csv<W: Write>(events: &[ReviewEvent], writer: W) -> TrackerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for event in events {
        csv.serialize(EventRow::from_event(event))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn events_xlsx_bytes(events: &[ReviewEvent]) -> TrackerResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    write_header(sheet, &EVENT_HEADERS)?;

    for (index, event) in events.iter().enumerate() {
        let line = index as u32 + 1;
        for (col, cell) in EventRow::from_event(event).cells().iter().enumerate() {
            sheet.write_string(line, col as u16, cell.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn write_events_xlsx(events: &[ReviewEvent], path: &Path) -> TrackerResult<()> {
    std::fs::write(path, events_xlsx_bytes(events)?)?;
    Ok(())
}

fn write_header<S: AsRef<str>>(sheet: &mut Worksheet, headers: &[S]) -> TrackerResult<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header.as_ref())?;
    }
    Ok(())
}

/// Escalation and measure counts keyed by month or reviewer.
pub fn write_activity_csv<W: Write>(
    key_header: &str,
    counts: &[ActivityCount],
    writer: W,
) -> TrackerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([key_header, "escalation_type", "edd_measures"])?;
    for count in counts {
        csv.write_record([
            count.key.clone(),
            count.escalations.to_string(),
            count.measures.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::models::{EddMeasure, EscalationType};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn sample_event(reviewer: &str, escalation: &str, measure: &str) -> ReviewEvent {
        ReviewEvent {
            id: Uuid::nil(),
            completion_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            partner_name: "Acme, Remit".to_string(),
            deal_type: None,
            review_type: None,
            escalation_type: EscalationType::parse(escalation),
            reviewer: reviewer.to_string(),
            edd_measure: EddMeasure::parse(measure),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn summary_csv_preserves_column_order() {
        let events = vec![
            sample_event("alice", "high_risk", ""),
            sample_event("alice", "", "document_review"),
        ];
        let days = BTreeSet::from([NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]);
        let table = Aggregator::default().aggregate(&events, &days);

        let mut buffer = Vec::new();
        write_summary_csv(&table, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("reviewer,other_red_flags,adverse_media,high_risk"));
        assert!(lines[0].ends_with("total,total_working_hours,total_sla_period,difference"));
        assert_eq!(lines[1], "alice,0,0,1,0,0,0,0,0,0,1,0,0,0,2,8,7,1");
        assert_eq!(lines[2], "Total,0,0,1,0,0,0,0,0,0,1,0,0,0,2,8,7,1");
    }

    #[test]
    fn summary_values_match_header_width() {
        let events = vec![sample_event("alice", "medium_risk", "aml_review")];
        let days = BTreeSet::from([NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]);
        let table = Aggregator::default().aggregate(&events, &days);

        for row in table.rows.iter() {
            assert_eq!(summary_values(row).len() + 1, summary_headers().len());
        }
        assert_eq!(summary_values(&table.rows[0]), vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 2, 8, 6, 2]);
    }

    #[test]
    fn summary_xlsx_is_a_zip_workbook() {
        let events = vec![sample_event("alice", "high_risk", "")];
        let days = BTreeSet::from([NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]);
        let table = Aggregator::default().aggregate(&events, &days);

        let bytes = summary_xlsx_bytes(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(summary_xlsx_bytes(&SummaryTable::default()).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn event_cells_follow_event_headers() {
        let event = sample_event("bob", "adverse_media", "");
        let cells = EventRow::from_event(&event).cells();
        assert_eq!(cells.len(), EVENT_HEADERS.len());
        assert_eq!(cells[2], "Acme, Remit");
        assert_eq!(cells[5], "adverse_media");
        assert_eq!(cells[7], "");
        assert_eq!(cells[8], "2024-01-02 09:30:00");
        assert!(events_xlsx_bytes(&[event]).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn activity_csv_writes_key_and_counts() {
        let counts = vec![ActivityCount {
            key: "2024-01".to_string(),
            escalations: 3,
            measures: 1,
        }];
        let mut buffer = Vec::new();
        write_activity_csv("completion_month", &counts, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "completion_month,escalation_type,edd_measures\n2024-01,3,1\n"
        );
    }

    #[test]
    fn empty_summary_writes_only_header() {
        let mut buffer = Vec::new();
        write_summary_csv(&SummaryTable::default(), &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn events_csv_quotes_and_blanks_unset_fields() {
        let mut buffer = Vec::new();
        write_events_csv(&[sample_event("bob", "adverse_media", "")], &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();

        assert_eq!(
            lines.next(),
            Some("id,completion_date,partner_name,deal_type,review_type,escalation_type,edd_reviewer,edd_measure,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Acme, Remit\",,,adverse_media,bob,,"));
    }
}
