use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::calendar;
use crate::models::{summary_headers, EddMeasure, EscalationType, ReviewerKpis, SummaryTable};
use crate::weights::SeverityWeights;

pub fn build_report(
    label: &str,
    start: NaiveDate,
    end: NaiveDate,
    working_days: &BTreeSet<NaiveDate>,
    table: &SummaryTable,
    kpis: &ReviewerKpis,
    weights: &SeverityWeights,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Onboarding Review Workload: {}", label);
    let _ = writeln!(
        output,
        "Period {} to {} ({} working days, {} working hours)",
        start,
        end,
        working_days.len(),
        calendar::working_hours(working_days)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(output, "- Total count: {}", kpis.total_count);
    let _ = writeln!(output, "- Highest reviewer: {}", kpis.highest);
    let _ = writeln!(output, "- Lowest reviewer: {}", kpis.lowest);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Reviewer SLA Summary");

    if table.is_empty() {
        let _ = writeln!(output, "No data available for the selected dates.");
        return output;
    }

    let headers = summary_headers();
    let _ = writeln!(output, "| {} |", headers.join(" | "));
    let _ = writeln!(output, "|{}", "---|".repeat(headers.len()));
    for row in table.rows.iter() {
        let mut cells = vec![row.reviewer.clone()];
        cells.extend(row.escalations.iter().map(|c| c.to_string()));
        cells.extend(row.measures.iter().map(|c| c.to_string()));
        cells.push(row.total.to_string());
        cells.push(row.total_working_hours.to_string());
        cells.push(row.total_sla_period.to_string());
        cells.push(row.difference.to_string());
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }

    let overloaded: Vec<&str> = table
        .reviewer_rows()
        .iter()
        .filter(|row| row.difference < 0)
        .map(|row| row.reviewer.as_str())
        .collect();
    if !overloaded.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Over capacity: {}", overloaded.join(", "));
    }

    if let Some(total) = table.total_row() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Escalation Mix");
        for name in EscalationType::KNOWN {
            if let Some(kind) = EscalationType::parse(name) {
                let count = total.escalation(&kind);
                if count > 0 {
                    let hours = i64::from(count) * weights.escalation_weight(&kind);
                    let _ = writeln!(output, "- {}: {} ({}h)", name, count, hours);
                }
            }
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## EDD Measure Mix");
        for name in EddMeasure::KNOWN {
            if let Some(measure) = EddMeasure::parse(name) {
                let count = total.measure(&measure);
                if count > 0 {
                    let _ = writeln!(output, "- {}: {}", name, count);
                }
            }
        }
    }

    output
}
