use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::calendar;
use crate::models::{
    ActivityCount, ReviewEvent, ReviewerKpis, ReviewerSummaryRow,
    SummaryTable, TOTAL_ROW_LABEL,
};
use crate::weights::SeverityWeights;

const NO_REVIEWER: &str = "--";

/// Turns a review log into per-reviewer workload against working-hour capacity.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    weights: SeverityWeights,
}

impl Aggregator {
    pub fn new(weights: SeverityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SeverityWeights {
        &self.weights
    }

    /// Only events completed on one of `working_days` are counted; membership
    /// is exact, not a range check.
    pub fn aggregate(
        &self,
        events: &[ReviewEvent],
        working_days: &BTreeSet<NaiveDate>,
    ) -> SummaryTable {
        let filtered: Vec<&ReviewEvent> = events
            .iter()
            .filter(|event| working_days.contains(&event.completion_date))
            .collect();

        log::debug!(
            "{} of {} events fall on {} working days",
            filtered.len(),
            events.len(),
            working_days.len()
        );

        if filtered.is_empty() {
            return SummaryTable::default();
        }

        let mut rows: Vec<ReviewerSummaryRow> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for event in filtered {
            let position = *positions.entry(event.reviewer.as_str()).or_insert_with(|| {
                rows.push(ReviewerSummaryRow::empty(event.reviewer.clone()));
                rows.len() - 1
            });
            let row = &mut rows[position];

            if let Some(kind) = &event.escalation_type {
                match kind.index() {
                    Some(i) => row.escalations[i] += 1,
                    None => log::warn!(
                        "event {} has unrecognized escalation type '{}'",
                        event.id,
                        kind
                    ),
                }
            }
            if let Some(measure) = &event.edd_measure {
                match measure.index() {
                    Some(i) => row.measures[i] += 1,
                    None => log::warn!(
                        "event {} has unrecognized EDD measure '{}'",
                        event.id,
                        measure
                    ),
                }
            }
        }

        for row in rows.iter_mut() {
            row.total = row.escalations.iter().sum::<u32>() + row.measure_sum();
        }

        let mut total = ReviewerSummaryRow::empty(TOTAL_ROW_LABEL);
        for row in rows.iter() {
            for (sum, count) in total.escalations.iter_mut().zip(row.escalations) {
                *sum += count;
            }
            for (sum, count) in total.measures.iter_mut().zip(row.measures) {
                *sum += count;
            }
            total.total += row.total;
        }
        rows.push(total);

        let hours = calendar::working_hours(working_days);
        for row in rows.iter_mut() {
            row.total_working_hours = hours;
            row.total_sla_period = self.sla_period(row);
            row.difference = row.total_working_hours - row.total_sla_period;
        }

        log::debug!(
            "aggregated {} reviewers, {} working hours",
            rows.len() - 1,
            hours
        );

        SummaryTable { rows }
    }

    fn sla_period(&self, row: &ReviewerSummaryRow) -> i64 {
        let escalations: i64 = row
            .escalations
            .iter()
            .zip(self.weights.escalation_weights())
            .map(|(count, weight)| i64::from(*count) * weight)
            .sum();
        escalations + i64::from(row.measure_sum()) * self.weights.measure_weight()
    }
}

/// Headline figures for a summary table. Ties resolve to the first reviewer.
pub fn reviewer_kpis(table: &SummaryTable) -> ReviewerKpis {
    let rows = table.reviewer_rows();
    let total_count: u32 = rows.iter().map(|row| row.total).sum();

    if total_count == 0 {
        return ReviewerKpis {
            total_count,
            highest: NO_REVIEWER.to_string(),
            lowest: NO_REVIEWER.to_string(),
        };
    }

    let mut highest = &rows[0];
    let mut lowest = &rows[0];
    for row in rows.iter().skip(1) {
        if row.total > highest.total {
            highest = row;
        }
        if row.total < lowest.total {
            lowest = row;
        }
    }

    ReviewerKpis {
        total_count,
        highest: highest.reviewer.clone(),
        lowest: lowest.reviewer.clone(),
    }
}

/// Events carrying an escalation and events carrying a measure, per `YYYY-MM`.
pub fn monthly_activity(events: &[ReviewEvent]) -> Vec<ActivityCount> {
    let mut months: BTreeMap<String, ActivityCount> = BTreeMap::new();
    for event in events {
        let key = event.completion_date.format("%Y-%m").to_string();
        let entry = months.entry(key.clone()).or_insert_with(|| ActivityCount {
            key,
            escalations: 0,
            measures: 0,
        });
        tally(entry, event);
    }
    months.into_values().collect()
}

/// Same counts as [`monthly_activity`], grouped by reviewer in first-appearance order.
pub fn reviewer_activity(events: &[ReviewEvent]) -> Vec<ActivityCount> {
    let mut counts: Vec<ActivityCount> = Vec::new();
    for event in events {
        let index = match counts.iter().position(|c| c.key == event.reviewer) {
            Some(index) => index,
            None => {
                counts.push(ActivityCount {
                    key: event.reviewer.clone(),
                    escalations: 0,
                    measures: 0,
                });
                counts.len() - 1
            }
        };
        tally(&mut counts[index], event);
    }
    counts
}

fn tally(entry: &mut ActivityCount, event: &ReviewEvent) {
    if event.escalation_type.is_some() {
        entry.escalations += 1;
    }
    if event.edd_measure.is_some() {
        entry.measures += 1;
    }
}
