use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};

/// Reviewer label of the synthetic column-sum row.
pub const TOTAL_ROW_LABEL: &str = "Total";

/// Defines a closed category enumeration that still tolerates values written
/// by older clients. Empty input means the field was left unset.
macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unrecognized(String),
        }

        #[allow(dead_code)]
        impl $name {
            pub const KNOWN: &'static [&'static str] = &[$($label),+];

            pub fn parse(raw: &str) -> Option<Self> {
                let value = raw.trim();
                if value.is_empty() {
                    return None;
                }
                Some(match value {
                    $($label => Self::$variant,)+
                    other => Self::Unrecognized(other.to_string()),
                })
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unrecognized(value) => value.as_str(),
                }
            }

            /// Position among the known variants, `None` for unrecognized values.
            pub fn index(&self) -> Option<usize> {
                Self::KNOWN.iter().position(|label| match self {
                    Self::Unrecognized(_) => false,
                    known => *label == known.as_str(),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

category_enum!(
    DealType {
        Imt => "imt",
        Payments => "payments",
        Issuance => "issuance",
        Vendor => "vendor",
    }
);

category_enum!(
    ReviewType {
        FreshOnboarding => "fresh_onboarding",
        PeriodicReview => "periodic_review",
    }
);

category_enum!(
    /// Reason a partner was escalated to enhanced due diligence.
    EscalationType {
        OtherRedFlags => "other_red_flags",
        AdverseMedia => "adverse_media",
        HighRisk => "high_risk",
        PepAssociation => "pep_association",
        CountryRisk => "country_risk",
        ComplexOwnership => "complex_ownership",
        YoungCompany => "young_company",
        MediumRisk => "medium_risk",
        FeedbackReview => "feedback_review",
    }
);

category_enum!(
    /// EDD measure applied during the review.
    EddMeasure {
        DocumentReview => "document_review",
        AmlReview => "aml_review",
        AuditReview => "audit_review",
        FeedbackReview => "feedback_review",
    }
);

pub const ESCALATION_COUNT: usize = 9;
pub const MEASURE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEvent {
    pub id: Uuid,
    pub completion_date: NaiveDate,
    pub partner_name: String,
    pub deal_type: Option<DealType>,
    pub review_type: Option<ReviewType>,
    pub escalation_type: Option<EscalationType>,
    pub reviewer: String,
    pub edd_measure: Option<EddMeasure>,
    pub created_at: DateTime<Utc>,
}

/// Form input for a review event before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewReviewEvent {
    pub completion_date: NaiveDate,
    pub partner_name: String,
    pub deal_type: Option<DealType>,
    pub review_type: Option<ReviewType>,
    pub escalation_type: Option<EscalationType>,
    pub reviewer: String,
    pub edd_measure: Option<EddMeasure>,
}

impl NewReviewEvent {
    pub fn validate(&self) -> TrackerResult<()> {
        if self.partner_name.trim().is_empty() {
            return Err(TrackerError::MissingField {
                field: "Partner Name",
            });
        }
        if self.reviewer.trim().is_empty() {
            return Err(TrackerError::MissingField {
                field: "EDD Reviewer",
            });
        }
        if self.reviewer.trim().eq_ignore_ascii_case(TOTAL_ROW_LABEL) {
            return Err(TrackerError::ReservedReviewer {
                name: self.reviewer.trim().to_string(),
            });
        }
        Ok(())
    }

    pub fn into_event(self, id: Uuid, created_at: DateTime<Utc>) -> ReviewEvent {
        ReviewEvent {
            id,
            completion_date: self.completion_date,
            partner_name: self.partner_name.trim().to_string(),
            deal_type: self.deal_type,
            review_type: self.review_type,
            escalation_type: self.escalation_type,
            reviewer: self.reviewer.trim().to_string(),
            edd_measure: self.edd_measure,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerSummaryRow {
    pub reviewer: String,
    pub escalations: [u32; ESCALATION_COUNT],
    pub measures: [u32; MEASURE_COUNT],
    pub total: u32,
    pub total_working_hours: i64,
    pub total_sla_period: i64,
    pub difference: i64,
}

impl ReviewerSummaryRow {
    pub fn empty(reviewer: impl Into<String>) -> Self {
        Self {
            reviewer: reviewer.into(),
            escalations: [0; ESCALATION_COUNT],
            measures: [0; MEASURE_COUNT],
            total: 0,
            total_working_hours: 0,
            total_sla_period: 0,
            difference: 0,
        }
    }

    pub fn escalation(&self, kind: &EscalationType) -> u32 {
        kind.index().map(|i| self.escalations[i]).unwrap_or(0)
    }

    pub fn measure(&self, kind: &EddMeasure) -> u32 {
        kind.index().map(|i| self.measures[i]).unwrap_or(0)
    }

    pub fn measure_sum(&self) -> u32 {
        self.measures.iter().sum()
    }

    pub fn is_total(&self) -> bool {
        self.reviewer == TOTAL_ROW_LABEL
    }
}

/// Column headers in export order.
pub fn summary_headers() -> Vec<String> {
    let mut headers = vec!["reviewer".to_string()];
    headers.extend(EscalationType::KNOWN.iter().map(|label| match *label {
        "feedback_review" => "feedback_review_esc".to_string(),
        other => other.to_string(),
    }));
    headers.extend(EddMeasure::KNOWN.iter().map(|label| match *label {
        "feedback_review" => "feedback_review_meas".to_string(),
        other => other.to_string(),
    }));
    headers.extend(
        ["total", "total_working_hours", "total_sla_period", "difference"]
            .iter()
            .map(|h| h.to_string()),
    );
    headers
}

/// Per-reviewer summary. Reviewer rows keep first-appearance order and the
/// Total row, when present, is always last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    pub rows: Vec<ReviewerSummaryRow>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn reviewer_rows(&self) -> &[ReviewerSummaryRow] {
        match self.rows.last() {
            Some(last) if last.is_total() => &self.rows[..self.rows.len() - 1],
            _ => &self.rows,
        }
    }

    pub fn total_row(&self) -> Option<&ReviewerSummaryRow> {
        self.rows.last().filter(|row| row.is_total())
    }

    #[cfg(test)]
    pub fn row(&self, reviewer: &str) -> Option<&ReviewerSummaryRow> {
        self.rows.iter().find(|row| row.reviewer == reviewer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerKpis {
    pub total_count: u32,
    pub highest: String,
    pub lowest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCount {
    pub key: String,
    pub escalations: u32,
    pub measures: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(partner: &str, reviewer: &str) -> NewReviewEvent {
        NewReviewEvent {
            completion_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            partner_name: partner.to_string(),
            deal_type: DealType::parse("payments"),
            review_type: ReviewType::parse("fresh_onboarding"),
            escalation_type: EscalationType::parse("high_risk"),
            reviewer: reviewer.to_string(),
            edd_measure: None,
        }
    }

    #[test]
    fn parse_maps_known_unset_and_unknown_values() {
        assert_eq!(EscalationType::parse("high_risk"), Some(EscalationType::HighRisk));
        assert_eq!(EscalationType::parse("  "), None);
        assert_eq!(
            EddMeasure::parse("site_visit"),
            Some(EddMeasure::Unrecognized("site_visit".to_string()))
        );
        assert_eq!(DealType::parse("vendor").map(|d| d.to_string()), Some("vendor".to_string()));
    }

    #[test]
    fn index_follows_known_order() {
        assert_eq!(EscalationType::OtherRedFlags.index(), Some(0));
        assert_eq!(EscalationType::FeedbackReview.index(), Some(8));
        assert_eq!(EddMeasure::FeedbackReview.index(), Some(3));
        assert_eq!(EscalationType::Unrecognized("x".into()).index(), None);
        assert_eq!(EscalationType::KNOWN.len(), ESCALATION_COUNT);
        assert_eq!(EddMeasure::KNOWN.len(), MEASURE_COUNT);
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        assert!(form("Acme Remit", "alice").validate().is_ok());
        assert!(matches!(
            form("  ", "alice").validate(),
            Err(TrackerError::MissingField { field: "Partner Name" })
        ));
        assert!(matches!(
            form("Acme Remit", "").validate(),
            Err(TrackerError::MissingField { field: "EDD Reviewer" })
        ));
    }

    #[test]
    fn validate_rejects_total_row_label_as_reviewer() {
        assert!(matches!(
            form("Acme Remit", "Total").validate(),
            Err(TrackerError::ReservedReviewer { .. })
        ));
        assert!(matches!(
            form("Acme Remit", " total ").validate(),
            Err(TrackerError::ReservedReviewer { .. })
        ));
        assert!(form("Acme Remit", "totalia").validate().is_ok());
    }

    #[test]
    fn headers_follow_export_order() {
        let headers = summary_headers();
        assert_eq!(headers.len(), 1 + ESCALATION_COUNT + MEASURE_COUNT + 4);
        assert_eq!(headers[0], "reviewer");
        assert_eq!(headers[9], "feedback_review_esc");
        assert_eq!(headers[13], "feedback_review_meas");
        assert_eq!(headers[17], "difference");
    }

    #[test]
    fn table_splits_total_row() {
        let table = SummaryTable {
            rows: vec![
                ReviewerSummaryRow::empty("alice"),
                ReviewerSummaryRow::empty(TOTAL_ROW_LABEL),
            ],
        };
        assert_eq!(table.reviewer_rows().len(), 1);
        assert!(table.total_row().is_some());
        assert!(SummaryTable::default().total_row().is_none());
    }
}
