//! Severity weights used to turn category counts into SLA hours.

use std::path::Path;

use serde::Deserialize;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{EscalationType, ESCALATION_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityWeights {
    pub other_red_flags: i64,
    pub adverse_media: i64,
    pub high_risk: i64,
    pub pep_association: i64,
    pub country_risk: i64,
    pub complex_ownership: i64,
    pub young_company: i64,
    pub medium_risk: i64,
    /// Shared by every EDD measure and by the feedback_review escalation.
    pub combined_reviews: i64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            other_red_flags: 1,
            adverse_media: 3,
            high_risk: 5,
            pep_association: 3,
            country_risk: 1,
            complex_ownership: 1,
            young_company: 1,
            medium_risk: 4,
            combined_reviews: 2,
        }
    }
}

impl SeverityWeights {
    pub fn from_json(raw: &str) -> TrackerResult<Self> {
        let weights: Self = serde_json::from_str(raw)?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn load(path: &Path) -> TrackerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> TrackerResult<()> {
        let entries = [
            ("other_red_flags", self.other_red_flags),
            ("adverse_media", self.adverse_media),
            ("high_risk", self.high_risk),
            ("pep_association", self.pep_association),
            ("country_risk", self.country_risk),
            ("complex_ownership", self.complex_ownership),
            ("young_company", self.young_company),
            ("medium_risk", self.medium_risk),
            ("combined_reviews", self.combined_reviews),
        ];
        for (category, value) in entries {
            if value <= 0 {
                return Err(TrackerError::InvalidWeight { category, value });
            }
        }
        Ok(())
    }

    /// Weights lined up with the escalation count columns.
    pub fn escalation_weights(&self) -> [i64; ESCALATION_COUNT] {
        [
            self.other_red_flags,
            self.adverse_media,
            self.high_risk,
            self.pep_association,
            self.country_risk,
            self.complex_ownership,
            self.young_company,
            self.medium_risk,
            self.combined_reviews,
        ]
    }

    /// Weight for one escalation. Unrecognized values weigh nothing.
    pub fn escalation_weight(&self, kind: &EscalationType) -> i64 {
        kind.index()
            .map(|i| self.escalation_weights()[i])
            .unwrap_or(0)
    }

    pub fn measure_weight(&self) -> i64 {
        self.combined_reviews
    }
}
