mod policy;
mod rules;

pub use policy::{CategoryVerdict, IneligibilityReason, OverallVerdict};

use super::domain::StudentComplianceRecord;
use serde::{Deserialize, Serialize};

/// Minimum attendance, in percent, for the attendance check to pass.
pub const MIN_ATTENDANCE_PERCENT: f64 = 75.0;

/// Evaluate a record against the default attendance threshold.
pub fn evaluate(record: &StudentComplianceRecord) -> EligibilityVerdict {
    EligibilityEvaluator::default().evaluate(record)
}

/// Stateless evaluator turning a compliance record into a NOC verdict.
///
/// The evaluator never reads or writes `noc_status`; persisting a decision is the
/// reviewer's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityEvaluator {
    min_attendance_percent: f64,
}

impl Default for EligibilityEvaluator {
    fn default() -> Self {
        Self::new(MIN_ATTENDANCE_PERCENT)
    }
}

impl EligibilityEvaluator {
    pub fn new(min_attendance_percent: f64) -> Self {
        Self {
            min_attendance_percent,
        }
    }

    pub fn min_attendance_percent(&self) -> f64 {
        self.min_attendance_percent
    }

    pub fn evaluate(&self, record: &StudentComplianceRecord) -> EligibilityVerdict {
        let mut reasons = Vec::new();

        let attendance = rules::check_attendance(
            record.attendance_percentage,
            self.min_attendance_percent,
            &mut reasons,
        );
        let assignments = rules::check_assignments(&record.assignments, &mut reasons);
        let sce = rules::check_sce_components(&record.sce_components, &mut reasons);

        let overall = policy::decide_overall(attendance, assignments, sce);
        let attendance_shortfall = match attendance {
            CategoryVerdict::Pass => None,
            CategoryVerdict::Fail => {
                Some(self.min_attendance_percent - record.attendance_percentage)
            }
        };

        EligibilityVerdict {
            attendance,
            assignments,
            sce,
            overall,
            attendance_shortfall,
            reasons,
        }
    }
}

/// Per-category breakdown plus the overall decision. Recomputed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub attendance: CategoryVerdict,
    pub assignments: CategoryVerdict,
    pub sce: CategoryVerdict,
    pub overall: OverallVerdict,
    /// Percentage points still missing when attendance fails.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attendance_shortfall: Option<f64>,
    pub reasons: Vec<IneligibilityReason>,
}

impl EligibilityVerdict {
    pub fn is_approved(&self) -> bool {
        self.overall == OverallVerdict::Approved
    }

    pub fn summary(&self) -> String {
        if self.is_approved() {
            return "eligible for NOC".to_string();
        }

        let details: Vec<String> = self.reasons.iter().map(IneligibilityReason::summary).collect();
        if details.is_empty() {
            "not eligible for NOC".to_string()
        } else {
            format!("not eligible for NOC: {}", details.join("; "))
        }
    }
}
