use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryVerdict {
    Pass,
    Fail,
}

impl CategoryVerdict {
    pub(crate) fn from_passed(passed: bool) -> Self {
        if passed {
            CategoryVerdict::Pass
        } else {
            CategoryVerdict::Fail
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CategoryVerdict::Pass => "pass",
            CategoryVerdict::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallVerdict {
    Approved,
    Rejected,
}

impl OverallVerdict {
    pub const fn label(self) -> &'static str {
        match self {
            OverallVerdict::Approved => "approved",
            OverallVerdict::Rejected => "rejected",
        }
    }
}

/// Explains a single failed check so reviewers and students see why a NOC was withheld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    AttendanceBelowThreshold {
        required: f64,
        actual: f64,
    },
    AssignmentNotSubmitted {
        assignment_id: String,
        title: String,
    },
    AssignmentLate {
        assignment_id: String,
        title: String,
        due_date: NaiveDate,
        submitted_date: NaiveDate,
    },
    PlagiarismExceeded {
        assignment_id: String,
        title: String,
        score: u8,
        max_allowed: u8,
    },
    SceIncomplete {
        component_id: String,
        kind: String,
        status: String,
    },
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::AttendanceBelowThreshold { required, actual } => format!(
                "attendance below threshold ({actual:.1}% of required {required:.1}%)"
            ),
            IneligibilityReason::AssignmentNotSubmitted { title, .. } => {
                format!("assignment '{title}' not submitted")
            }
            IneligibilityReason::AssignmentLate {
                title,
                due_date,
                submitted_date,
                ..
            } => format!("assignment '{title}' submitted {submitted_date}, due {due_date}"),
            IneligibilityReason::PlagiarismExceeded {
                title,
                score,
                max_allowed,
                ..
            } => format!("assignment '{title}' plagiarism {score}% exceeds {max_allowed}%"),
            IneligibilityReason::SceIncomplete { kind, status, .. } => {
                format!("SCE {kind} component {status}")
            }
        }
    }
}

/// Pure conjunction: any failed category rejects the record.
pub(crate) fn decide_overall(
    attendance: CategoryVerdict,
    assignments: CategoryVerdict,
    sce: CategoryVerdict,
) -> OverallVerdict {
    let all_pass = [attendance, assignments, sce]
        .iter()
        .all(|verdict| *verdict == CategoryVerdict::Pass);

    if all_pass {
        OverallVerdict::Approved
    } else {
        OverallVerdict::Rejected
    }
}
