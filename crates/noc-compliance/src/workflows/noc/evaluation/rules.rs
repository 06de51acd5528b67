use super::super::domain::{AssignmentRecord, SceComponent, SubmissionStatus};
use super::policy::{CategoryVerdict, IneligibilityReason};

pub(crate) fn check_attendance(
    attendance_percentage: f64,
    min_attendance_percent: f64,
    reasons: &mut Vec<IneligibilityReason>,
) -> CategoryVerdict {
    let passed = attendance_percentage >= min_attendance_percent;
    if !passed {
        reasons.push(IneligibilityReason::AttendanceBelowThreshold {
            required: min_attendance_percent,
            actual: attendance_percentage,
        });
    }
    CategoryVerdict::from_passed(passed)
}

/// Every assignment must be compliant; an empty list passes. A submitted assignment reports
/// lateness and excess plagiarism separately, so one item can contribute two reasons.
pub(crate) fn check_assignments(
    assignments: &[AssignmentRecord],
    reasons: &mut Vec<IneligibilityReason>,
) -> CategoryVerdict {
    let before = reasons.len();

    for assignment in assignments {
        let Some(submitted_date) = assignment.submitted_date else {
            reasons.push(IneligibilityReason::AssignmentNotSubmitted {
                assignment_id: assignment.id.clone(),
                title: assignment.title.clone(),
            });
            continue;
        };

        if assignment.submission_status() == SubmissionStatus::Late {
            reasons.push(IneligibilityReason::AssignmentLate {
                assignment_id: assignment.id.clone(),
                title: assignment.title.clone(),
                due_date: assignment.due_date,
                submitted_date,
            });
        }
        if !assignment.within_plagiarism_limit() {
            reasons.push(IneligibilityReason::PlagiarismExceeded {
                assignment_id: assignment.id.clone(),
                title: assignment.title.clone(),
                score: assignment.plagiarism_score,
                max_allowed: assignment.max_plagiarism_allowed,
            });
        }
    }

    let passed = reasons.len() == before;
    debug_assert_eq!(passed, assignments.iter().all(AssignmentRecord::is_compliant));
    CategoryVerdict::from_passed(passed)
}

/// Every SCE component must be completed; an empty list passes.
pub(crate) fn check_sce_components(
    components: &[SceComponent],
    reasons: &mut Vec<IneligibilityReason>,
) -> CategoryVerdict {
    let mut passed = true;

    for component in components.iter().filter(|component| !component.is_compliant()) {
        passed = false;
        reasons.push(IneligibilityReason::SceIncomplete {
            component_id: component.id.clone(),
            kind: component.kind.label().to_string(),
            status: component.status.label().to_string(),
        });
    }

    CategoryVerdict::from_passed(passed)
}
