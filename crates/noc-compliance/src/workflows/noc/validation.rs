use std::collections::BTreeSet;

use super::domain::StudentComplianceRecord;

const MAX_PERCENT: u8 = 100;

/// Raised when a compliance record cannot be evaluated as supplied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRecordError {
    #[error("student id is required")]
    MissingStudentId,
    #[error("attendance percentage must lie within 0..=100 (found {0})")]
    AttendanceOutOfRange(f64),
    #[error("assignment {assignment_id} has plagiarism score {score} above 100")]
    PlagiarismScoreOutOfRange { assignment_id: String, score: u8 },
    #[error("assignment {assignment_id} allows plagiarism of {max}, above 100")]
    PlagiarismThresholdOutOfRange { assignment_id: String, max: u8 },
    #[error("assignment {0} appears more than once")]
    DuplicateAssignment(String),
    #[error("SCE component {0} appears more than once")]
    DuplicateSceComponent(String),
}

/// Ingestion-side check that keeps malformed records away from the evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordGuard;

impl RecordGuard {
    pub fn validate(&self, record: &StudentComplianceRecord) -> Result<(), InvalidRecordError> {
        if record.student_id.0.trim().is_empty() {
            return Err(InvalidRecordError::MissingStudentId);
        }

        validate_attendance(record.attendance_percentage)?;

        let mut seen = BTreeSet::new();
        for assignment in &record.assignments {
            validate_plagiarism_score(&assignment.id, assignment.plagiarism_score)?;
            if assignment.max_plagiarism_allowed > MAX_PERCENT {
                return Err(InvalidRecordError::PlagiarismThresholdOutOfRange {
                    assignment_id: assignment.id.clone(),
                    max: assignment.max_plagiarism_allowed,
                });
            }
            if !seen.insert(assignment.id.as_str()) {
                return Err(InvalidRecordError::DuplicateAssignment(
                    assignment.id.clone(),
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for component in &record.sce_components {
            if !seen.insert(component.id.as_str()) {
                return Err(InvalidRecordError::DuplicateSceComponent(
                    component.id.clone(),
                ));
            }
        }

        Ok(())
    }
}

pub(crate) fn validate_attendance(percentage: f64) -> Result<(), InvalidRecordError> {
    if percentage.is_finite() && (0.0..=100.0).contains(&percentage) {
        Ok(())
    } else {
        Err(InvalidRecordError::AttendanceOutOfRange(percentage))
    }
}

pub(crate) fn validate_plagiarism_score(
    assignment_id: &str,
    score: u8,
) -> Result<(), InvalidRecordError> {
    if score > MAX_PERCENT {
        Err(InvalidRecordError::PlagiarismScoreOutOfRange {
            assignment_id: assignment_id.to_string(),
            score,
        })
    } else {
        Ok(())
    }
}
