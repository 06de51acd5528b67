use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{NocStatus, SceStatus, StudentComplianceRecord, StudentId};
use super::evaluation::{EligibilityEvaluator, EligibilityVerdict};
use super::repository::{ComplianceRepository, NocNotification, NocNotifier, RepositoryError};
use super::validation::{
    validate_attendance, validate_plagiarism_score, InvalidRecordError, RecordGuard,
};

/// Explicit reviewer action applied to a pending NOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    fn resulting_status(self) -> NocStatus {
        match self {
            ReviewAction::Approve => NocStatus::Approved,
            ReviewAction::Reject => NocStatus::Rejected,
        }
    }

    fn template(self) -> &'static str {
        match self {
            ReviewAction::Approve => "noc_approved",
            ReviewAction::Reject => "noc_rejected",
        }
    }
}

/// Result of a recorded reviewer decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub student_id: StudentId,
    pub noc_status: NocStatus,
    pub verdict: EligibilityVerdict,
    /// False when the decision was stored but the student notification could not be sent.
    pub notified: bool,
}

/// Pending record paired with the verdict computed for it just now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewQueueEntry {
    pub student_id: StudentId,
    pub name: String,
    pub roll_no: String,
    pub verdict: EligibilityVerdict,
}

/// Headline counts for a faculty or admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CohortSummary {
    pub total: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
}

/// Service composing the record guard, repository, notifier, and evaluator.
pub struct NocReviewService<R, N> {
    guard: RecordGuard,
    evaluator: EligibilityEvaluator,
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> NocReviewService<R, N>
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, evaluator: EligibilityEvaluator) -> Self {
        Self {
            guard: RecordGuard,
            evaluator,
            repository,
            notifier,
        }
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    /// Validate and store a record supplied by the data source. New records always start pending.
    pub fn register(
        &self,
        mut record: StudentComplianceRecord,
    ) -> Result<StudentComplianceRecord, ReviewError> {
        self.guard.validate(&record)?;
        record.noc_status = NocStatus::Pending;

        let stored = self.repository.insert(record)?;
        info!(student_id = %stored.student_id.0, "registered compliance record");
        Ok(stored)
    }

    /// Compute a fresh verdict. Never writes to the repository.
    pub fn evaluate(&self, student_id: &StudentId) -> Result<EligibilityVerdict, ReviewError> {
        let record = self.get(student_id)?;
        let verdict = self.evaluator.evaluate(&record);
        debug!(
            student_id = %student_id.0,
            overall = verdict.overall.label(),
            "evaluated NOC eligibility"
        );
        Ok(verdict)
    }

    /// Persist an explicit approve/reject decision on a pending record.
    pub fn decide(
        &self,
        student_id: &StudentId,
        action: ReviewAction,
    ) -> Result<ReviewOutcome, ReviewError> {
        let record = self.get(student_id)?;

        if record.noc_status.is_decided() {
            warn!(
                student_id = %student_id.0,
                status = record.noc_status.label(),
                "refused decision on already decided NOC"
            );
            return Err(ReviewError::AlreadyDecided(record.noc_status));
        }

        let verdict = self.evaluator.evaluate(&record);
        if action == ReviewAction::Approve && !verdict.is_approved() {
            warn!(
                student_id = %student_id.0,
                "refused approval of ineligible student"
            );
            return Err(ReviewError::NotEligible(Box::new(verdict)));
        }

        let next = action.resulting_status();
        match self
            .repository
            .transition(student_id, NocStatus::Pending, next)
        {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => return Err(self.already_decided(student_id)),
            Err(err) => return Err(err.into()),
        }
        info!(
            student_id = %student_id.0,
            decision = next.label(),
            "recorded NOC decision"
        );

        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), next.label().to_string());
        details.insert("eligibility".to_string(), verdict.summary());
        let notified = match self.notifier.publish(NocNotification {
            template: action.template().to_string(),
            student_id: student_id.clone(),
            details,
        }) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    student_id = %student_id.0,
                    decision = next.label(),
                    error = %err,
                    "NOC decision stored but notification failed"
                );
                false
            }
        };

        Ok(ReviewOutcome {
            student_id: student_id.clone(),
            noc_status: next,
            verdict,
            notified,
        })
    }

    pub fn record_attendance(
        &self,
        student_id: &StudentId,
        attendance_percentage: f64,
    ) -> Result<StudentComplianceRecord, ReviewError> {
        validate_attendance(attendance_percentage)?;
        self.modify_pending(student_id, |record| {
            record.attendance_percentage = attendance_percentage;
            Ok(())
        })
    }

    pub fn update_sce_status(
        &self,
        student_id: &StudentId,
        component_id: &str,
        status: SceStatus,
    ) -> Result<StudentComplianceRecord, ReviewError> {
        self.modify_pending(student_id, |record| {
            let component = record
                .sce_components
                .iter_mut()
                .find(|component| component.id == component_id)
                .ok_or_else(|| ReviewError::UnknownSceComponent(component_id.to_string()))?;
            component.status = status;
            Ok(())
        })
    }

    pub fn record_submission(
        &self,
        student_id: &StudentId,
        assignment_id: &str,
        submitted_date: NaiveDate,
        plagiarism_score: u8,
    ) -> Result<StudentComplianceRecord, ReviewError> {
        validate_plagiarism_score(assignment_id, plagiarism_score)?;
        self.modify_pending(student_id, |record| {
            let assignment = record
                .assignments
                .iter_mut()
                .find(|assignment| assignment.id == assignment_id)
                .ok_or_else(|| ReviewError::UnknownAssignment(assignment_id.to_string()))?;
            assignment.submitted_date = Some(submitted_date);
            assignment.plagiarism_score = plagiarism_score;
            Ok(())
        })
    }

    pub fn get(&self, student_id: &StudentId) -> Result<StudentComplianceRecord, ReviewError> {
        let record = self
            .repository
            .fetch(student_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Pending records with their current verdicts, eligible students first. The whole pending
    /// set is ranked before `limit` applies.
    pub fn review_queue(&self, limit: usize) -> Result<Vec<ReviewQueueEntry>, ReviewError> {
        let mut entries: Vec<ReviewQueueEntry> = self
            .repository
            .pending(usize::MAX)?
            .into_iter()
            .filter(|record| !record.noc_status.is_decided())
            .map(|record| {
                let verdict = self.evaluator.evaluate(&record);
                ReviewQueueEntry {
                    student_id: record.student_id,
                    name: record.name,
                    roll_no: record.roll_no,
                    verdict,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.verdict
                .is_approved()
                .cmp(&a.verdict.is_approved())
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    pub fn cohort_summary(&self, limit: usize) -> Result<CohortSummary, ReviewError> {
        let records = self.repository.list(limit)?;
        let mut summary = CohortSummary::default();

        for record in &records {
            summary.total += 1;
            if self.evaluator.evaluate(record).is_approved() {
                summary.eligible += 1;
            } else {
                summary.ineligible += 1;
            }
            match record.noc_status {
                NocStatus::Pending => summary.pending += 1,
                NocStatus::Approved => summary.approved += 1,
                NocStatus::Rejected => summary.rejected += 1,
            }
        }

        Ok(summary)
    }

    fn modify_pending<F>(
        &self,
        student_id: &StudentId,
        apply: F,
    ) -> Result<StudentComplianceRecord, ReviewError>
    where
        F: FnOnce(&mut StudentComplianceRecord) -> Result<(), ReviewError>,
    {
        let mut record = self.get(student_id)?;
        if record.noc_status.is_decided() {
            return Err(ReviewError::AlreadyDecided(record.noc_status));
        }

        apply(&mut record)?;
        self.guard.validate(&record)?;
        match self.repository.update_pending(record.clone()) {
            Ok(()) => Ok(record),
            Err(RepositoryError::Conflict) => Err(self.already_decided(student_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// A write lost the race against a decision; report whatever status won.
    fn already_decided(&self, student_id: &StudentId) -> ReviewError {
        match self.get(student_id) {
            Ok(record) => ReviewError::AlreadyDecided(record.noc_status),
            Err(err) => err,
        }
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Invalid(#[from] InvalidRecordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("NOC already {}", .0.label())]
    AlreadyDecided(NocStatus),
    #[error("student is not eligible for NOC approval: {}", .0.summary())]
    NotEligible(Box<EligibilityVerdict>),
    #[error("unknown assignment {0}")]
    UnknownAssignment(String),
    #[error("unknown SCE component {0}")]
    UnknownSceComponent(String),
}
