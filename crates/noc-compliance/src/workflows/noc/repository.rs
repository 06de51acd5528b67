use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{NocStatus, StudentComplianceRecord, StudentId};
use super::evaluation::EligibilityVerdict;

/// Storage abstraction so the review service can be exercised in isolation.
pub trait ComplianceRepository: Send + Sync {
    fn insert(
        &self,
        record: StudentComplianceRecord,
    ) -> Result<StudentComplianceRecord, RepositoryError>;
    /// Replace a stored record only while its stored status is still `Pending`.
    /// Returns `Conflict` once a decision has landed.
    fn update_pending(&self, record: StudentComplianceRecord) -> Result<(), RepositoryError>;
    /// Compare-and-set on `noc_status`. Must be atomic with respect to other writers;
    /// returns `Conflict` when the stored status is no longer `expected`.
    fn transition(
        &self,
        id: &StudentId,
        expected: NocStatus,
        next: NocStatus,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &StudentId) -> Result<Option<StudentComplianceRecord>, RepositoryError>;
    fn list(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError>;
    /// Records still awaiting a reviewer decision.
    fn pending(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for student notifications (e-mail, portal inbox).
pub trait NocNotifier: Send + Sync {
    fn publish(&self, notification: NocNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocNotification {
    pub template: String,
    pub student_id: StudentId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a student's NOC standing for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceStatusView {
    pub student_id: StudentId,
    pub roll_no: String,
    pub noc_status: &'static str,
    pub attendance_standing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
}

impl ComplianceStatusView {
    pub fn from_record(
        record: &StudentComplianceRecord,
        verdict: Option<&EligibilityVerdict>,
    ) -> Self {
        Self {
            student_id: record.student_id.clone(),
            roll_no: record.roll_no.clone(),
            noc_status: record.noc_status.label(),
            attendance_standing: record.attendance_standing().label(),
            eligibility: verdict.map(EligibilityVerdict::summary),
        }
    }
}
