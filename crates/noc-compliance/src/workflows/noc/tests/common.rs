use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::noc::domain::{
    AssignmentRecord, NocStatus, SceComponent, SceComponentKind, SceStatus,
    StudentComplianceRecord, StudentId,
};
use crate::workflows::noc::evaluation::EligibilityEvaluator;
use crate::workflows::noc::repository::{
    ComplianceRepository, NocNotification, NocNotifier, NotificationError, RepositoryError,
};
use crate::workflows::noc::{noc_router, NocReviewService};

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

/// Assignment due on 2025-03-10 with the given submission day in March.
pub(super) fn assignment(
    id: &str,
    submitted_day: Option<u32>,
    plagiarism_score: u8,
    max_plagiarism_allowed: u8,
) -> AssignmentRecord {
    AssignmentRecord {
        id: id.to_string(),
        title: format!("Assignment {id}"),
        due_date: date(3, 10),
        submitted_date: submitted_day.map(|day| date(3, day)),
        plagiarism_score,
        max_plagiarism_allowed,
    }
}

pub(super) fn on_time(id: &str, plagiarism_score: u8, max_plagiarism_allowed: u8) -> AssignmentRecord {
    assignment(id, Some(8), plagiarism_score, max_plagiarism_allowed)
}

pub(super) fn missing(id: &str) -> AssignmentRecord {
    assignment(id, None, 0, 25)
}

pub(super) fn sce(id: &str, kind: SceComponentKind, status: SceStatus) -> SceComponent {
    SceComponent {
        id: id.to_string(),
        kind,
        title: format!("SCE {id}"),
        status,
    }
}

pub(super) fn completed_pbl() -> SceComponent {
    sce("sce-pbl", SceComponentKind::Pbl, SceStatus::Completed)
}

pub(super) fn record(
    suffix: &str,
    attendance_percentage: f64,
    assignments: Vec<AssignmentRecord>,
    sce_components: Vec<SceComponent>,
) -> StudentComplianceRecord {
    StudentComplianceRecord {
        student_id: StudentId(format!("stu-{suffix}")),
        name: "Asha Rao".to_string(),
        roll_no: format!("CS-{suffix}"),
        attendance_percentage,
        assignments,
        sce_components,
        noc_status: NocStatus::Pending,
    }
}

/// Scenario 1: attendance 82, one clean on-time assignment, one completed SCE component.
pub(super) fn eligible_record(suffix: &str) -> StudentComplianceRecord {
    record(suffix, 82.0, vec![on_time("asg-1", 15, 25)], vec![completed_pbl()])
}

pub(super) fn low_attendance_record(suffix: &str) -> StudentComplianceRecord {
    record(suffix, 68.0, vec![on_time("asg-1", 10, 25)], vec![completed_pbl()])
}

pub(super) fn evaluator() -> EligibilityEvaluator {
    EligibilityEvaluator::default()
}

pub(super) fn build_service() -> (
    NocReviewService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = NocReviewService::new(repository.clone(), notifier.clone(), evaluator());
    (service, repository, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<BTreeMap<StudentId, StudentComplianceRecord>>>,
}

impl ComplianceRepository for MemoryRepository {
    fn insert(
        &self,
        record: StudentComplianceRecord,
    ) -> Result<StudentComplianceRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.student_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.student_id.clone(), record.clone());
        Ok(record)
    }

    fn update_pending(&self, record: StudentComplianceRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.student_id) {
            Some(existing) if existing.noc_status == NocStatus::Pending => {
                *existing = record;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn transition(
        &self,
        id: &StudentId,
        expected: NocStatus,
        next: NocStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(id) {
            Some(existing) if existing.noc_status == expected => {
                existing.noc_status = next;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<StudentComplianceRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().take(limit).cloned().collect())
    }

    fn pending(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.noc_status == NocStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<NocNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<NocNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NocNotifier for MemoryNotifier {
    fn publish(&self, notification: NocNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl NocNotifier for OfflineNotifier {
    fn publish(&self, _notification: NocNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ComplianceRepository for UnavailableRepository {
    fn insert(
        &self,
        _record: StudentComplianceRecord,
    ) -> Result<StudentComplianceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_pending(&self, _record: StudentComplianceRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transition(
        &self,
        _id: &StudentId,
        _expected: NocStatus,
        _next: NocStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &StudentId) -> Result<Option<StudentComplianceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: NocReviewService<MemoryRepository, MemoryNotifier>,
) -> axum::Router {
    noc_router(Arc::new(service))
}
