use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use noc_compliance::workflows::noc::{
    ComplianceRepository, EligibilityEvaluator, NocNotification, NocNotifier, NocStatus,
    NotificationError, RepositoryError, StudentComplianceRecord, StudentId,
};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) evaluator: EligibilityEvaluator,
}

/// Process-local store; records are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryComplianceRepository {
    records: Arc<Mutex<BTreeMap<StudentId, StudentComplianceRecord>>>,
}

impl ComplianceRepository for InMemoryComplianceRepository {
    fn insert(
        &self,
        record: StudentComplianceRecord,
    ) -> Result<StudentComplianceRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.student_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.student_id.clone(), record.clone());
        Ok(record)
    }

    fn update_pending(&self, record: StudentComplianceRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.get_mut(&record.student_id) {
            Some(existing) if !existing.noc_status.is_decided() => {
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
        let mut guard = self.lock()?;
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
        Ok(self.lock()?.get(id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        Ok(self.lock()?.values().take(limit).cloned().collect())
    }

    fn pending(&self, limit: usize) -> Result<Vec<StudentComplianceRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .filter(|record| record.noc_status == NocStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl InMemoryComplianceRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<StudentId, StudentComplianceRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

/// Records notifications and logs them; stands in for the e-mail/portal transport.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotifier {
    events: Arc<Mutex<Vec<NocNotification>>>,
}

impl NocNotifier for InMemoryNotifier {
    fn publish(&self, notification: NocNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            student_id = %notification.student_id.0,
            "dispatching NOC notification"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("notifier mutex poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotifier {
    pub(crate) fn events(&self) -> Vec<NocNotification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_percentage(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as a percentage ({err})"))?;
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("percentage '{raw}' must lie between 0 and 100"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> StudentComplianceRecord {
        StudentComplianceRecord::new(
            StudentId(id.to_string()),
            "Meera Iyer",
            "EE-07",
            81.0,
            Vec::new(),
            Vec::new(),
        )
        .expect("valid record")
    }

    #[test]
    fn repository_rejects_duplicates_and_unknown_updates() {
        let repository = InMemoryComplianceRepository::default();
        repository.insert(sample("a")).expect("insert");

        assert!(matches!(
            repository.insert(sample("a")),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            repository.update_pending(sample("b")),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn transition_only_applies_from_the_expected_status() {
        let repository = InMemoryComplianceRepository::default();
        let id = repository.insert(sample("a")).expect("insert").student_id;

        repository
            .transition(&id, NocStatus::Pending, NocStatus::Rejected)
            .expect("first transition");

        assert!(matches!(
            repository.transition(&id, NocStatus::Pending, NocStatus::Approved),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            repository.update_pending(sample("a")),
            Err(RepositoryError::Conflict)
        ));
        let stored = repository.fetch(&id).expect("fetch").expect("present");
        assert_eq!(stored.noc_status, NocStatus::Rejected);
    }

    #[test]
    fn pending_skips_decided_records() {
        let repository = InMemoryComplianceRepository::default();
        repository.insert(sample("a")).expect("insert");
        let decided = repository.insert(sample("b")).expect("insert");
        repository
            .transition(&decided.student_id, NocStatus::Pending, NocStatus::Approved)
            .expect("transition");

        let pending = repository.pending(10).expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].student_id, StudentId("a".to_string()));
        assert_eq!(repository.list(1).expect("list").len(), 1);
    }

    #[test]
    fn parse_percentage_enforces_bounds() {
        assert_eq!(parse_percentage("80"), Ok(80.0));
        assert!(parse_percentage("101").is_err());
        assert!(parse_percentage("abc").is_err());
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date(" 2025-04-01 "),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid"))
        );
        assert!(parse_date("01/04/2025").is_err());
    }
}
