//! NOC eligibility evaluation and the review workflow built around it.
//!
//! The evaluator is a pure function of a [`StudentComplianceRecord`]. Everything else in this
//! module (validation, storage, notifications, HTTP) surrounds it without feeding state back in.

pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AssignmentRecord, AttendanceStanding, NocStatus, SceComponent, SceComponentKind, SceStatus,
    StudentComplianceRecord, StudentId, SubmissionStatus,
};
pub use evaluation::{
    evaluate, CategoryVerdict, EligibilityEvaluator, EligibilityVerdict, IneligibilityReason,
    OverallVerdict, MIN_ATTENDANCE_PERCENT,
};
pub use repository::{
    ComplianceRepository, ComplianceStatusView, NocNotification, NocNotifier, NotificationError,
    RepositoryError,
};
pub use router::noc_router;
pub use service::{
    CohortSummary, NocReviewService, ReviewAction, ReviewError, ReviewOutcome, ReviewQueueEntry,
};
pub use validation::{InvalidRecordError, RecordGuard};
