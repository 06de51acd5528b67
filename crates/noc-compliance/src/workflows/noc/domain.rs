use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{InvalidRecordError, RecordGuard};

/// Identifier wrapper for students under NOC review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Submission state derived from the due date and the submission date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Late,
    Missing,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Late => "late",
            SubmissionStatus::Missing => "missing",
        }
    }
}

/// A single assignment as seen by the compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: String,
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub submitted_date: Option<NaiveDate>,
    pub plagiarism_score: u8,
    pub max_plagiarism_allowed: u8,
}

impl AssignmentRecord {
    /// Submitting on the due date counts as on time.
    pub fn submission_status(&self) -> SubmissionStatus {
        match self.submitted_date {
            None => SubmissionStatus::Missing,
            Some(submitted) if submitted > self.due_date => SubmissionStatus::Late,
            Some(_) => SubmissionStatus::Submitted,
        }
    }

    pub fn within_plagiarism_limit(&self) -> bool {
        self.plagiarism_score <= self.max_plagiarism_allowed
    }

    /// Late or missing work is never compliant, whatever the plagiarism score.
    pub fn is_compliant(&self) -> bool {
        self.submission_status() == SubmissionStatus::Submitted && self.within_plagiarism_limit()
    }
}

/// Kinds of supplementary continuous evaluation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceComponentKind {
    #[serde(rename = "PBL")]
    Pbl,
    Project,
    Presentation,
    Tutorial,
    Other(String),
}

impl SceComponentKind {
    pub fn label(&self) -> &str {
        match self {
            SceComponentKind::Pbl => "PBL",
            SceComponentKind::Project => "Project",
            SceComponentKind::Presentation => "Presentation",
            SceComponentKind::Tutorial => "Tutorial",
            SceComponentKind::Other(name) => name.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceStatus {
    Completed,
    InProgress,
    NotStarted,
}

impl SceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SceStatus::Completed => "completed",
            SceStatus::InProgress => "in-progress",
            SceStatus::NotStarted => "not-started",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceComponent {
    pub id: String,
    pub kind: SceComponentKind,
    pub title: String,
    pub status: SceStatus,
}

impl SceComponent {
    pub fn is_compliant(&self) -> bool {
        self.status == SceStatus::Completed
    }
}

/// Persisted reviewer decision. Only an explicit approve/reject action moves it off `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NocStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl NocStatus {
    pub const fn label(self) -> &'static str {
        match self {
            NocStatus::Pending => "pending",
            NocStatus::Approved => "approved",
            NocStatus::Rejected => "rejected",
        }
    }

    pub const fn is_decided(self) -> bool {
        !matches!(self, NocStatus::Pending)
    }
}

/// Dashboard banding for attendance. Informational; the verdict uses the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStanding {
    Good,
    Warning,
    Critical,
}

impl AttendanceStanding {
    const GOOD_FLOOR: f64 = 75.0;
    const WARNING_FLOOR: f64 = 65.0;

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= Self::GOOD_FLOOR {
            AttendanceStanding::Good
        } else if percentage >= Self::WARNING_FLOOR {
            AttendanceStanding::Warning
        } else {
            AttendanceStanding::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AttendanceStanding::Good => "good",
            AttendanceStanding::Warning => "warning",
            AttendanceStanding::Critical => "critical",
        }
    }
}

/// Everything the eligibility evaluator looks at for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentComplianceRecord {
    pub student_id: StudentId,
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    pub attendance_percentage: f64,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
    #[serde(default)]
    pub sce_components: Vec<SceComponent>,
    #[serde(default)]
    pub noc_status: NocStatus,
}

impl StudentComplianceRecord {
    /// Build a pending record, rejecting out-of-range values instead of clamping them.
    pub fn new(
        student_id: StudentId,
        name: impl Into<String>,
        roll_no: impl Into<String>,
        attendance_percentage: f64,
        assignments: Vec<AssignmentRecord>,
        sce_components: Vec<SceComponent>,
    ) -> Result<Self, InvalidRecordError> {
        let record = Self {
            student_id,
            name: name.into(),
            roll_no: roll_no.into(),
            attendance_percentage,
            assignments,
            sce_components,
            noc_status: NocStatus::Pending,
        };
        RecordGuard.validate(&record)?;
        Ok(record)
    }

    pub fn attendance_standing(&self) -> AttendanceStanding {
        AttendanceStanding::from_percentage(self.attendance_percentage)
    }

    pub fn assignment(&self, assignment_id: &str) -> Option<&AssignmentRecord> {
        self.assignments
            .iter()
            .find(|assignment| assignment.id == assignment_id)
    }

    pub fn sce_component(&self, component_id: &str) -> Option<&SceComponent> {
        self.sce_components
            .iter()
            .find(|component| component.id == component_id)
    }
}
