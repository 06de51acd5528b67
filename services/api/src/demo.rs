use crate::infra::{parse_date, parse_percentage, InMemoryComplianceRepository, InMemoryNotifier};
use crate::routes::{evaluate_records, EvaluatedRecord};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use noc_compliance::config::AppConfig;
use noc_compliance::error::AppError;
use noc_compliance::workflows::noc::{
    AssignmentRecord, ComplianceRepository, EligibilityEvaluator, EligibilityVerdict, NocNotifier,
    NocReviewService, ReviewAction, ReviewError, SceComponent, SceComponentKind, SceStatus,
    StudentComplianceRecord, StudentId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON file holding an array of compliance records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the attendance threshold (defaults to NOC_MIN_ATTENDANCE_PERCENT or 75)
    #[arg(long, value_parser = parse_percentage)]
    pub(crate) min_attendance: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Due date shared by the sample assignments (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) due_date: Option<NaiveDate>,
    /// Override the attendance threshold (defaults to NOC_MIN_ATTENDANCE_PERCENT or 75)
    #[arg(long, value_parser = parse_percentage)]
    pub(crate) min_attendance: Option<f64>,
    /// Only print the review queue; leave every NOC pending.
    #[arg(long)]
    pub(crate) skip_decisions: bool,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        input,
        min_attendance,
    } = args;

    let evaluator = resolve_evaluator(min_attendance)?;
    let raw = std::fs::read_to_string(&input)?;
    let records: Vec<StudentComplianceRecord> = serde_json::from_str(&raw)?;
    let results = evaluate_records(&evaluator, records)?;

    println!(
        "NOC eligibility for {} ({} records, attendance threshold {:.1}%)",
        input.display(),
        results.len(),
        evaluator.min_attendance_percent()
    );
    for result in &results {
        render_evaluated_record(result);
    }

    let eligible = results
        .iter()
        .filter(|result| result.verdict.is_approved())
        .count();
    println!(
        "\n{} eligible, {} not eligible",
        eligible,
        results.len() - eligible
    );

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        due_date,
        min_attendance,
        skip_decisions,
    } = args;

    let due_date = due_date.unwrap_or_else(|| Local::now().date_naive());
    let evaluator = resolve_evaluator(min_attendance)?;
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = NocReviewService::new(
        Arc::new(InMemoryComplianceRepository::default()),
        notifier.clone(),
        evaluator,
    );

    println!("NOC review demo");
    println!(
        "Assignments due {} | attendance threshold {:.1}%",
        due_date,
        evaluator.min_attendance_percent()
    );

    review_cohort(&service, demo_students(due_date)?, skip_decisions)?;
    if skip_decisions {
        return Ok(());
    }

    println!("\nNotifications dispatched");
    for event in notifier.events() {
        let detail = event
            .details
            .get("eligibility")
            .map(String::as_str)
            .unwrap_or("no details");
        println!("- [{}] {}: {}", event.template, event.student_id.0, detail);
    }

    let summary = service.cohort_summary(usize::MAX)?;
    println!(
        "\nCohort: {} students | {} eligible | {} approved, {} rejected, {} pending",
        summary.total, summary.eligible, summary.approved, summary.rejected, summary.pending
    );

    Ok(())
}

/// Registers the students, prints the queue and, unless skipped, decides every entry.
/// Refused decisions are printed; storage failures abort the walkthrough.
fn review_cohort<R, N>(
    service: &NocReviewService<R, N>,
    students: Vec<StudentComplianceRecord>,
    skip_decisions: bool,
) -> Result<(), AppError>
where
    R: ComplianceRepository + 'static,
    N: NocNotifier + 'static,
{
    for record in students {
        let stored = service.register(record)?;
        println!(
            "- Registered {} ({}) at {:.1}% attendance",
            stored.name, stored.roll_no, stored.attendance_percentage
        );
    }

    let queue = service.review_queue(usize::MAX)?;
    println!("\nReview queue");
    for entry in &queue {
        println!("- {} ({})", entry.name, entry.roll_no);
        render_verdict(&entry.verdict);
    }

    if skip_decisions {
        return Ok(());
    }

    println!("\nReviewer decisions");
    for entry in &queue {
        let action = if entry.verdict.is_approved() {
            ReviewAction::Approve
        } else {
            ReviewAction::Reject
        };
        match service.decide(&entry.student_id, action) {
            Ok(outcome) if outcome.notified => {
                println!("- {}: NOC {}", entry.name, outcome.noc_status.label())
            }
            Ok(outcome) => println!(
                "- {}: NOC {} (student not notified)",
                entry.name,
                outcome.noc_status.label()
            ),
            Err(err @ ReviewError::Repository(_)) => return Err(err.into()),
            Err(err) => println!("- {}: decision refused ({})", entry.name, err),
        }
    }

    if let Some(first) = queue.first() {
        if let Err(err) = service.decide(&first.student_id, ReviewAction::Reject) {
            println!("- Second decision for {} refused: {}", first.name, err);
        }
    }

    Ok(())
}

fn resolve_evaluator(min_attendance: Option<f64>) -> Result<EligibilityEvaluator, AppError> {
    let threshold = match min_attendance {
        Some(threshold) => threshold,
        None => AppConfig::load()?.eligibility.min_attendance_percent,
    };
    Ok(EligibilityEvaluator::new(threshold))
}

fn render_evaluated_record(result: &EvaluatedRecord) {
    println!(
        "\n{} ({}, {}) at {:.1}% attendance",
        result.name, result.student_id.0, result.roll_no, result.attendance_percentage
    );
    render_verdict(&result.verdict);
}

fn render_verdict(verdict: &EligibilityVerdict) {
    println!(
        "  attendance {} | assignments {} | SCE {} => {}",
        verdict.attendance.label(),
        verdict.assignments.label(),
        verdict.sce.label(),
        verdict.overall.label()
    );
    if let Some(shortfall) = verdict.attendance_shortfall {
        println!("  needs {:.1}% more attendance", shortfall);
    }
    for reason in &verdict.reasons {
        println!("  - {}", reason.summary());
    }
}

/// One student per documented outcome: eligible, low attendance, missing work, plagiarism,
/// and an unstarted SCE component.
fn demo_students(due_date: NaiveDate) -> Result<Vec<StudentComplianceRecord>, AppError> {
    let on_time = due_date - Duration::days(1);
    let lab = |id: &str, submitted: Option<NaiveDate>, score: u8| AssignmentRecord {
        id: id.to_string(),
        title: format!("Operating systems lab {id}"),
        due_date,
        submitted_date: submitted,
        plagiarism_score: score,
        max_plagiarism_allowed: 20,
    };
    let pbl = |status: SceStatus| SceComponent {
        id: "pbl-1".to_string(),
        kind: SceComponentKind::Pbl,
        title: "Smart attendance tracker".to_string(),
        status,
    };

    let students = vec![
        (
            "stu-101",
            "Aarav Kulkarni",
            "CSE-101",
            82.0,
            vec![lab("os-1", Some(on_time), 12)],
            vec![pbl(SceStatus::Completed)],
        ),
        (
            "stu-102",
            "Diya Menon",
            "CSE-102",
            68.0,
            vec![lab("os-1", Some(on_time), 8)],
            vec![pbl(SceStatus::Completed)],
        ),
        (
            "stu-103",
            "Ishaan Verma",
            "CSE-103",
            85.0,
            vec![lab("os-1", Some(on_time), 10), lab("os-2", None, 0)],
            vec![pbl(SceStatus::Completed)],
        ),
        (
            "stu-104",
            "Sara Thomas",
            "CSE-104",
            90.0,
            vec![lab("os-1", Some(on_time), 34)],
            vec![pbl(SceStatus::Completed)],
        ),
        (
            "stu-105",
            "Vihaan Joshi",
            "CSE-105",
            80.0,
            Vec::new(),
            vec![pbl(SceStatus::NotStarted)],
        ),
    ];

    students
        .into_iter()
        .map(|(id, name, roll_no, attendance, assignments, components)| {
            StudentComplianceRecord::new(
                StudentId(id.to_string()),
                name,
                roll_no,
                attendance,
                assignments,
                components,
            )
            .map_err(AppError::from)
        })
        .collect()
}
