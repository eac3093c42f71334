//! Input validation for job records.
//!
//! Checks each job before scheduling. Detects:
//! - Missing due dates
//! - Non-finite or non-positive points
//! - Duplicate IDs (the first occurrence wins)
//! - Current department outside the configured pipeline
//! - Manual windows with `start > end`
//! - Work longer than the capacity search horizon
//!
//! A job with any error is excluded from capacity allocation but still
//! returned to the caller, so it stays visible on the dashboard.

use std::collections::HashSet;

use crate::config::ShopConfig;
use crate::models::Job;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Position of the job in the input slice.
    pub index: usize,
    /// Offending job ID.
    pub job_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Job has no due date.
    MissingDueDate,
    /// Points are NaN, infinite, zero or negative.
    InvalidPoints,
    /// Two jobs share the same ID.
    DuplicateId,
    /// Job ID is blank.
    EmptyId,
    /// Current department is not in the pipeline.
    UnknownDepartment,
    /// A manual window ends before it starts.
    InvalidManualWindow,
    /// A department would take longer than the search horizon.
    ExceedsHorizon,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, index: usize, job: &Job, message: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            job_id: job.id.clone(),
            message: message.into(),
        }
    }
}

/// Validates job records against a configuration.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_jobs(jobs: &[Job], config: &ShopConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for (index, job) in jobs.iter().enumerate() {
        if job.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                index,
                job,
                format!("Job at position {index} has no ID"),
            ));
        } else if !ids.insert(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                index,
                job,
                format!("Duplicate job ID: {}", job.id),
            ));
        }

        if job.due_date.is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingDueDate,
                index,
                job,
                format!("Job '{}' has no due date", job.id),
            ));
        }

        if !(job.points.is_finite() && job.points > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPoints,
                index,
                job,
                format!("Job '{}' has invalid points: {}", job.id, job.points),
            ));
        }

        if config.pipeline_index(job.current_department).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownDepartment,
                index,
                job,
                format!(
                    "Job '{}' sits in {}, which is not in the pipeline",
                    job.id, job.current_department
                ),
            ));
        }

        for (dept, window) in &job.manual_windows {
            if !window.is_ordered() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidManualWindow,
                    index,
                    job,
                    format!(
                        "Job '{}' has a manual {} window ending before it starts",
                        job.id, dept
                    ),
                ));
            }
        }

        if let Some(message) = exceeds_horizon(job, config) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ExceedsHorizon,
                index,
                job,
                message,
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Describes a job whose slowest pipeline department needs more working
/// days than the capacity search horizon spans. `None` if it fits.
pub fn exceeds_horizon(job: &Job, config: &ShopConfig) -> Option<String> {
    if !job.points.is_finite() {
        return None;
    }
    let limit = f64::from(config.search_horizon_weeks) * 7.0;
    config
        .pipeline
        .iter()
        .map(|d| (*d, job.points / config.department(*d).daily_throughput))
        .filter(|(_, days)| *days > limit)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(dept, days)| {
            format!(
                "Job '{}' needs {:.0} working days in {}, beyond the {}-week search horizon",
                job.id,
                days.ceil(),
                dept,
                config.search_horizon_weeks
            )
        })
}

/// Exclusion reason per input position, `None` for schedulable jobs.
pub fn exclusions(jobs: &[Job], config: &ShopConfig) -> Vec<Option<String>> {
    let mut reasons: Vec<Option<String>> = vec![None; jobs.len()];
    if let Err(errors) = validate_jobs(jobs, config) {
        for e in errors {
            let slot = &mut reasons[e.index];
            match slot {
                Some(existing) => {
                    existing.push_str("; ");
                    existing.push_str(&e.message);
                }
                None => *slot = Some(e.message),
            }
        }
    }
    reasons
}
