//! Finite-capacity forward scheduling and run insights.
//!
//! # Algorithm
//!
//! `ForwardScheduler` is a greedy, priority-driven placement over weekly
//! point budgets (`CapacityLedger`). It is not optimal, but it is fast,
//! deterministic and explains every delay it introduces.
//!
//! # Insights
//!
//! `Insights` aggregates late jobs, overloaded department-weeks, excluded
//! jobs, on-time rate and utilization.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod forward;
mod insights;
mod ledger;

pub use forward::{remaining_windows, Delay, ForwardScheduler, Placement, ScheduleRun};
pub use insights::{Insights, JobRef, OverloadedWeek};
pub use ledger::{Allocation, CapacityLedger, CellLoad, CAPACITY_EPSILON};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ShopConfig;
use crate::error::ConfigResult;
use crate::models::{Job, OvertimeTier};
use crate::progress::ProgressTracker;

/// Result of [`compute_schedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutput {
    /// Every input job, in input order, with derived fields populated.
    pub jobs: Vec<Job>,
    /// Run summary.
    pub insights: Insights,
}

/// Runs a full schedule over the job list.
///
/// Progress is classified against the plan each job carries in (the
/// previous run's output) before that plan is replaced. Input jobs are
/// not modified.
///
/// # Errors
/// Only a configuration defect fails the run. Bad job records are
/// excluded and reported in `Insights::unscheduled_jobs`.
pub fn compute_schedule(
    jobs: &[Job],
    as_of: NaiveDate,
    tier: OvertimeTier,
    config: &ShopConfig,
) -> ConfigResult<ScheduleOutput> {
    config.validate()?;

    let tracker = ProgressTracker::new(config);
    let tracked: Vec<_> = jobs
        .iter()
        .map(|job| {
            (
                tracker.status(job, as_of),
                ProgressTracker::needs_reschedule(job),
            )
        })
        .collect();

    let run = ForwardScheduler::new(config)
        .with_tier(tier)
        .schedule(jobs, as_of);
    let insights = Insights::calculate(&run.jobs, &run.ledger, &config.pipeline);

    let jobs = run
        .jobs
        .into_iter()
        .zip(tracked)
        .map(|(mut job, (status, reschedule))| {
            job.progress_status = status;
            job.needs_reschedule = reschedule;
            job.remaining_schedule = remaining_windows(&job.schedule, as_of);
            job.previous_due_date = job.due_date;
            job
        })
        .collect();

    Ok(ScheduleOutput { jobs, insights })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::models::{Category, DateWindow, Department, ProgressStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = ShopConfig::default().with_pipeline(vec![]);
        let result = compute_schedule(&[], date(2026, 10, 19), OvertimeTier::None, &config);
        assert!(matches!(result, Err(ConfigError::EmptyPipeline)));
    }

    #[test]
    fn test_due_date_change_raises_reschedule_once() {
        let config = ShopConfig::default();
        let today = date(2026, 10, 19);
        let job = Job::new("J1", Category::FabricatedMetal, 200.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 20)); // Friday

        let first = compute_schedule(&[job], today, OvertimeTier::None, &config).unwrap();
        assert!(!first.jobs[0].needs_reschedule);

        let mut moved = first.jobs.clone();
        moved[0].due_date = Some(date(2026, 11, 23)); // following Monday
        let second = compute_schedule(&moved, today, OvertimeTier::None, &config).unwrap();
        assert!(second.jobs[0].needs_reschedule);
        assert_eq!(second.jobs[0].previous_due_date, Some(date(2026, 11, 23)));

        let third = compute_schedule(&second.jobs, today, OvertimeTier::None, &config).unwrap();
        assert!(!third.jobs[0].needs_reschedule);
    }

    #[test]
    fn test_progress_uses_incoming_plan() {
        let config = ShopConfig::default();
        let today = date(2026, 10, 19);
        let job = Job::new("J1", Category::FabricatedMetal, 200.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 20));

        let first = compute_schedule(&[job], today, OvertimeTier::None, &config).unwrap();
        // job moved on to press brake while planned for laser today
        let mut advanced = first.jobs.clone();
        advanced[0].current_department = Department::PressBrake;
        let second = compute_schedule(&advanced, today, OvertimeTier::None, &config).unwrap();
        assert_eq!(second.jobs[0].progress_status, ProgressStatus::Ahead);
        assert_eq!(
            second.jobs[0].schedule.keys().next(),
            Some(&Department::PressBrake)
        );
    }

    #[test]
    fn test_excluded_jobs_in_insights() {
        let config = ShopConfig::default();
        let jobs = vec![
            Job::new("ok", Category::Specialty, 50.0)
                .in_department(Department::Laser)
                .with_due_date(date(2026, 11, 20)),
            Job::new("undated", Category::Specialty, 50.0).in_department(Department::Laser),
        ];
        let output = compute_schedule(&jobs, date(2026, 10, 19), OvertimeTier::None, &config).unwrap();

        assert_eq!(output.jobs.len(), 2);
        assert_eq!(output.insights.unscheduled_jobs, vec!["undated".to_string()]);
        assert!(output.jobs[1].exclusion_reason.is_some());
        assert!(output.jobs[0].is_scheduled());
    }

    #[test]
    fn test_oversized_job_excluded_not_fatal() {
        let config = ShopConfig::default();
        let jobs = vec![
            Job::new("huge", Category::Specialty, 1.0e11)
                .in_department(Department::Laser)
                .with_due_date(date(2026, 11, 20)),
            Job::new("ok", Category::Specialty, 50.0)
                .in_department(Department::Laser)
                .with_due_date(date(2026, 11, 20)),
        ];
        let output = compute_schedule(&jobs, date(2026, 10, 19), OvertimeTier::None, &config).unwrap();

        assert!(!output.jobs[0].is_scheduled());
        assert_eq!(output.insights.unscheduled_jobs, vec!["huge".to_string()]);
        assert!(output.jobs[1].is_scheduled());
    }

    #[test]
    fn test_out_of_sequence_manual_window_reported() {
        let mut config =
            ShopConfig::default().with_pipeline(vec![Department::Laser, Department::Welding]);
        config.batching.cutoff = Department::Laser;
        let jobs = vec![Job::new("M", Category::Specialty, 850.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 12, 31))
            .with_manual_window(Department::Welding, DateWindow::day(date(2026, 10, 19)))];
        let output = compute_schedule(&jobs, date(2026, 10, 19), OvertimeTier::None, &config).unwrap();

        assert_eq!(output.jobs[0].out_of_sequence, vec![Department::Welding]);
        assert_eq!(output.insights.out_of_sequence_jobs, vec!["M".to_string()]);
        assert!(output.insights.has_warnings());
    }

    #[test]
    fn test_output_serializes() {
        let config = ShopConfig::default();
        let jobs = vec![Job::new("J1", Category::DoorAssembly, 300.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 20))];
        let output = compute_schedule(&jobs, date(2026, 10, 19), OvertimeTier::Tier1, &config).unwrap();
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"progress_status\":\"ON_TRACK\""));
    }
}
