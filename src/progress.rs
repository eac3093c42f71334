//! Progress classification against the plan.
//!
//! # Rules
//!
//! The *scheduled* department is the one whose window contains today,
//! or failing that the last one already started. Its pipeline index is
//! compared with the job's actual department:
//!
//! - `AHEAD`: the job is further down the pipeline than planned.
//! - `STALLED`: behind plan, and no completion percentage has moved for
//!   the stall threshold (two working days by default).
//! - `SLIPPING`: behind plan, but progress moved recently.
//! - `ON_TRACK`: otherwise, including jobs with no plan yet.
//!
//! A due date that differs from the one the current plan was computed
//! against raises `needs_reschedule` until the next run.

use chrono::{Days, NaiveDate};

use crate::config::ShopConfig;
use crate::error::ConfigResult;
use crate::models::{Calendar, Department, Job, OvertimeTier, ProgressStatus};
use crate::scheduler::remaining_windows;

/// Classifies jobs against their current schedule.
#[derive(Debug, Clone)]
pub struct ProgressTracker<'a> {
    config: &'a ShopConfig,
    calendar: Calendar,
}

impl<'a> ProgressTracker<'a> {
    /// Creates a tracker using the configured stall threshold.
    pub fn new(config: &'a ShopConfig) -> Self {
        Self {
            config,
            calendar: config.calendar_for(OvertimeTier::None),
        }
    }

    /// Department the plan puts the job in on `today`.
    pub fn scheduled_department(&self, job: &Job, today: NaiveDate) -> Option<Department> {
        if let Some((dept, _)) = job.schedule.iter().find(|(_, w)| w.contains(today)) {
            return Some(*dept);
        }
        job.schedule
            .iter()
            .filter(|(_, w)| w.start <= today)
            .max_by_key(|(dept, w)| (w.start, self.config.pipeline_index(**dept)))
            .map(|(dept, _)| *dept)
    }

    /// Progress status of one job.
    pub fn status(&self, job: &Job, today: NaiveDate) -> ProgressStatus {
        let Some(planned) = self.scheduled_department(job, today) else {
            return ProgressStatus::OnTrack;
        };
        let (Some(planned), Some(actual)) = (
            self.config.pipeline_index(planned),
            self.config.pipeline_index(job.current_department),
        ) else {
            return ProgressStatus::OnTrack;
        };

        if actual > planned {
            ProgressStatus::Ahead
        } else if actual < planned {
            if self.is_stalled(job, today) {
                ProgressStatus::Stalled
            } else {
                ProgressStatus::Slipping
            }
        } else {
            ProgressStatus::OnTrack
        }
    }

    /// Whether no progress was recorded for the stall threshold.
    pub fn is_stalled(&self, job: &Job, today: NaiveDate) -> bool {
        match job.last_progress_at {
            None => true,
            Some(last) if last >= today => false,
            Some(last) => {
                let idle = self
                    .calendar
                    .working_days_between(last + Days::new(1), today);
                idle >= self.config.stall_days
            }
        }
    }

    /// Whether the due date moved since the schedule was computed.
    pub fn needs_reschedule(job: &Job) -> bool {
        job.previous_due_date.is_some() && job.previous_due_date != job.due_date
    }

    /// Recomputes the derived flags and remaining windows of every job
    /// without touching its schedule.
    pub fn track(&self, jobs: &[Job], today: NaiveDate) -> Vec<Job> {
        jobs.iter()
            .map(|job| {
                let mut job = job.clone();
                job.progress_status = self.status(&job, today);
                job.needs_reschedule = Self::needs_reschedule(&job);
                job.remaining_schedule = remaining_windows(&job.schedule, today);
                job
            })
            .collect()
    }
}

/// Classifies progress for already-scheduled jobs.
///
/// # Errors
/// Returns the configuration defect, if any.
pub fn track_progress(jobs: &[Job], as_of: NaiveDate, config: &ShopConfig) -> ConfigResult<Vec<Job>> {
    config.validate()?;
    Ok(ProgressTracker::new(config).track(jobs, as_of))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, DateWindow};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Laser 12..16, Welding 19..23, Polish 26..27.
    fn planned_job(current: Department) -> Job {
        let mut job = Job::new("J1", Category::FabricatedMetal, 100.0)
            .in_department(current)
            .with_due_date(date(2026, 10, 30));
        job.schedule
            .insert(Department::Laser, DateWindow::new(date(2026, 10, 12), date(2026, 10, 16)));
        job.schedule
            .insert(Department::Welding, DateWindow::new(date(2026, 10, 19), date(2026, 10, 23)));
        job.schedule
            .insert(Department::Polish, DateWindow::new(date(2026, 10, 26), date(2026, 10, 27)));
        job
    }

    #[test]
    fn test_on_track() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let job = planned_job(Department::Welding);
        assert_eq!(tracker.status(&job, date(2026, 10, 20)), ProgressStatus::OnTrack);
    }

    #[test]
    fn test_ahead() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let job = planned_job(Department::Polish);
        assert_eq!(tracker.status(&job, date(2026, 10, 20)), ProgressStatus::Ahead);
    }

    #[test]
    fn test_stalled_without_progress() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let job = planned_job(Department::Laser);
        assert_eq!(tracker.status(&job, date(2026, 10, 20)), ProgressStatus::Stalled);

        // last moved Friday; Sat + Mon idle = 2 working days
        let mut job = planned_job(Department::Laser);
        job.last_progress_at = Some(date(2026, 10, 16));
        assert_eq!(tracker.status(&job, date(2026, 10, 19)), ProgressStatus::Stalled);
    }

    #[test]
    fn test_configured_stall_threshold() {
        let mut config = ShopConfig::default();
        config.stall_days = 3;
        let tracker = ProgressTracker::new(&config);

        // Sat + Mon idle is below a three-day threshold
        let mut job = planned_job(Department::Laser);
        job.last_progress_at = Some(date(2026, 10, 16));
        assert_eq!(tracker.status(&job, date(2026, 10, 19)), ProgressStatus::Slipping);
        assert_eq!(tracker.status(&job, date(2026, 10, 20)), ProgressStatus::Stalled);
    }

    #[test]
    fn test_slipping_with_recent_progress() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let mut job = planned_job(Department::Laser);
        job.last_progress_at = Some(date(2026, 10, 17)); // Saturday, Mon is 1 idle day
        assert_eq!(tracker.status(&job, date(2026, 10, 19)), ProgressStatus::Slipping);
    }

    #[test]
    fn test_between_windows_uses_last_started() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let job = planned_job(Department::Welding);
        // Saturday 10-24 sits between welding and polish
        assert_eq!(
            tracker.scheduled_department(&job, date(2026, 10, 24)),
            Some(Department::Welding)
        );
        assert_eq!(tracker.scheduled_department(&job, date(2026, 10, 1)), None);
    }

    #[test]
    fn test_unscheduled_is_on_track() {
        let config = ShopConfig::default();
        let tracker = ProgressTracker::new(&config);
        let job = Job::new("J1", Category::Specialty, 10.0).in_department(Department::Assembly);
        assert_eq!(tracker.status(&job, date(2026, 10, 19)), ProgressStatus::OnTrack);
    }

    #[test]
    fn test_needs_reschedule() {
        let mut job = planned_job(Department::Laser);
        assert!(!ProgressTracker::needs_reschedule(&job)); // never scheduled
        job.previous_due_date = Some(date(2026, 10, 30));
        assert!(!ProgressTracker::needs_reschedule(&job));
        job.due_date = Some(date(2026, 11, 2));
        assert!(ProgressTracker::needs_reschedule(&job));
    }

    #[test]
    fn test_track_sets_remaining() {
        let config = ShopConfig::default();
        let jobs = vec![planned_job(Department::Welding)];
        let tracked = track_progress(&jobs, date(2026, 10, 21), &config).unwrap();

        let remaining = &tracked[0].remaining_schedule;
        assert!(!remaining.contains_key(&Department::Laser));
        assert_eq!(remaining[&Department::Welding].start, date(2026, 10, 21));
        assert_eq!(tracked[0].schedule, jobs[0].schedule); // plan untouched
    }
}
