//! Schedule insights (KPIs).
//!
//! Summarizes a completed run for display.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Late jobs | Jobs whose last window ends after their due date |
//! | Overloaded weeks | Department-weeks with allocation at or above capacity |
//! | Unscheduled jobs | Jobs excluded by validation |
//! | Out of sequence | Jobs with a manual window overlapping the previous department |
//! | On-Time Rate | Fraction of placed jobs meeting their due date |
//! | Utilization | Allocated / capacity per department over the loaded horizon |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::{CapacityLedger, CAPACITY_EPSILON};
use crate::models::{Department, Job, WeekKey};

/// Reference to a late job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRef {
    /// Job ID.
    pub id: String,
    /// Job name.
    pub name: String,
    /// Promised date.
    pub due_date: Option<NaiveDate>,
    /// Last scheduled day.
    pub projected_completion: Option<NaiveDate>,
    /// Calendar days past the due date.
    pub days_late: i64,
}

/// A department-week loaded at or above capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadedWeek {
    /// Department.
    pub department: Department,
    /// Week.
    pub week: WeekKey,
    /// Points allocated.
    pub allocated: f64,
    /// Capacity under the run's tier.
    pub capacity: f64,
}

/// Run summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Jobs with a scheduling conflict, latest first.
    pub late_jobs: Vec<JobRef>,
    /// Full or overloaded cells, by department then week.
    pub overloaded_weeks: Vec<OverloadedWeek>,
    /// IDs of jobs left out of allocation.
    pub unscheduled_jobs: Vec<String>,
    /// IDs of jobs whose manual windows break pipeline order.
    pub out_of_sequence_jobs: Vec<String>,
    /// Fraction of placed jobs finishing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Per-department utilization (0.0..).
    pub utilization_by_department: BTreeMap<Department, f64>,
    /// Mean of per-department utilization.
    pub avg_utilization: f64,
}

impl Insights {
    /// Computes insights from scheduled jobs and the run's ledger.
    ///
    /// # Arguments
    /// * `jobs` - Jobs as returned by the scheduler.
    /// * `ledger` - Ledger after all placements.
    /// * `pipeline` - Departments to report utilization for.
    pub fn calculate(jobs: &[Job], ledger: &CapacityLedger, pipeline: &[Department]) -> Self {
        let mut late_jobs = Vec::new();
        let mut unscheduled_jobs = Vec::new();
        let mut out_of_sequence_jobs = Vec::new();
        let mut placed = 0usize;
        let mut on_time = 0usize;

        for job in jobs {
            if job.exclusion_reason.is_some() {
                unscheduled_jobs.push(job.id.clone());
                continue;
            }
            if !job.is_scheduled() {
                continue;
            }
            placed += 1;
            if !job.out_of_sequence.is_empty() {
                out_of_sequence_jobs.push(job.id.clone());
            }

            let completion = job.completion_date();
            if job.scheduling_conflict {
                let days_late = match (completion, job.due_date) {
                    (Some(end), Some(due)) => (end - due).num_days(),
                    _ => 0,
                };
                late_jobs.push(JobRef {
                    id: job.id.clone(),
                    name: job.name.clone(),
                    due_date: job.due_date,
                    projected_completion: completion,
                    days_late,
                });
            } else {
                on_time += 1;
            }
        }
        late_jobs.sort_by(|a, b| b.days_late.cmp(&a.days_late).then_with(|| a.id.cmp(&b.id)));

        let cells = ledger.cells();
        let overloaded_weeks = cells
            .iter()
            .filter(|c| c.allocated + CAPACITY_EPSILON >= c.capacity)
            .map(|c| OverloadedWeek {
                department: c.department,
                week: c.week,
                allocated: c.allocated,
                capacity: c.capacity,
            })
            .collect();

        let utilization_by_department = Self::utilization(ledger, pipeline);
        let avg_utilization = if utilization_by_department.is_empty() {
            0.0
        } else {
            utilization_by_department.values().sum::<f64>() / utilization_by_department.len() as f64
        };

        let on_time_rate = if placed == 0 {
            1.0
        } else {
            on_time as f64 / placed as f64
        };

        Self {
            late_jobs,
            overloaded_weeks,
            unscheduled_jobs,
            out_of_sequence_jobs,
            on_time_rate,
            utilization_by_department,
            avg_utilization,
        }
    }

    /// Allocated over available points for each department, across every
    /// week from the first to the last loaded week of the whole ledger.
    fn utilization(ledger: &CapacityLedger, pipeline: &[Department]) -> BTreeMap<Department, f64> {
        let cells = ledger.cells();
        let (Some(first), Some(last)) = (
            cells.iter().map(|c| c.week).min(),
            cells.iter().map(|c| c.week).max(),
        ) else {
            return BTreeMap::new();
        };

        pipeline
            .iter()
            .map(|&dept| {
                let mut capacity = 0.0;
                let mut allocated = 0.0;
                let mut week = first;
                while week <= last {
                    capacity += ledger.capacity(dept, week);
                    allocated += ledger.allocated(dept, week);
                    week = week.next();
                }
                let ratio = if capacity > 0.0 { allocated / capacity } else { 0.0 };
                (dept, ratio)
            })
            .collect()
    }

    /// Whether any job is late or out of sequence, or any week overloaded.
    pub fn has_warnings(&self) -> bool {
        !self.late_jobs.is_empty()
            || !self.overloaded_weeks.is_empty()
            || !self.out_of_sequence_jobs.is_empty()
    }
}
