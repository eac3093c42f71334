//! Batch cohorts for early-pipeline jobs.
//!
//! Jobs of the same category waiting in the same early department are
//! cheaper to run together (one setup, one nest). A cohort forms when at
//! least two jobs share `(category, current department)`, sit at or
//! before the batching cutoff, and are due within the look-ahead window.
//!
//! The cohort's anchor is the earliest member due date. The scheduler
//! sorts members by the anchor instead of their own due dates, so the
//! whole cohort lands back to back.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::ShopConfig;
use crate::models::{Calendar, Category, Department, Job};

/// Grouping key of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    /// Shared category.
    pub category: Category,
    /// Shared current department.
    pub department: Department,
}

impl BatchKey {
    /// Key for a job.
    pub fn of(job: &Job) -> Self {
        Self {
            category: job.category,
            department: job.current_department,
        }
    }

    /// Text form, used for lexical ordering between cohorts.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category.code(), self.department)
    }
}

/// A group of jobs scheduled contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCohort {
    /// Shared key.
    pub key: BatchKey,
    /// Earliest due date among members.
    pub anchor: NaiveDate,
    /// Member job IDs, by own due date then ID.
    pub members: Vec<String>,
}

/// Cohorts found in one run.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Cohorts with two or more members, by anchor then key label.
    pub cohorts: Vec<BatchCohort>,
    membership: HashMap<String, usize>,
}

impl BatchPlan {
    /// Cohort a job belongs to.
    pub fn cohort_of(&self, job_id: &str) -> Option<&BatchCohort> {
        self.cohort_index(job_id).map(|i| &self.cohorts[i])
    }

    /// Position in `cohorts` of the cohort a job belongs to.
    pub fn cohort_index(&self, job_id: &str) -> Option<usize> {
        self.membership.get(job_id).copied()
    }

    /// Sort anchor of a job inside a cohort.
    pub fn anchor_of(&self, job_id: &str) -> Option<NaiveDate> {
        self.cohort_of(job_id).map(|c| c.anchor)
    }

    /// Number of cohorts.
    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    /// Whether no cohort formed.
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }
}

/// Builds batch cohorts.
#[derive(Debug, Clone)]
pub struct BatchGrouper<'a> {
    config: &'a ShopConfig,
    calendar: Calendar,
}

impl<'a> BatchGrouper<'a> {
    /// Creates a grouper using the standard calendar.
    pub fn new(config: &'a ShopConfig) -> Self {
        Self {
            config,
            calendar: config.calendar_for(Default::default()),
        }
    }

    /// Last due date inside the look-ahead window.
    pub fn horizon(&self, today: NaiveDate) -> NaiveDate {
        self.calendar
            .add_working_days(today, self.config.batching.lookahead_days)
    }

    /// Whether a job may join a cohort.
    pub fn is_eligible(&self, job: &Job, today: NaiveDate) -> bool {
        let Some(due) = job.due_date else {
            return false;
        };
        let (Some(current), Some(cutoff)) = (
            self.config.pipeline_index(job.current_department),
            self.config.pipeline_index(self.config.batching.cutoff),
        ) else {
            return false;
        };
        current <= cutoff && due <= self.horizon(today)
    }

    /// Partitions eligible jobs into cohorts.
    pub fn group(&self, jobs: &[Job], today: NaiveDate) -> BatchPlan {
        let mut buckets: BTreeMap<String, (BatchKey, Vec<(NaiveDate, &str)>)> = BTreeMap::new();
        for job in jobs {
            if !self.is_eligible(job, today) {
                continue;
            }
            let Some(due) = job.due_date else { continue };
            let key = BatchKey::of(job);
            buckets
                .entry(key.label())
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push((due, job.id.as_str()));
        }

        let mut cohorts: Vec<BatchCohort> = buckets
            .into_values()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(key, mut members)| {
                members.sort();
                BatchCohort {
                    key,
                    anchor: members[0].0,
                    members: members.into_iter().map(|(_, id)| id.to_string()).collect(),
                }
            })
            .collect();
        cohorts.sort_by(|a, b| {
            a.anchor
                .cmp(&b.anchor)
                .then_with(|| a.key.label().cmp(&b.key.label()))
        });

        let membership = cohorts
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.members.iter().map(move |id| (id.clone(), i)))
            .collect();

        BatchPlan {
            cohorts,
            membership,
        }
    }
}
