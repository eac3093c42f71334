//! Scheduling context for dispatching rule evaluation.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use crate::batching::{BatchKey, BatchPlan};
use crate::config::ShopConfig;
use crate::models::{Category, Job};

/// Run-wide state passed to dispatching rules.
///
/// Holds the run date, category precedence, batch anchors and the
/// lexical rank of every batch key seen in the run.
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    /// Run date.
    pub today: NaiveDate,
    /// Category → precedence rank (lower goes first).
    pub category_ranks: HashMap<Category, usize>,
    /// Job ID → cohort anchor date, for members of a cohort.
    pub anchors: HashMap<String, NaiveDate>,
    /// Batch key label → lexical rank.
    pub key_ranks: HashMap<String, usize>,
}

impl SchedulingContext {
    /// Creates an empty context at the given date.
    pub fn at_date(today: NaiveDate) -> Self {
        Self {
            today,
            category_ranks: HashMap::new(),
            anchors: HashMap::new(),
            key_ranks: HashMap::new(),
        }
    }

    /// Builds the context for one run.
    pub fn for_run(today: NaiveDate, config: &ShopConfig, plan: &BatchPlan, jobs: &[Job]) -> Self {
        let labels: BTreeSet<String> = jobs.iter().map(|j| BatchKey::of(j).label()).collect();
        let mut ctx = Self::at_date(today);
        ctx.category_ranks = Category::ALL
            .iter()
            .map(|cat| (*cat, config.category_rank(*cat)))
            .collect();
        ctx.key_ranks = labels
            .into_iter()
            .enumerate()
            .map(|(rank, label)| (label, rank))
            .collect();
        ctx.anchors = jobs
            .iter()
            .filter_map(|j| plan.anchor_of(&j.id).map(|a| (j.id.clone(), a)))
            .collect();
        ctx
    }

    /// Sets a category rank.
    pub fn with_category_rank(mut self, category: Category, rank: usize) -> Self {
        self.category_ranks.insert(category, rank);
        self
    }

    /// Sets a cohort anchor for a job.
    pub fn with_anchor(mut self, job_id: impl Into<String>, anchor: NaiveDate) -> Self {
        self.anchors.insert(job_id.into(), anchor);
        self
    }

    /// Sets the rank of a batch key label.
    pub fn with_key_rank(mut self, label: impl Into<String>, rank: usize) -> Self {
        self.key_ranks.insert(label.into(), rank);
        self
    }

    /// Date a job is sorted by: cohort anchor, else own due date.
    pub fn sort_date(&self, job: &Job) -> Option<NaiveDate> {
        self.anchors.get(&job.id).copied().or(job.due_date)
    }
}
