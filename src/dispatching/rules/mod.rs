//! Built-in dispatching rules.
//!
//! # Rules
//!
//! - **Category**: fixed category precedence
//! - **Anchor**: cohort anchor date, else own due date
//! - **BatchKey**: lexical order of `(category, department)` keys
//! - **EDD**: own due date
//!
//! # Score Convention
//! All rules return lower scores for jobs that should go first.

use chrono::{Datelike, NaiveDate};

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::batching::BatchKey;
use crate::models::Job;

fn date_score(date: Option<NaiveDate>) -> RuleScore {
    date.map(|d| d.num_days_from_ce() as f64)
        .unwrap_or(f64::MAX)
}

/// Category precedence.
///
/// Jobs of a category missing from the precedence list go last.
#[derive(Debug, Clone, Copy)]
pub struct CategoryPrecedence;

impl DispatchingRule for CategoryPrecedence {
    fn name(&self) -> &'static str {
        "CATEGORY"
    }

    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore {
        context
            .category_ranks
            .get(&job.category)
            .map(|r| *r as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Category Precedence"
    }
}

/// Batch anchor date.
///
/// Members of a cohort score by the cohort's earliest due date, so the
/// cohort sorts as one block. Everyone else scores by own due date.
#[derive(Debug, Clone, Copy)]
pub struct BatchAnchor;

impl DispatchingRule for BatchAnchor {
    fn name(&self) -> &'static str {
        "ANCHOR"
    }

    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore {
        date_score(context.sort_date(job))
    }

    fn description(&self) -> &'static str {
        "Batch Anchor Date"
    }
}

/// Lexical batch key order.
#[derive(Debug, Clone, Copy)]
pub struct BatchKeyOrder;

impl DispatchingRule for BatchKeyOrder {
    fn name(&self) -> &'static str {
        "BATCH_KEY"
    }

    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore {
        context
            .key_ranks
            .get(&BatchKey::of(job).label())
            .map(|r| *r as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Batch Key Order"
    }
}

/// Earliest Due Date.
///
/// Jobs without a due date go last.
///
/// # Reference
/// Jackson (1955), optimal for minimizing maximum lateness on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Edd;

impl DispatchingRule for Edd {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, job: &Job, _context: &SchedulingContext) -> RuleScore {
        date_score(job.due_date)
    }

    fn description(&self) -> &'static str {
        "Earliest Due Date"
    }
}
