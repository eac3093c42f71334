//! Dispatching rules and rule engine for job ordering.
//!
//! The forward scheduler places jobs greedily, so the order it visits
//! them in *is* the priority policy. Ordering is a lexicographic chain
//! of rules plus a manual per-department override.
//!
//! # Usage
//!
//! ```
//! use u_shopfloor::dispatching::{RuleEngine, SchedulingContext};
//! use chrono::NaiveDate;
//!
//! let engine = RuleEngine::shop_floor();
//! let context = SchedulingContext::at_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
//! assert!(engine.sort_indices(&[], &context).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
mod priority;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{RuleEngine, TieBreaker};
pub use priority::apply_manual_priorities;

use crate::models::Job;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = scheduled first.
pub type RuleScore = f64;

/// A dispatching rule that scores a job.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "EDD").
    fn name(&self) -> &'static str;

    /// Scores a job given the run context.
    fn evaluate(&self, job: &Job, context: &SchedulingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
