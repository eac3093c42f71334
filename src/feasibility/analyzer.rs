//! Three-tier feasibility analysis.
//!
//! # Tiers
//!
//! 1. **As-is**: existing work keeps its capacity; the quote is placed
//!    after every existing job.
//! 2. **With moves**: allocations of existing jobs due strictly after the
//!    target are released from the cells the quote waited on, then the
//!    quote is placed again. Repeats while new blocked cells appear.
//! 3. **With overtime**: the as-is ledger is re-evaluated under each
//!    overtime tier, cheapest first, until the quote fits.
//!
//! Tiers 2 and 3 are only evaluated when tier 1 misses the target. The
//! recommendation is the cheapest tier that achieves it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::quote::{QuoteInput, QUOTE_JOB_ID};
use crate::config::ShopConfig;
use crate::models::{DateWindow, Department, Job, OvertimeTier, SubStage, WeekKey};
use crate::scheduler::{CapacityLedger, ForwardScheduler, Placement, CAPACITY_EPSILON};

/// A department that delayed the quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// Department.
    pub department: Department,
    /// Working days lost waiting for capacity.
    pub delay_days: u32,
    /// First date the department had room.
    pub first_available: NaiveDate,
}

/// Tier 1 outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsIsTier {
    /// Whether the target is met.
    pub achievable: bool,
    /// Last scheduled day of the quote.
    pub projected_completion: Option<NaiveDate>,
    /// Departments that pushed the quote back.
    pub bottlenecks: Vec<Bottleneck>,
}

/// Tier 2 outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovesTier {
    /// Whether the target is met.
    pub achievable: bool,
    /// Last scheduled day of the quote.
    pub projected_completion: Option<NaiveDate>,
    /// Existing jobs whose allocations were deferred.
    pub moved_jobs: Vec<String>,
    /// Points released.
    pub points_freed: f64,
}

/// A cell loaded beyond standard capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeCell {
    /// Department.
    pub department: Department,
    /// Week.
    pub week: WeekKey,
    /// Points above standard capacity.
    pub overtime_points: f64,
}

/// Tier 3 outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeTierResult {
    /// Whether any overtime tier meets the target.
    pub achievable: bool,
    /// Cheapest tier that meets the target.
    pub minimal_tier: Option<OvertimeTier>,
    /// Last scheduled day of the quote under the last tier tried.
    pub projected_completion: Option<NaiveDate>,
    /// Cells the quote pushes past standard capacity.
    pub overtime_cells: Vec<OvertimeCell>,
}

/// Overall decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    AcceptAsIs,
    AcceptWithMoves,
    AcceptWithOvertime,
    Reject,
}

/// Result of a feasibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityResult {
    /// Estimated points per department.
    pub total_points: f64,
    /// As-is evaluation.
    pub as_is: AsIsTier,
    /// Evaluation with moves, if tier 1 missed.
    pub with_moves: Option<MovesTier>,
    /// Evaluation with overtime, if tier 1 missed.
    pub with_overtime: Option<OvertimeTierResult>,
    /// Cheapest feasible option.
    pub recommendation: Recommendation,
    /// Human-readable justification.
    pub explanation: String,
}

/// Schedule estimate for a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteEstimate {
    /// Estimated points per department.
    pub total_points: f64,
    /// Needed over available working days, 0-100.
    pub urgency: f64,
    /// Department windows of the quote.
    pub timeline: BTreeMap<Department, DateWindow>,
    /// Welding station windows, if split.
    pub sub_stage_timeline: BTreeMap<SubStage, DateWindow>,
    /// Last scheduled day.
    pub projected_completion: Option<NaiveDate>,
    /// Whether the projected completion misses the target.
    pub conflict: bool,
}

/// Re-runs the forward scheduler with a hypothetical job appended.
#[derive(Debug, Clone)]
pub struct FeasibilityAnalyzer<'a> {
    config: &'a ShopConfig,
    scheduler: ForwardScheduler<'a>,
    today: NaiveDate,
}

/// Existing work placed at standard capacity.
struct Baseline {
    ledger: CapacityLedger,
    due_dates: HashMap<String, Option<NaiveDate>>,
}

impl<'a> FeasibilityAnalyzer<'a> {
    /// Creates an analyzer for runs as of `today`. `config` must already
    /// be validated.
    pub fn new(config: &'a ShopConfig, today: NaiveDate) -> Self {
        Self {
            config,
            scheduler: ForwardScheduler::new(config),
            today,
        }
    }

    fn baseline(&self, existing: &[Job]) -> Baseline {
        let run = self.scheduler.schedule(existing, self.today);
        let due_dates = run
            .jobs
            .iter()
            .map(|j| (j.id.clone(), j.due_date))
            .collect();
        Baseline {
            ledger: run.ledger,
            due_dates,
        }
    }

    fn place_quote(&self, quote: &Job, ledger: &mut CapacityLedger) -> (Job, Placement) {
        let mut job = quote.clone();
        let placement = self.scheduler.place(&mut job, self.today, ledger);
        (job, placement)
    }

    fn meets(job: &Job, target: Option<NaiveDate>) -> bool {
        match (job.completion_date(), target) {
            (_, None) => true,
            (Some(end), Some(target)) => end <= target,
            (None, Some(_)) => false,
        }
    }

    /// Schedules the quote after existing work at standard capacity.
    pub fn estimate(&self, input: &QuoteInput, existing: &[Job]) -> QuoteEstimate {
        let quote = input.to_job(self.config);
        let mut baseline = self.baseline(existing);
        let (job, _) = self.place_quote(&quote, &mut baseline.ledger);

        let calendar = self.scheduler.calendar();
        let needed: u32 = job
            .schedule
            .values()
            .map(|w| calendar.working_days_between(w.start, w.end))
            .sum();
        let start = calendar.next_working_day(input.ready_date.unwrap_or(self.today).max(self.today));
        let deadline = input.mode.target().or(job.completion_date());
        let available = deadline
            .map(|d| calendar.working_days_between(start, d))
            .unwrap_or(0);
        let urgency = if available == 0 {
            100.0
        } else {
            (needed as f64 / available as f64 * 100.0).clamp(0.0, 100.0)
        };

        QuoteEstimate {
            total_points: quote.points,
            urgency,
            projected_completion: job.completion_date(),
            conflict: job.scheduling_conflict,
            timeline: job.schedule,
            sub_stage_timeline: job.sub_stage_schedule,
        }
    }

    /// Runs the three-tier analysis.
    pub fn analyze(&self, input: &QuoteInput, existing: &[Job]) -> FeasibilityResult {
        let quote = input.to_job(self.config);
        let target = input.mode.target();
        let baseline = self.baseline(existing);

        let mut ledger = baseline.ledger.clone();
        let (job, placement) = self.place_quote(&quote, &mut ledger);
        let as_is = AsIsTier {
            achievable: job.exclusion_reason.is_none() && Self::meets(&job, target),
            projected_completion: job.completion_date(),
            bottlenecks: placement
                .delays
                .iter()
                .map(|d| Bottleneck {
                    department: d.department,
                    delay_days: d.delay_days,
                    first_available: d.start,
                })
                .collect(),
        };
        info!(
            points = quote.points,
            achievable = as_is.achievable,
            bottlenecks = as_is.bottlenecks.len(),
            "feasibility tier 1 evaluated"
        );

        if let Some(reason) = job.exclusion_reason {
            return FeasibilityResult {
                total_points: quote.points,
                as_is,
                with_moves: None,
                with_overtime: None,
                recommendation: Recommendation::Reject,
                explanation: reason,
            };
        }

        let (with_moves, with_overtime) = match target {
            Some(target) if !as_is.achievable => (
                Some(self.with_moves(&quote, &baseline, &placement, target)),
                Some(self.with_overtime(&quote, &baseline, target)),
            ),
            _ => (None, None),
        };

        let (recommendation, explanation) =
            Self::recommend(&as_is, with_moves.as_ref(), with_overtime.as_ref(), target);

        FeasibilityResult {
            total_points: quote.points,
            as_is,
            with_moves,
            with_overtime,
            recommendation,
            explanation,
        }
    }

    fn with_moves(
        &self,
        quote: &Job,
        baseline: &Baseline,
        first: &Placement,
        target: NaiveDate,
    ) -> MovesTier {
        let movable = |id: &str| {
            id != QUOTE_JOB_ID
                && matches!(baseline.due_dates.get(id), Some(Some(due)) if *due > target)
        };

        let mut ledger = baseline.ledger.clone();
        let mut moved_jobs: Vec<String> = Vec::new();
        let mut points_freed = 0.0;
        let mut released: Vec<(Department, WeekKey)> = Vec::new();
        let mut placement = first.clone();

        loop {
            let cells: Vec<(Department, WeekKey)> = placement
                .delays
                .iter()
                .flat_map(|d| d.blocked_weeks.iter().map(move |w| (d.department, *w)))
                .filter(|cell| !released.contains(cell))
                .collect();

            let mut freed_now = 0.0;
            for (department, week) in cells {
                released.push((department, week));
                let (jobs, freed) = ledger.release_where(department, week, movable);
                freed_now += freed;
                for id in jobs {
                    if !moved_jobs.contains(&id) {
                        moved_jobs.push(id);
                    }
                }
            }
            points_freed += freed_now;

            let mut trial = ledger.clone();
            let (job, next) = self.place_quote(quote, &mut trial);
            let achievable = Self::meets(&job, Some(target));
            if achievable || freed_now <= CAPACITY_EPSILON {
                debug!(moved = moved_jobs.len(), points_freed, achievable, "feasibility tier 2 evaluated");
                return MovesTier {
                    achievable,
                    projected_completion: job.completion_date(),
                    moved_jobs,
                    points_freed,
                };
            }
            placement = next;
        }
    }

    fn with_overtime(&self, quote: &Job, baseline: &Baseline, target: NaiveDate) -> OvertimeTierResult {
        let mut last = OvertimeTierResult {
            achievable: false,
            minimal_tier: None,
            projected_completion: None,
            overtime_cells: Vec::new(),
        };

        for tier in OvertimeTier::ESCALATION {
            let mut ledger = baseline.ledger.with_tier(self.config, tier);
            let (job, _) = self.place_quote(quote, &mut ledger);
            let achievable = Self::meets(&job, Some(target));

            let mut overtime_cells: Vec<OvertimeCell> = Vec::new();
            for alloc in ledger.allocations_for_job(QUOTE_JOB_ID) {
                let over = ledger.allocated(alloc.department, alloc.week)
                    - ledger.base_capacity(alloc.department, alloc.week);
                let seen = overtime_cells
                    .iter()
                    .any(|c| c.department == alloc.department && c.week == alloc.week);
                if over > CAPACITY_EPSILON && !seen {
                    overtime_cells.push(OvertimeCell {
                        department: alloc.department,
                        week: alloc.week,
                        overtime_points: over,
                    });
                }
            }

            debug!(tier = %tier, achievable, cells = overtime_cells.len(), "feasibility tier 3 evaluated");
            last = OvertimeTierResult {
                achievable,
                minimal_tier: achievable.then_some(tier),
                projected_completion: job.completion_date(),
                overtime_cells,
            };
            if achievable {
                break;
            }
        }
        last
    }

    fn recommend(
        as_is: &AsIsTier,
        moves: Option<&MovesTier>,
        overtime: Option<&OvertimeTierResult>,
        target: Option<NaiveDate>,
    ) -> (Recommendation, String) {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());

        if as_is.achievable {
            return (
                Recommendation::AcceptAsIs,
                format!(
                    "Fits current capacity, projected completion {}",
                    date(as_is.projected_completion)
                ),
            );
        }
        if let Some(m) = moves.filter(|m| m.achievable) {
            return (
                Recommendation::AcceptWithMoves,
                format!(
                    "Deferring {} later-due job(s) frees {:.0} points, projected completion {}",
                    m.moved_jobs.len(),
                    m.points_freed,
                    date(m.projected_completion)
                ),
            );
        }
        if let Some(o) = overtime.filter(|o| o.achievable) {
            let tier = o.minimal_tier.map(|t| t.to_string()).unwrap_or_default();
            return (
                Recommendation::AcceptWithOvertime,
                format!(
                    "Needs {} overtime in {} department-week(s), projected completion {}",
                    tier,
                    o.overtime_cells.len(),
                    date(o.projected_completion)
                ),
            );
        }

        let best = overtime
            .and_then(|o| o.projected_completion)
            .or(as_is.projected_completion);
        (
            Recommendation::Reject,
            format!(
                "Target {} not reachable, earliest completion {} even with maximum overtime",
                date(target),
                date(best)
            ),
        )
    }
}
