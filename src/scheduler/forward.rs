//! Finite-capacity forward scheduler.
//!
//! # Algorithm
//!
//! 1. Exclude jobs that fail validation (they are returned, not placed).
//! 2. Group early-pipeline jobs into batch cohorts.
//! 3. Sort with the rule engine, then apply manual department ranks.
//! 4. For each job, walk its resolved pipeline. Each department gets a
//!    window of `ceil(points / throughput)` working days, placed at the
//!    preferred start if every week it touches can absorb its share of
//!    the points, otherwise at the first later week that can.
//! 5. Flag jobs whose last window ends after their due date.
//!
//! # Batch Contiguity
//!
//! Once a cohort has been placed, any later job whose first department
//! is the cohort's department starts no earlier than the cohort's last
//! member, so another cohort never lands inside its span. Manual
//! windows and manual ranks override this.
//!
//! # Two-Phase Placement
//!
//! The preferred start is the first working day after the previous
//! department plus the handoff buffer (no buffer for no-gap jobs). The
//! preferred window is validated against the ledger first; only if that
//! fails is the start deferred. No-gap therefore governs adjacency, never
//! capacity.
//!
//! # Complexity
//! O(n * d * h) where n=jobs, d=departments, h=search horizon in weeks.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::ledger::CapacityLedger;
use crate::batching::{BatchGrouper, BatchPlan};
use crate::config::ShopConfig;
use crate::dispatching::{apply_manual_priorities, RuleEngine, SchedulingContext};
use crate::materials;
use crate::models::{Calendar, DateWindow, Department, Job, OvertimeTier, WeekKey};
use crate::pipeline::{PipelineResolver, PipelineStep};
use crate::validation;

/// A department start pushed past its preferred date by capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Delay {
    /// Department.
    pub department: Department,
    /// Start the job would have had with unlimited capacity.
    pub preferred_start: NaiveDate,
    /// Start actually assigned (first date with headroom).
    pub start: NaiveDate,
    /// Working days lost waiting.
    pub delay_days: u32,
    /// Weeks that could not absorb the job's share.
    pub blocked_weeks: Vec<WeekKey>,
}

/// Result of placing one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    /// Job ID.
    pub job_id: String,
    /// Capacity delays, in pipeline order.
    pub delays: Vec<Delay>,
    /// Departments placed regardless of capacity (manual windows or
    /// an exhausted search horizon).
    pub forced: Vec<Department>,
}

impl Placement {
    /// Total working days lost to capacity.
    pub fn total_delay_days(&self) -> u32 {
        self.delays.iter().map(|d| d.delay_days).sum()
    }
}

/// Latest first-department start of each cohort placed so far.
#[derive(Debug, Default)]
struct CohortBarriers {
    starts: BTreeMap<Department, Vec<(usize, NaiveDate)>>,
}

impl CohortBarriers {
    /// Earliest start allowed in `department` for a job of `cohort`
    /// (`None` for a job outside any cohort).
    fn floor(&self, department: Department, cohort: Option<usize>) -> Option<NaiveDate> {
        self.starts
            .get(&department)?
            .iter()
            .filter(|(c, _)| Some(*c) != cohort)
            .map(|(_, start)| *start)
            .max()
    }

    fn record(&mut self, department: Department, cohort: usize, start: NaiveDate) {
        let starts = self.starts.entry(department).or_default();
        match starts.iter_mut().find(|(c, _)| *c == cohort) {
            Some((_, latest)) => *latest = (*latest).max(start),
            None => starts.push((cohort, start)),
        }
    }
}

/// Output of one scheduling run.
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    /// All input jobs, in input order, with schedule fields rewritten.
    pub jobs: Vec<Job>,
    /// Ledger after every placement.
    pub ledger: CapacityLedger,
    /// Placement details, in scheduling order.
    pub placements: Vec<Placement>,
}

/// Greedy finite-capacity forward scheduler.
///
/// # Example
///
/// ```
/// use u_shopfloor::config::ShopConfig;
/// use u_shopfloor::models::{Category, Department, Job};
/// use u_shopfloor::scheduler::ForwardScheduler;
/// use chrono::NaiveDate;
///
/// let config = ShopConfig::default();
/// let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// let jobs = vec![
///     Job::new("J1", Category::FabricatedMetal, 100.0)
///         .in_department(Department::Laser)
///         .with_due_date(NaiveDate::from_ymd_opt(2026, 11, 30).unwrap()),
/// ];
///
/// let run = ForwardScheduler::new(&config).schedule(&jobs, today);
/// assert!(run.jobs[0].schedule.contains_key(&Department::Laser));
/// assert!(!run.jobs[0].scheduling_conflict);
/// ```
#[derive(Debug, Clone)]
pub struct ForwardScheduler<'a> {
    config: &'a ShopConfig,
    calendar: Calendar,
    tier: OvertimeTier,
    rule_engine: RuleEngine,
}

impl<'a> ForwardScheduler<'a> {
    /// Creates a scheduler with standard capacity and the shop-floor
    /// ordering rules. `config` must already be validated.
    pub fn new(config: &'a ShopConfig) -> Self {
        Self {
            config,
            calendar: config.calendar_for(OvertimeTier::None),
            tier: OvertimeTier::None,
            rule_engine: RuleEngine::shop_floor(),
        }
    }

    /// Sets the overtime tier the run's ledger is built with.
    pub fn with_tier(mut self, tier: OvertimeTier) -> Self {
        self.tier = tier;
        self
    }

    /// Replaces the ordering rules.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.rule_engine = engine;
        self
    }

    /// Calendar used for date arithmetic.
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Schedules all jobs into a fresh ledger.
    pub fn schedule(&self, jobs: &[Job], today: NaiveDate) -> ScheduleRun {
        let mut ledger = CapacityLedger::new(self.config, self.tier);
        let reasons = validation::exclusions(jobs, self.config);

        let mut output: Vec<Job> = jobs.to_vec();
        let mut candidates: Vec<usize> = Vec::new();
        for (idx, job) in output.iter_mut().enumerate() {
            job.clear_outputs();
            match &reasons[idx] {
                Some(reason) => {
                    warn!(job = %job.id, reason = %reason, "job excluded from scheduling");
                    job.exclusion_reason = Some(reason.clone());
                }
                None => candidates.push(idx),
            }
        }

        info!(
            jobs = jobs.len(),
            schedulable = candidates.len(),
            tier = %self.tier,
            as_of = %today,
            "scheduling run started"
        );

        let schedulable: Vec<Job> = candidates.iter().map(|&i| output[i].clone()).collect();
        let plan = BatchGrouper::new(self.config).group(&schedulable, today);
        let order = self.order_with_plan(&schedulable, today, &plan);

        let resolver = PipelineResolver::new(self.config);
        let mut barriers = CohortBarriers::default();
        let mut placements = Vec::with_capacity(order.len());
        for local in order {
            let job = &mut output[candidates[local]];
            let cohort = plan.cohort_index(&job.id);
            let first = resolver.resolve(job).first();
            let floor = first.and_then(|d| barriers.floor(d, cohort));

            let placement = self.place_after(job, today, floor, &mut ledger);
            if let (Some(cohort), Some(department)) = (cohort, first) {
                if let Some(window) = job.schedule.get(&department) {
                    barriers.record(department, cohort, window.start);
                }
            }
            placements.push(placement);
        }

        let conflicts = output.iter().filter(|j| j.scheduling_conflict).count();
        info!(
            placed = placements.len(),
            conflicts,
            "scheduling run finished"
        );

        ScheduleRun {
            jobs: output,
            ledger,
            placements,
        }
    }

    /// Scheduling order of `jobs` as indices into the slice.
    pub fn order(&self, jobs: &[Job], today: NaiveDate) -> Vec<usize> {
        let plan = BatchGrouper::new(self.config).group(jobs, today);
        self.order_with_plan(jobs, today, &plan)
    }

    fn order_with_plan(&self, jobs: &[Job], today: NaiveDate, plan: &BatchPlan) -> Vec<usize> {
        let context = SchedulingContext::for_run(today, self.config, plan, jobs);
        let mut order = self.rule_engine.sort_indices(jobs, &context);

        let resolver = PipelineResolver::new(self.config);
        apply_manual_priorities(&mut order, jobs, |job| resolver.resolve(job).first());
        order
    }

    /// Places one job into `ledger`, rewriting its schedule fields.
    ///
    /// A job whose work cannot fit inside the search horizon is left
    /// unplaced with an `exclusion_reason`.
    pub fn place(&self, job: &mut Job, today: NaiveDate, ledger: &mut CapacityLedger) -> Placement {
        self.place_after(job, today, None, ledger)
    }

    /// Like [`place`](Self::place), with the first department starting no
    /// earlier than `floor`.
    fn place_after(
        &self,
        job: &mut Job,
        today: NaiveDate,
        floor: Option<NaiveDate>,
        ledger: &mut CapacityLedger,
    ) -> Placement {
        let pipeline = PipelineResolver::new(self.config).resolve(job);
        let mut placement = Placement {
            job_id: job.id.clone(),
            ..Default::default()
        };

        job.schedule.clear();
        job.sub_stage_schedule.clear();
        job.out_of_sequence.clear();

        if let Some(reason) = validation::exceeds_horizon(job, self.config) {
            warn!(job = %job.id, reason = %reason, "job left unplaced");
            job.exclusion_reason = Some(reason);
            return placement;
        }

        let mut earliest = self
            .calendar
            .next_working_day(materials::earliest_start(job, today));
        if let Some(floor) = floor {
            earliest = earliest.max(floor);
        }
        let mut previous_end: Option<NaiveDate> = None;

        for step in &pipeline.steps {
            let department = step.department;
            let points = self.required_points(job, step);
            let days = self.duration_days(department, points);

            let window = match job.manual_windows.get(&department).copied() {
                Some(window) => {
                    self.force(ledger, &job.id, department, &window, points);
                    placement.forced.push(department);
                    debug!(job = %job.id, department = %department, start = %window.start, end = %window.end, "manual window");
                    if previous_end.is_some_and(|end| window.start <= end) {
                        warn!(job = %job.id, department = %department, start = %window.start, "manual window starts before the previous department finishes");
                        job.out_of_sequence.push(department);
                    }
                    window
                }
                None => {
                    let preferred = self.preferred_start(job, previous_end, earliest, today);
                    self.place_department(job, department, preferred, days, points, ledger, &mut placement)
                }
            };

            if let Some(split) = step.split_days(self.calendar.working_days_between(window.start, window.end)) {
                let mut cursor = window.start;
                for (stage, stage_days) in split {
                    let stage_window = self.calendar.window_from(cursor, stage_days);
                    cursor = self.calendar.add_working_days(stage_window.end, 1);
                    job.sub_stage_schedule.insert(stage, stage_window);
                }
            }

            job.schedule.insert(department, window);
            previous_end = Some(previous_end.map_or(window.end, |end| end.max(window.end)));
        }

        job.scheduling_conflict = match (job.completion_date(), job.due_date) {
            (Some(end), Some(due)) => end > due,
            _ => false,
        };

        placement
    }

    fn place_department(
        &self,
        job: &Job,
        department: Department,
        preferred: NaiveDate,
        days: u32,
        points: f64,
        ledger: &mut CapacityLedger,
        placement: &mut Placement,
    ) -> DateWindow {
        match self.find_slot(ledger, department, preferred, days, points) {
            Ok((window, blocked_weeks)) => {
                for (week, share) in self.shares(&window, points) {
                    if !ledger.allocate(&job.id, department, week, share) {
                        warn!(job = %job.id, department = %department, week = %week, share, "share rejected after slot search, forcing");
                        ledger.allocate_forced(&job.id, department, week, share);
                    }
                }
                if window.start > preferred {
                    let delay_days = self
                        .calendar
                        .working_days_between(preferred, window.start)
                        .saturating_sub(1);
                    debug!(job = %job.id, department = %department, preferred = %preferred, start = %window.start, "deferred by capacity");
                    placement.delays.push(Delay {
                        department,
                        preferred_start: preferred,
                        start: window.start,
                        delay_days,
                        blocked_weeks,
                    });
                } else {
                    debug!(job = %job.id, department = %department, start = %window.start, end = %window.end, "placed at preferred start");
                }
                window
            }
            Err(blocked_weeks) => {
                let window = self.calendar.window_from(preferred, days);
                warn!(
                    job = %job.id,
                    department = %department,
                    horizon_weeks = self.config.search_horizon_weeks,
                    "no headroom within search horizon, placing at preferred start"
                );
                self.force(ledger, &job.id, department, &window, points);
                placement.forced.push(department);
                placement.delays.push(Delay {
                    department,
                    preferred_start: preferred,
                    start: window.start,
                    delay_days: 0,
                    blocked_weeks,
                });
                window
            }
        }
    }

    /// Earliest start for the next department.
    fn preferred_start(
        &self,
        job: &Job,
        previous_end: Option<NaiveDate>,
        earliest: NaiveDate,
        today: NaiveDate,
    ) -> NaiveDate {
        let start = match previous_end {
            None => earliest,
            Some(end) => {
                let gap = if job.no_gap {
                    0
                } else {
                    self.config.handoff_buffer_days
                };
                self.calendar.add_working_days(end, 1 + gap)
            }
        };
        self.calendar.next_working_day(start.max(today))
    }

    /// First window at or after `preferred` whose weekly shares fit.
    ///
    /// `Ok((window, blocked))` on success, `Err(blocked)` if the search
    /// horizon runs out. `blocked` lists weeks that rejected a share.
    fn find_slot(
        &self,
        ledger: &CapacityLedger,
        department: Department,
        preferred: NaiveDate,
        days: u32,
        points: f64,
    ) -> Result<(DateWindow, Vec<WeekKey>), Vec<WeekKey>> {
        let mut blocked: Vec<WeekKey> = Vec::new();
        let mut start = self.calendar.next_working_day(preferred);
        let first_week = WeekKey::of(start);

        for _ in 0..=self.config.search_horizon_weeks {
            let window = self.calendar.window_from(start, days);
            let rejected = self
                .shares(&window, points)
                .into_iter()
                .find(|(week, share)| !ledger.can_fit(department, &[(*week, *share)]))
                .map(|(week, _)| week);

            match rejected {
                None => return Ok((window, blocked)),
                Some(week) => {
                    if !blocked.contains(&week) {
                        blocked.push(week);
                    }
                    start = self
                        .calendar
                        .next_working_day(WeekKey::of(start).next().monday());
                }
            }
        }

        debug!(department = %department, from = %first_week, "search horizon exhausted");
        Err(blocked)
    }

    /// Points per week of `window`, proportional to working days.
    fn shares(&self, window: &DateWindow, points: f64) -> Vec<(WeekKey, f64)> {
        let spans = self.calendar.week_spans(window);
        let total: u32 = spans.iter().map(|(_, d)| d).sum();
        if total == 0 {
            return Vec::new();
        }
        spans
            .into_iter()
            .map(|(week, d)| (week, points * d as f64 / total as f64))
            .collect()
    }

    fn force(
        &self,
        ledger: &mut CapacityLedger,
        job_id: &str,
        department: Department,
        window: &DateWindow,
        points: f64,
    ) {
        for (week, share) in self.shares(window, points) {
            ledger.allocate_forced(job_id, department, week, share);
            let allocated = ledger.allocated(department, week);
            let capacity = ledger.capacity(department, week);
            if allocated > capacity + super::ledger::CAPACITY_EPSILON {
                warn!(
                    job = %job_id,
                    department = %department,
                    week = %week,
                    allocated,
                    capacity,
                    "forced placement overloads week"
                );
            }
        }
    }

    /// Points still required in a department.
    ///
    /// The job's current department is credited with its reported
    /// completion. Welding falls back to station completion.
    pub fn required_points(&self, job: &Job, step: &PipelineStep) -> f64 {
        if step.department != job.current_department {
            return job.points;
        }
        let done = job
            .department_progress
            .get(&step.department)
            .copied()
            .or_else(|| step.station_progress(&job.sub_stage_progress))
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);
        job.points * (1.0 - done / 100.0)
    }

    /// Working days needed for `points` in a department (at least one).
    pub fn duration_days(&self, department: Department, points: f64) -> u32 {
        let throughput = self.config.department(department).daily_throughput;
        let days = (points / throughput - 1e-9).ceil();
        if days.is_finite() && days >= 1.0 {
            days as u32
        } else {
            1
        }
    }
}

/// Job windows keyed by department, shifted to start no earlier than
/// `today` and dropping windows already finished.
pub fn remaining_windows(
    schedule: &BTreeMap<Department, DateWindow>,
    today: NaiveDate,
) -> BTreeMap<Department, DateWindow> {
    schedule
        .iter()
        .filter(|(_, w)| w.end >= today)
        .map(|(d, w)| (*d, DateWindow::new(w.start.max(today), w.end)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, SubStage};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday.
    fn today() -> NaiveDate {
        date(2026, 10, 19)
    }

    fn laser_only() -> ShopConfig {
        let mut config = ShopConfig::default().with_pipeline(vec![Department::Laser]);
        config.batching.cutoff = Department::Laser;
        config
    }

    fn fab(id: &str, points: f64, due: NaiveDate) -> Job {
        Job::new(id, Category::FabricatedMetal, points)
            .in_department(Department::Laser)
            .with_due_date(due)
    }

    #[test]
    fn test_single_department_placement() {
        let config = laser_only();
        let jobs = vec![fab("J1", 300.0, date(2026, 11, 30))];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());

        // 300 / (850/6) = 2.12 → 3 days
        let window = run.jobs[0].schedule[&Department::Laser];
        assert_eq!(window.start, today());
        assert_eq!(window.end, date(2026, 10, 21));
        assert!((run.ledger.allocated(Department::Laser, WeekKey::of(today())) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_pushed_to_next_week_when_full() {
        let config = laser_only();
        let blocker = fab("A", 800.0, date(2026, 11, 30))
            .with_manual_window(Department::Laser, DateWindow::new(today(), date(2026, 10, 24)));
        let jobs = vec![blocker, fab("B", 200.0, date(2026, 11, 30))];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());

        let window = run.jobs[1].schedule[&Department::Laser];
        assert_eq!(window.start, date(2026, 10, 26)); // next Monday
        assert_eq!(window.end, date(2026, 10, 27)); // 2 days, not truncated

        let placement = run.placements.iter().find(|p| p.job_id == "B").unwrap();
        assert_eq!(placement.delays.len(), 1);
        assert_eq!(placement.delays[0].blocked_weeks, vec![WeekKey::of(today())]);
    }

    #[test]
    fn test_pipeline_windows_chain_with_buffer() {
        let config = ShopConfig::default()
            .with_pipeline(vec![Department::Laser, Department::Welding]);
        let jobs = vec![Job::new("J1", Category::Specialty, 100.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 30))];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        let job = &run.jobs[0];

        assert_eq!(job.schedule[&Department::Laser], DateWindow::day(today()));
        // one idle day (Tue), welding Wed
        assert_eq!(job.schedule[&Department::Welding], DateWindow::day(date(2026, 10, 21)));
    }

    #[test]
    fn test_no_gap_packs_departments() {
        let config = ShopConfig::default()
            .with_pipeline(vec![Department::Laser, Department::Welding]);
        let jobs = vec![Job::new("J1", Category::Specialty, 100.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 30))
            .with_no_gap()];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        assert_eq!(
            run.jobs[0].schedule[&Department::Welding],
            DateWindow::day(date(2026, 10, 20))
        );
    }

    #[test]
    fn test_no_gap_still_respects_capacity() {
        let config = ShopConfig::default()
            .with_pipeline(vec![Department::Laser, Department::Welding]);
        let welding_full = Job::new("W", Category::Specialty, 850.0)
            .in_department(Department::Welding)
            .with_due_date(date(2026, 10, 30))
            .with_manual_window(Department::Welding, DateWindow::new(today(), date(2026, 10, 24)));
        let packed = Job::new("P", Category::Specialty, 100.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 30))
            .with_no_gap();
        let run = ForwardScheduler::new(&config).schedule(&[welding_full, packed], today());

        assert_eq!(
            run.jobs[1].schedule[&Department::Welding].start,
            date(2026, 10, 26)
        );
    }

    #[test]
    fn test_conflict_flag() {
        let config = laser_only();
        // 1000 points → 8 days, ends Tue 10-27
        let jobs = vec![
            fab("late", 1000.0, date(2026, 10, 23)),
            fab("exact", 100.0, date(2026, 10, 19)),
        ];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());

        let late = &run.jobs[0];
        assert!(late.scheduling_conflict);
        assert!(late.completion_date().unwrap() > late.due_date.unwrap());
        assert!(late.is_scheduled()); // still placed
    }

    #[test]
    fn test_end_on_due_date_is_not_a_conflict() {
        let config = laser_only();
        let jobs = vec![fab("J1", 100.0, today())];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        assert!(!run.jobs[0].scheduling_conflict);
    }

    #[test]
    fn test_category_precedence_order() {
        let config = laser_only();
        let fab_job = fab("F", 850.0, date(2026, 10, 24));
        let doors = Job::new("D", Category::DoorAssembly, 850.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 11, 30));
        let run = ForwardScheduler::new(&config).schedule(&[fab_job, doors], today());

        assert_eq!(run.jobs[1].schedule[&Department::Laser].start, today());
        assert_eq!(run.jobs[0].schedule[&Department::Laser].start, date(2026, 10, 26));
    }

    #[test]
    fn test_cohort_sorts_by_anchor_not_own_due_date() {
        let config = ShopConfig::default()
            .with_pipeline(vec![Department::Laser, Department::PressBrake]);
        let jobs = vec![
            Job::new("solo", Category::FabricatedMetal, 100.0)
                .in_department(Department::PressBrake)
                .with_due_date(date(2026, 10, 24)),
            fab("member_late", 100.0, date(2026, 10, 28)),
            fab("member_early", 100.0, date(2026, 10, 23)),
        ];
        let scheduler = ForwardScheduler::new(&config);

        // FAB/Laser cohort anchored 10-23 sorts ahead of the solo job due 10-24
        let order = scheduler.order(&jobs, today());
        let ids: Vec<&str> = order.iter().map(|&i| jobs[i].id.as_str()).collect();
        assert_eq!(ids, vec!["member_early", "member_late", "solo"]);

        let run = scheduler.schedule(&jobs, today());
        let early = run.jobs[2].schedule[&Department::Laser];
        let late = run.jobs[1].schedule[&Department::Laser];
        assert_eq!(early.start, today());
        assert_eq!(late.start, today());
    }

    #[test]
    fn test_next_cohort_waits_for_previous_cohort_span() {
        let config = laser_only();
        let due = date(2026, 10, 30);
        let spec = |id: &str| {
            Job::new(id, Category::Specialty, 300.0)
                .in_department(Department::Laser)
                .with_due_date(due)
        };
        let jobs = vec![fab("A1", 500.0, due), fab("A2", 500.0, due), spec("B1"), spec("B2")];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        let start = |i: usize| run.jobs[i].schedule[&Department::Laser].start;

        // A2 does not fit after A1 this week and moves to the next one
        assert_eq!(start(0), today());
        assert_eq!(start(1), date(2026, 10, 26));

        // B1 would fit this week but must not land inside A's span
        assert_eq!(start(2), date(2026, 10, 26));
        assert_eq!(start(3), date(2026, 11, 2));
        assert!((run.ledger.allocated(Department::Laser, WeekKey::of(today())) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_solo_job_after_cohort_waits_for_span() {
        let config = laser_only();
        let due = date(2026, 10, 30);
        let late_solo = Job::new("S", Category::Specialty, 100.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 12, 31));
        let jobs = vec![fab("A1", 500.0, due), fab("A2", 500.0, due), late_solo];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        assert_eq!(run.jobs[2].schedule[&Department::Laser].start, date(2026, 10, 26));
    }

    #[test]
    fn test_manual_priority_takes_first_slot() {
        let config = laser_only();
        let jobs = vec![
            fab("A", 850.0, date(2026, 10, 22)),
            fab("B", 850.0, date(2026, 11, 20)).with_manual_priority(Department::Laser, 1),
        ];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());
        assert_eq!(run.jobs[1].schedule[&Department::Laser].start, today());
        assert_eq!(run.jobs[0].schedule[&Department::Laser].start, date(2026, 10, 26));
    }

    #[test]
    fn test_excluded_job_returned_unplaced() {
        let config = laser_only();
        let undated = Job::new("U", Category::FabricatedMetal, 100.0).in_department(Department::Laser);
        let run = ForwardScheduler::new(&config).schedule(&[undated], today());

        assert_eq!(run.jobs.len(), 1);
        assert!(!run.jobs[0].is_scheduled());
        assert!(run.jobs[0].exclusion_reason.is_some());
        assert!(run.ledger.cells().is_empty());
    }

    #[test]
    fn test_never_backdated() {
        let config = laser_only();
        let job = fab("J1", 100.0, date(2026, 11, 30)).with_ready_date(date(2026, 10, 1));
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        assert_eq!(run.jobs[0].schedule[&Department::Laser].start, today());
    }

    #[test]
    fn test_ready_date_delays_start() {
        let config = laser_only();
        let job = fab("J1", 100.0, date(2026, 11, 30)).with_ready_date(date(2026, 10, 25)); // Sunday
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        assert_eq!(run.jobs[0].schedule[&Department::Laser].start, date(2026, 10, 26));
    }

    #[test]
    fn test_partial_completion_shortens_current_department() {
        let config = laser_only();
        let job = fab("J1", 850.0, date(2026, 11, 30)).with_progress(Department::Laser, 50.0);
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        let window = run.jobs[0].schedule[&Department::Laser];
        assert_eq!(window.end, date(2026, 10, 21)); // 425 points → 3 days
    }

    #[test]
    fn test_door_welding_sub_stages() {
        let config = ShopConfig::default();
        let job = Job::new("D1", Category::DoorAssembly, 1700.0)
            .with_quantity(10)
            .in_department(Department::Welding)
            .with_due_date(date(2026, 12, 31));
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        let job = &run.jobs[0];

        let welding = job.schedule[&Department::Welding];
        let stages: Vec<SubStage> = job.sub_stage_schedule.keys().copied().collect();
        assert_eq!(stages, vec![SubStage::Press, SubStage::Robot, SubStage::FullWeld]);
        assert_eq!(job.sub_stage_schedule[&SubStage::Press].start, welding.start);
        assert_eq!(job.sub_stage_schedule[&SubStage::FullWeld].end, welding.end);
    }

    #[test]
    fn test_idempotent() {
        let config = ShopConfig::default();
        let jobs = vec![
            Job::new("A", Category::DoorAssembly, 400.0)
                .in_department(Department::Laser)
                .with_due_date(date(2026, 11, 6)),
            Job::new("B", Category::FabricatedMetal, 900.0)
                .in_department(Department::Engineering)
                .with_due_date(date(2026, 11, 2)),
            Job::new("C", Category::Specialty, 120.0)
                .in_department(Department::Welding)
                .with_due_date(date(2026, 10, 28)),
        ];
        let scheduler = ForwardScheduler::new(&config);
        let first = scheduler.schedule(&jobs, today());
        let second = scheduler.schedule(&jobs, today());
        assert_eq!(first.jobs, second.jobs);

        let again = scheduler.schedule(&first.jobs, today());
        assert_eq!(first.jobs, again.jobs);
    }

    #[test]
    fn test_manual_window_forced() {
        let config = laser_only();
        let job = fab("M", 2000.0, date(2026, 11, 30))
            .with_manual_window(Department::Laser, DateWindow::new(today(), date(2026, 10, 20)));
        let run = ForwardScheduler::new(&config).schedule(&[job], today());

        assert_eq!(
            run.jobs[0].schedule[&Department::Laser],
            DateWindow::new(today(), date(2026, 10, 20))
        );
        let week = WeekKey::of(today());
        assert!(run.ledger.allocated(Department::Laser, week) > run.ledger.capacity(Department::Laser, week));
        assert_eq!(run.placements[0].forced, vec![Department::Laser]);
    }

    #[test]
    fn test_manual_window_before_previous_end_is_flagged() {
        let config = ShopConfig::default().with_pipeline(vec![
            Department::Laser,
            Department::Welding,
            Department::Polish,
        ]);
        let job = Job::new("M", Category::Specialty, 850.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 12, 31))
            .with_manual_window(Department::Welding, DateWindow::day(today()));
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        let job = &run.jobs[0];

        let laser = job.schedule[&Department::Laser];
        assert_eq!(laser, DateWindow::new(today(), date(2026, 10, 24)));
        assert_eq!(job.schedule[&Department::Welding], DateWindow::day(today()));
        assert_eq!(job.out_of_sequence, vec![Department::Welding]);

        // polish still follows the latest finished department
        assert!(job.schedule[&Department::Polish].start > laser.end);
        assert_eq!(job.schedule[&Department::Polish].start, date(2026, 10, 27));
    }

    #[test]
    fn test_manual_window_after_previous_end_not_flagged() {
        let config = ShopConfig::default()
            .with_pipeline(vec![Department::Laser, Department::Welding]);
        let job = Job::new("M", Category::Specialty, 100.0)
            .in_department(Department::Laser)
            .with_due_date(date(2026, 12, 31))
            .with_manual_window(Department::Welding, DateWindow::day(date(2026, 10, 22)));
        let run = ForwardScheduler::new(&config).schedule(&[job], today());
        assert!(run.jobs[0].out_of_sequence.is_empty());
    }

    #[test]
    fn test_work_beyond_horizon_left_unplaced() {
        let config = laser_only();
        let jobs = vec![fab("huge", 1.0e11, date(2026, 11, 30)), fab("J1", 100.0, date(2026, 11, 30))];
        let run = ForwardScheduler::new(&config).schedule(&jobs, today());

        assert!(!run.jobs[0].is_scheduled());
        assert!(run.jobs[0].exclusion_reason.as_deref().unwrap().contains("search horizon"));
        assert_eq!(run.jobs[1].schedule[&Department::Laser].start, today());
        assert!(run.ledger.allocations_for_job("huge").next().is_none());

        // placed directly, as quotes are
        let mut ledger = CapacityLedger::new(&config, OvertimeTier::None);
        let mut huge = fab("quote", 1.0e11, date(2026, 11, 30));
        let placement = ForwardScheduler::new(&config).place(&mut huge, today(), &mut ledger);
        assert!(placement.delays.is_empty());
        assert!(!huge.is_scheduled());
        assert!(huge.exclusion_reason.is_some());
    }

    #[test]
    fn test_duration_days() {
        let config = ShopConfig::default();
        let scheduler = ForwardScheduler::new(&config);
        assert_eq!(scheduler.duration_days(Department::Laser, 850.0), 6);
        assert_eq!(scheduler.duration_days(Department::Laser, 1.0), 1);
        assert_eq!(scheduler.duration_days(Department::Laser, 0.0), 1);
    }

    #[test]
    fn test_remaining_windows() {
        let mut schedule = BTreeMap::new();
        schedule.insert(Department::Laser, DateWindow::new(date(2026, 10, 12), date(2026, 10, 16)));
        schedule.insert(Department::Welding, DateWindow::new(date(2026, 10, 17), date(2026, 10, 22)));
        schedule.insert(Department::Polish, DateWindow::new(date(2026, 10, 23), date(2026, 10, 24)));

        let remaining = remaining_windows(&schedule, today());
        assert!(!remaining.contains_key(&Department::Laser));
        assert_eq!(remaining[&Department::Welding].start, today());
        assert_eq!(remaining[&Department::Polish].start, date(2026, 10, 23));
    }
}
