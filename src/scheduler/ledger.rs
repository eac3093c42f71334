//! Per-department weekly capacity ledger.
//!
//! # Capacity Model
//!
//! Each (department, week) cell has a point budget:
//!
//! ```text
//! regular  = weekly_capacity * working_days(week) / nominal_days
//! capacity = regular * (1 + overtime factor) + rest_day_worked * daily_throughput
//! ```
//!
//! Holiday weeks therefore offer proportionally less. A ledger lives for
//! one scheduling run and is never shared between runs.

use std::collections::BTreeMap;

use crate::config::{DepartmentConfig, OvertimeAllowance, ShopConfig};
use crate::models::{Calendar, Department, OvertimeTier, WeekKey};

/// Tolerance for floating-point capacity comparisons.
pub const CAPACITY_EPSILON: f64 = 1e-6;

/// One job's share of one capacity cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Job holding the points.
    pub job_id: String,
    /// Department.
    pub department: Department,
    /// Week.
    pub week: WeekKey,
    /// Points held.
    pub points: f64,
}

/// Capacity cell summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLoad {
    /// Department.
    pub department: Department,
    /// Week.
    pub week: WeekKey,
    /// Points allocated.
    pub allocated: f64,
    /// Capacity under the ledger's tier.
    pub capacity: f64,
    /// Capacity without overtime.
    pub base_capacity: f64,
}

/// Weekly point budget per department.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    tier: OvertimeTier,
    allowance: OvertimeAllowance,
    calendar: Calendar,
    departments: BTreeMap<Department, DepartmentConfig>,
    allocated: BTreeMap<(Department, WeekKey), f64>,
    entries: Vec<Allocation>,
}

impl CapacityLedger {
    /// Creates an empty ledger for a tier.
    pub fn new(config: &ShopConfig, tier: OvertimeTier) -> Self {
        Self {
            tier,
            allowance: config.overtime_allowance(tier),
            calendar: config.calendar_for(tier),
            departments: config
                .pipeline
                .iter()
                .map(|d| (*d, config.department(*d)))
                .collect(),
            allocated: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    /// Same allocations, re-evaluated under another tier.
    pub fn with_tier(&self, config: &ShopConfig, tier: OvertimeTier) -> Self {
        Self {
            tier,
            allowance: config.overtime_allowance(tier),
            calendar: config.calendar_for(tier),
            ..self.clone()
        }
    }

    /// Active overtime tier.
    pub fn tier(&self) -> OvertimeTier {
        self.tier
    }

    /// Calendar used for capacity lookups.
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Standard capacity of a cell, ignoring overtime.
    pub fn base_capacity(&self, department: Department, week: WeekKey) -> f64 {
        let Some(dept) = self.departments.get(&department) else {
            return 0.0;
        };
        let days = self.calendar.working_days_in_week(week) as f64;
        dept.weekly_capacity * days / self.calendar.nominal_days_per_week() as f64
    }

    /// Capacity of a cell under the active tier.
    pub fn capacity(&self, department: Department, week: WeekKey) -> f64 {
        let Some(dept) = self.departments.get(&department) else {
            return 0.0;
        };
        let regular = self.base_capacity(department, week) * (1.0 + self.allowance.capacity_factor);
        let extra_days = self
            .calendar
            .capacity_days_in_week(week)
            .saturating_sub(self.calendar.working_days_in_week(week));
        regular + extra_days as f64 * dept.daily_throughput
    }

    /// Points already allocated in a cell.
    pub fn allocated(&self, department: Department, week: WeekKey) -> f64 {
        self.allocated
            .get(&(department, week))
            .copied()
            .unwrap_or(0.0)
    }

    /// Points still available in a cell (never negative).
    pub fn headroom(&self, department: Department, week: WeekKey) -> f64 {
        (self.capacity(department, week) - self.allocated(department, week)).max(0.0)
    }

    /// Whether every `(week, points)` share fits.
    pub fn can_fit(&self, department: Department, shares: &[(WeekKey, f64)]) -> bool {
        shares
            .iter()
            .all(|(week, points)| *points <= self.headroom(department, *week) + CAPACITY_EPSILON)
    }

    /// Records an allocation if it fits. Returns `false` otherwise.
    pub fn allocate(
        &mut self,
        job_id: &str,
        department: Department,
        week: WeekKey,
        points: f64,
    ) -> bool {
        if points > self.headroom(department, week) + CAPACITY_EPSILON {
            return false;
        }
        self.allocate_forced(job_id, department, week, points);
        true
    }

    /// Records an allocation regardless of capacity (manual windows).
    pub fn allocate_forced(
        &mut self,
        job_id: &str,
        department: Department,
        week: WeekKey,
        points: f64,
    ) {
        if points <= 0.0 {
            return;
        }
        *self.allocated.entry((department, week)).or_insert(0.0) += points;
        self.entries.push(Allocation {
            job_id: job_id.to_string(),
            department,
            week,
            points,
        });
    }

    /// Removes allocations in one cell held by jobs matching `predicate`.
    ///
    /// Returns the affected job IDs and the points freed.
    pub fn release_where<F>(
        &mut self,
        department: Department,
        week: WeekKey,
        mut predicate: F,
    ) -> (Vec<String>, f64)
    where
        F: FnMut(&str) -> bool,
    {
        let mut freed = 0.0;
        let mut jobs = Vec::new();
        self.entries.retain(|a| {
            if a.department == department && a.week == week && predicate(&a.job_id) {
                freed += a.points;
                if !jobs.contains(&a.job_id) {
                    jobs.push(a.job_id.clone());
                }
                false
            } else {
                true
            }
        });
        if freed > 0.0 {
            if let Some(total) = self.allocated.get_mut(&(department, week)) {
                *total = (*total - freed).max(0.0);
            }
        }
        (jobs, freed)
    }

    /// Allocations held by one job.
    pub fn allocations_for_job<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a Allocation> {
        self.entries.iter().filter(move |a| a.job_id == job_id)
    }

    /// Every cell that holds points, in (department, week) order.
    pub fn cells(&self) -> Vec<CellLoad> {
        self.allocated
            .iter()
            .map(|(&(department, week), &allocated)| CellLoad {
                department,
                week,
                allocated,
                capacity: self.capacity(department, week),
                base_capacity: self.base_capacity(department, week),
            })
            .collect()
    }

    /// Drops every allocation.
    pub fn reset(&mut self) {
        self.allocated.clear();
        self.entries.clear();
    }
}
